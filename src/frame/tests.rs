use super::*;
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn series(dates: &[&str], values: &[f64]) -> TimeSeriesData {
    TimeSeriesData {
        dates: dates.iter().map(|s| s.to_string()).collect(),
        values: values.to_vec(),
    }
}

#[test]
fn test_parse_date_forms() {
    assert_eq!(parse_date("2023-01-05").unwrap(), date(2023, 1, 5));
    assert_eq!(parse_date("2023/01/05").unwrap(), date(2023, 1, 5));
    assert_eq!(
        parse_date("2023-01-05T10:30:00").unwrap(),
        date(2023, 1, 5) + chrono::TimeDelta::minutes(630)
    );
    assert_eq!(
        parse_date("2023-01-05 10:30").unwrap(),
        date(2023, 1, 5) + chrono::TimeDelta::minutes(630)
    );
    assert_eq!(
        parse_date("2023-01-05T10:30:00+01:00").unwrap(),
        date(2023, 1, 5) + chrono::TimeDelta::minutes(570)
    );
    assert_eq!(parse_date(" 2023-01-05 ").unwrap(), date(2023, 1, 5));
}

#[test]
fn test_parse_date_rejects_garbage() {
    for bad in ["", "yesterday", "2023-13-01", "2023-02-30", "05/01/2023"] {
        let err = parse_date(bad).unwrap_err();
        assert!(matches!(err, Error::Input(_)), "{bad}: {err:?}");
    }
}

#[test]
fn test_to_frame_preserves_order() {
    let data = series(&["2023-01-03", "2023-01-01", "2023-01-02"], &[3.0, 1.0, 2.0]);
    let frame = to_frame(&data).unwrap();

    assert_eq!(frame.len(), 3);
    let ds: Vec<_> = frame.timestamps().collect();
    assert_eq!(ds, vec![date(2023, 1, 3), date(2023, 1, 1), date(2023, 1, 2)]);
    let ys: Vec<_> = frame.rows().iter().map(|r| r.y).collect();
    assert_eq!(ys, vec![Some(3.0), Some(1.0), Some(2.0)]);
    assert!(frame.rows().iter().all(|r| r.cap.is_none() && r.floor.is_none()));
}

#[test]
fn test_to_frame_length_mismatch() {
    let err = to_frame(&series(&["2023-01-01", "2023-01-02"], &[1.0])).unwrap_err();
    assert!(matches!(err, Error::Input(_)));
    assert!(err.to_string().contains("same length"));
}

#[test]
fn test_to_frame_empty() {
    let err = to_frame(&series(&[], &[])).unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[test]
fn test_to_frame_bad_date_names_value() {
    let err = to_frame(&series(&["2023-01-01", "bogus"], &[1.0, 2.0])).unwrap_err();
    assert!(matches!(err, Error::Input(_)));
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn test_with_capacity_fills_every_row() {
    let data = series(&["2023-01-01", "2023-01-02"], &[1.0, 2.0]);
    let mut frame = to_frame(&data).unwrap();
    frame.push(Row::new(date(2023, 1, 3)));
    let frame = frame.with_capacity(Capacity {
        cap: 10.0,
        floor: 0.5,
    });

    assert_eq!(frame.len(), 3);
    for row in frame.rows() {
        assert_eq!(row.cap, Some(10.0));
        assert_eq!(row.floor, Some(0.5));
    }
    assert_eq!(frame.rows()[2].y, None);
}

#[test]
fn test_trailing() {
    let values = [1, 2, 3, 4, 5];
    assert_eq!(trailing(&values, 2).unwrap(), &[4, 5]);
    assert_eq!(trailing(&values, 5).unwrap(), &values);
    assert!(trailing(&values, 0).unwrap().is_empty());

    let err = trailing(&values, 6).unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
}

#[test]
fn test_format_dates() {
    let days = vec![date(2023, 1, 4), date(2023, 1, 5)];
    assert_eq!(format_dates(&days), vec!["2023-01-04", "2023-01-05"]);

    let hours = vec![
        date(2023, 1, 4),
        date(2023, 1, 4) + chrono::TimeDelta::hours(1),
    ];
    assert_eq!(
        format_dates(&hours),
        vec!["2023-01-04 00:00:00", "2023-01-04 01:00:00"]
    );
}

#[test]
fn test_format_dates_keeps_fractional_seconds() {
    let base = date(2023, 1, 1) + chrono::TimeDelta::seconds(1);
    let dates = vec![
        base + chrono::TimeDelta::microseconds(100),
        base + chrono::TimeDelta::microseconds(200),
    ];
    assert_eq!(
        format_dates(&dates),
        vec!["2023-01-01 00:00:01.000100", "2023-01-01 00:00:01.000200"]
    );
}
