#[cfg(test)]
mod tests;

use crate::errors::Error;
use crate::params::Capacity;
use crate::types::TimeSeriesData;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

type Result<T> = std::result::Result<T, Error>;

/// One observation (or one row to be predicted when `y` is `None`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    pub ds: NaiveDateTime,
    pub y: Option<f64>,
    pub cap: Option<f64>,
    pub floor: Option<f64>,
}

impl Row {
    pub fn new(ds: NaiveDateTime) -> Self {
        Self {
            ds,
            y: None,
            cap: None,
            floor: None,
        }
    }

    pub fn observed(ds: NaiveDateTime, y: f64) -> Self {
        Self { y: Some(y), ..Self::new(ds) }
    }
}

/// Tabular form handed to the engine. Row order is whatever the caller gave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    rows: Vec<Row>,
}

impl Frame {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows.iter().map(|r| r.ds)
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Sets the same cap/floor on every row.
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        for row in &mut self.rows {
            row.cap = Some(capacity.cap);
            row.floor = Some(capacity.floor);
        }
        self
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

pub fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    Err(Error::input(format!(
        "Unknown datetime string format, unable to parse: {s:?}"
    )))
}

pub fn to_frame(data: &TimeSeriesData) -> Result<Frame> {
    if data.dates.len() != data.values.len() {
        return Err(Error::input(format!(
            "All arrays must be of the same length: {} dates and {} values",
            data.dates.len(),
            data.values.len()
        )));
    }
    if data.dates.is_empty() {
        return Err(Error::input("time series must contain at least one observation"));
    }

    let rows = data
        .dates
        .iter()
        .zip(&data.values)
        .map(|(date, &value)| Ok(Row::observed(parse_date(date)?, value)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Frame::new(rows))
}

/// The last `horizon` entries of a predicted column.
pub fn trailing<T>(values: &[T], horizon: usize) -> Result<&[T]> {
    if values.len() < horizon {
        return Err(Error::Engine(format!(
            "prediction has {} rows, fewer than the {} requested periods",
            values.len(),
            horizon
        )));
    }
    Ok(&values[values.len() - horizon..])
}

pub fn format_dates(dates: &[NaiveDateTime]) -> Vec<String> {
    let with_time = dates.iter().any(|d| d.time() != NaiveTime::MIN);
    let with_fraction = dates.iter().any(|d| d.nanosecond() != 0);
    let format = match (with_time, with_fraction) {
        (_, true) => "%Y-%m-%d %H:%M:%S%.f",
        (true, false) => "%Y-%m-%d %H:%M:%S",
        (false, false) => "%Y-%m-%d",
    };
    dates.iter().map(|d| d.format(format).to_string()).collect()
}
