use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Sampling cadence of a history, used to extend it into the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Fixed(TimeDelta),
    /// Calendar months; `month_end` pins every step to the last day of its month.
    Monthly { months: u32, month_end: bool },
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Fixed(TimeDelta::days(1))
    }
}

impl Frequency {
    /// Infers the cadence of ascending timestamps.
    ///
    /// Calendar-monthly spacing (same day of month, or always the month end)
    /// wins over fixed spacing; otherwise the most common gap is used, the
    /// smaller one on ties. Fewer than two distinct timestamps means daily.
    pub fn infer(ds: &[NaiveDateTime]) -> Frequency {
        let pairs: Vec<_> = ds
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|(a, b)| b > a)
            .collect();
        if pairs.is_empty() {
            return Frequency::default();
        }
        if let Some(monthly) = monthly(&pairs) {
            return monthly;
        }

        let mut counts: HashMap<TimeDelta, usize> = HashMap::new();
        for (a, b) in &pairs {
            *counts.entry(*b - *a).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(step, _)| *step > TimeDelta::zero())
            .max_by_key(|(step, count)| (*count, Reverse(*step)))
            .map(|(step, _)| Frequency::Fixed(step))
            .unwrap_or_default()
    }

    /// The timestamp `n` steps after `origin`.
    pub fn nth_after(&self, origin: NaiveDateTime, n: u32) -> Option<NaiveDateTime> {
        match *self {
            Frequency::Fixed(step) => {
                let total = step.checked_mul(i32::try_from(n).ok()?)?;
                origin.checked_add_signed(total)
            }
            Frequency::Monthly {
                months,
                month_end: false,
            } => origin.checked_add_months(Months::new(months.checked_mul(n)?)),
            Frequency::Monthly {
                months,
                month_end: true,
            } => {
                let first = origin.date().with_day(1)?;
                let target = first.checked_add_months(Months::new(months.checked_mul(n)?))?;
                let last = target.checked_add_months(Months::new(1))?.pred_opt()?;
                Some(last.and_time(origin.time()))
            }
        }
    }
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_none_or(|next| next.month() != date.month())
}

fn month_index(dt: &NaiveDateTime) -> i64 {
    i64::from(dt.year()) * 12 + i64::from(dt.month0())
}

fn monthly(pairs: &[(NaiveDateTime, NaiveDateTime)]) -> Option<Frequency> {
    let mut step = None;
    let mut month_end = true;
    for (a, b) in pairs {
        if a.time() != b.time() {
            return None;
        }
        let months = month_index(b) - month_index(a);
        if months <= 0 {
            return None;
        }
        let both_end = is_month_end(a.date()) && is_month_end(b.date());
        if a.day() != b.day() && !both_end {
            return None;
        }
        month_end &= both_end;
        match step {
            None => step = Some(months),
            Some(s) if s != months => return None,
            Some(_) => {}
        }
    }
    let months = u32::try_from(step?).ok()?;
    Some(Frequency::Monthly { months, month_end })
}
