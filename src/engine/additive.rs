use super::{
    EngineError, EngineOptions, ForecastEngine, Frequency, PredictionTable, TREND, YHAT,
    YHAT_LOWER, YHAT_UPPER,
};
use crate::frame::{Frame, Row};
use crate::logging::*;
use crate::params::{Growth, SeasonalityMode};
use chrono::NaiveDateTime;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

type Result<T> = std::result::Result<T, EngineError>;

const SECONDS_PER_DAY: f64 = 86_400.0;
const LOGIT_EPSILON: f64 = 1e-3;
// Intercept and slope are effectively unpenalized.
const FREE: f64 = 1e-8;

#[derive(Debug, Clone, Copy)]
struct Seasonality {
    name: &'static str,
    period: f64,
    order: usize,
}

const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period: 365.25,
    order: 10,
};
const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period: 7.0,
    order: 3,
};
const DAILY: Seasonality = Seasonality {
    name: "daily",
    period: 1.0,
    order: 4,
};

#[derive(Debug, Clone)]
struct Fitted {
    t0: NaiveDateTime,
    span_secs: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    trend_coef: DVector<f64>,
    season_coef: DVector<f64>,
    sigma: f64,
    rate_scale: f64,
    history: Vec<NaiveDateTime>,
    frequency: Frequency,
}

/// Piecewise trend plus Fourier seasonality, fitted by ridge regression.
///
/// The trend (linear, saturating logistic or flat, with changepoints whose
/// rate adjustments are shrunk by `changepoint_prior_scale`) is fitted first;
/// seasonal terms are then fitted on what the trend leaves, shrunk by
/// `seasonality_prior_scale`. In multiplicative mode seasonal components are
/// relative to the trend. Intervals combine residual noise with a trend
/// uncertainty that grows past the end of history.
pub struct AdditiveModel {
    options: EngineOptions,
    seasonalities: Vec<Seasonality>,
    fitted: Option<Fitted>,
}

impl AdditiveModel {
    pub fn new(options: EngineOptions) -> Self {
        let seasonalities = [
            (options.yearly_seasonality, YEARLY),
            (options.weekly_seasonality, WEEKLY),
            (options.daily_seasonality, DAILY),
        ]
        .into_iter()
        .filter_map(|(enabled, s)| enabled.then_some(s))
        .collect();

        Self {
            options,
            seasonalities,
            fitted: None,
        }
    }

    fn is_logistic(&self) -> bool {
        matches!(self.options.growth, Growth::Logistic(_))
    }

    fn capacity(&self, row: &Row) -> Result<(f64, f64)> {
        let cap = row.cap.ok_or(EngineError::MissingCapacity)?;
        let floor = row.floor.unwrap_or(0.0);
        if cap <= floor {
            return Err(EngineError::InvalidCapacity { cap, floor });
        }
        Ok((cap, floor))
    }

    fn trend_features(&self, t: f64, changepoints: &[f64]) -> Vec<f64> {
        match self.options.growth {
            Growth::Flat => vec![1.0],
            Growth::Linear | Growth::Logistic(_) => {
                let mut x = Vec::with_capacity(2 + changepoints.len());
                x.push(1.0);
                x.push(t);
                x.extend(changepoints.iter().map(|s| (t - s).max(0.0)));
                x
            }
        }
    }

    fn trend_penalties(&self, changepoints: usize) -> Vec<f64> {
        match self.options.growth {
            Growth::Flat => vec![FREE],
            Growth::Linear | Growth::Logistic(_) => {
                let delta = self.options.changepoint_prior_scale.powi(-2);
                let mut p = vec![FREE, FREE];
                p.extend(std::iter::repeat_n(delta, changepoints));
                p
            }
        }
    }

    fn season_width(&self) -> usize {
        self.seasonalities.iter().map(|s| 2 * s.order).sum()
    }

    fn season_features(&self, ds: NaiveDateTime) -> Vec<f64> {
        let days = ds.and_utc().timestamp() as f64 / SECONDS_PER_DAY;
        let mut x = Vec::with_capacity(self.season_width());
        for s in &self.seasonalities {
            for i in 1..=s.order {
                let angle = 2.0 * PI * i as f64 * days / s.period;
                x.push(angle.sin());
                x.push(angle.cos());
            }
        }
        x
    }

    fn trend_at(&self, fitted: &Fitted, row: &Row, t: f64) -> Result<f64> {
        let x = self.trend_features(t, &fitted.changepoints);
        let z: f64 = x.iter().zip(fitted.trend_coef.iter()).map(|(a, b)| a * b).sum();
        if self.is_logistic() {
            let (cap, floor) = self.capacity(row)?;
            Ok(floor + (cap - floor) * sigmoid(z))
        } else {
            Ok(z * fitted.y_scale)
        }
    }

    /// Per-seasonality contributions at `ds`, in model units.
    fn seasonal_at(&self, fitted: &Fitted, ds: NaiveDateTime) -> Vec<f64> {
        let x = self.season_features(ds);
        let mut offset = 0;
        self.seasonalities
            .iter()
            .map(|s| {
                let width = 2 * s.order;
                let v: f64 = (offset..offset + width)
                    .map(|j| x[j] * fitted.season_coef[j])
                    .sum();
                offset += width;
                match self.options.seasonality_mode {
                    SeasonalityMode::Additive => v * fitted.y_scale,
                    SeasonalityMode::Multiplicative => v,
                }
            })
            .collect()
    }

    fn combine(&self, trend: f64, seasonal: f64) -> f64 {
        match self.options.seasonality_mode {
            SeasonalityMode::Additive => trend + seasonal,
            SeasonalityMode::Multiplicative => trend * (1.0 + seasonal),
        }
    }
}

impl ForecastEngine for AdditiveModel {
    fn fit(&mut self, history: &Frame) -> Result<()> {
        let log = DEFAULT.new(o!(
            "function" => "AdditiveModel::fit",
            "rows" => history.len(),
            "growth" => self.options.growth.name(),
        ));

        let mut observed: Vec<(Row, f64)> = history
            .rows()
            .iter()
            .filter_map(|r| r.y.filter(|y| y.is_finite()).map(|y| (*r, y)))
            .collect();
        if observed.len() < 2 {
            return Err(EngineError::InsufficientData);
        }
        observed.sort_by_key(|(r, _)| r.ds);

        let n = observed.len();
        let t0 = observed[0].0.ds;
        let span_secs = seconds(observed[n - 1].0.ds - t0);
        if span_secs <= 0.0 {
            return Err(EngineError::ZeroSpan);
        }
        let t: Vec<f64> = observed
            .iter()
            .map(|(r, _)| seconds(r.ds - t0) / span_secs)
            .collect();

        let bounds = if self.is_logistic() {
            observed
                .iter()
                .map(|(r, _)| self.capacity(r))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![(f64::INFINITY, 0.0); n]
        };

        let y_scale = observed
            .iter()
            .zip(&bounds)
            .map(|((_, y), (_, floor))| (y - floor).abs())
            .fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let changepoints = select_changepoints(
            &t,
            self.options.n_changepoints,
            self.options.changepoint_range,
        );

        let trend_target: Vec<f64> = observed
            .iter()
            .zip(&bounds)
            .map(|((_, y), (cap, floor))| {
                if self.is_logistic() {
                    let p = ((y - floor) / (cap - floor))
                        .clamp(LOGIT_EPSILON, 1.0 - LOGIT_EPSILON);
                    (p / (1.0 - p)).ln()
                } else {
                    y / y_scale
                }
            })
            .collect();
        let trend_x: Vec<Vec<f64>> = t
            .iter()
            .map(|ti| self.trend_features(*ti, &changepoints))
            .collect();
        let trend_coef = ridge(
            &trend_x,
            &trend_target,
            &self.trend_penalties(changepoints.len()),
        )?;

        let rate_scale = if changepoints.is_empty() || trend_coef.len() <= 2 {
            0.0
        } else {
            trend_coef.iter().skip(2).map(|d| d.abs()).sum::<f64>() / changepoints.len() as f64
        };

        let mut fitted = Fitted {
            t0,
            span_secs,
            y_scale,
            changepoints,
            trend_coef,
            season_coef: DVector::zeros(self.season_width()),
            sigma: 0.0,
            rate_scale,
            history: observed.iter().map(|(r, _)| r.ds).collect(),
            frequency: Frequency::default(),
        };

        let trend = observed
            .iter()
            .zip(&t)
            .map(|((r, _), ti)| self.trend_at(&fitted, r, *ti))
            .collect::<Result<Vec<_>>>()?;

        if !self.seasonalities.is_empty() {
            let season_x: Vec<Vec<f64>> = observed
                .iter()
                .map(|(r, _)| self.season_features(r.ds))
                .collect();
            let residual: Vec<f64> = observed
                .iter()
                .zip(&trend)
                .map(|((_, y), tr)| match self.options.seasonality_mode {
                    SeasonalityMode::Additive => (y - tr) / y_scale,
                    SeasonalityMode::Multiplicative if tr.abs() > f64::EPSILON => y / tr - 1.0,
                    SeasonalityMode::Multiplicative => 0.0,
                })
                .collect();
            let penalty = self.options.seasonality_prior_scale.powi(-2);
            fitted.season_coef = ridge(&season_x, &residual, &vec![penalty; self.season_width()])?;
        }

        let sse: f64 = observed
            .iter()
            .zip(&trend)
            .map(|((r, y), tr)| {
                let seasonal: f64 = self.seasonal_at(&fitted, r.ds).iter().sum();
                (y - self.combine(*tr, seasonal)).powi(2)
            })
            .sum();
        let sigma = (sse / n as f64).sqrt();
        if !sigma.is_finite() {
            return Err(EngineError::Fit("residuals are not finite".into()));
        }
        fitted.sigma = sigma;
        fitted.frequency = Frequency::infer(&fitted.history);

        debug!(log, "fitted";
            "changepoints" => fitted.changepoints.len(),
            "seasonalities" => self.seasonalities.len(),
            "sigma" => fitted.sigma,
            "frequency" => ?fitted.frequency,
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn make_future_frame(&self, periods: usize) -> Result<Frame> {
        let fitted = self.fitted.as_ref().ok_or(EngineError::NotFitted)?;
        let last = *fitted.history.last().ok_or(EngineError::NotFitted)?;

        let mut frame = Frame::new(fitted.history.iter().map(|ds| Row::new(*ds)).collect());
        for k in 1..=periods {
            let ds = u32::try_from(k)
                .ok()
                .and_then(|k| fitted.frequency.nth_after(last, k))
                .ok_or_else(|| {
                    EngineError::FutureDates(format!("step {k} after {last} overflows"))
                })?;
            frame.push(Row::new(ds));
        }
        Ok(frame)
    }

    fn predict(&self, frame: &Frame) -> Result<PredictionTable> {
        let fitted = self.fitted.as_ref().ok_or(EngineError::NotFitted)?;
        let z = z_score(self.options.interval_width);

        let n = frame.len();
        let mut trend = Vec::with_capacity(n);
        let mut components = vec![Vec::with_capacity(n); self.seasonalities.len()];
        let mut yhat = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);
        let mut upper = Vec::with_capacity(n);

        for row in frame.rows() {
            let t = seconds(row.ds - fitted.t0) / fitted.span_secs;
            let tr = self.trend_at(fitted, row, t)?;
            let seasonal = self.seasonal_at(fitted, row.ds);
            for (column, value) in components.iter_mut().zip(&seasonal) {
                column.push(*value);
            }
            let y = self.combine(tr, seasonal.iter().sum());

            // trend uncertainty only accrues beyond the fitted history
            let drift = fitted.rate_scale * fitted.y_scale * (t - 1.0).max(0.0);
            let margin = z * (fitted.sigma.powi(2) + drift.powi(2)).sqrt();

            trend.push(tr);
            yhat.push(y);
            lower.push(y - margin);
            upper.push(y + margin);
        }

        let mut table = PredictionTable::new(frame.timestamps().collect());
        table.insert(TREND, trend);
        for (s, values) in self.seasonalities.iter().zip(components) {
            table.insert(s.name, values);
        }
        table.insert(YHAT, yhat);
        table.insert(YHAT_LOWER, lower);
        table.insert(YHAT_UPPER, upper);
        Ok(table)
    }
}

fn seconds(delta: chrono::TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn z_score(interval_width: f64) -> f64 {
    match (interval_width * 100.0).round() as i32 {
        50 => 0.674,
        80 => 1.2816,
        90 => 1.6449,
        95 => 1.96,
        99 => 2.5758,
        _ => 1.2816,
    }
}

/// Changepoint locations, evenly spread over the first `range` of the history.
pub(super) fn select_changepoints(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let count = n_changepoints.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let idx = (last * i as f64 / count as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect()
}

fn ridge(x: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<DVector<f64>> {
    let n = x.len();
    let p = penalties.len();
    let design = DMatrix::from_fn(n, p, |i, j| x[i][j]);
    let target = DVector::from_column_slice(y);

    let xt = design.transpose();
    let mut gram = &xt * &design;
    for (i, penalty) in penalties.iter().enumerate() {
        gram[(i, i)] += penalty;
    }
    let rhs = &xt * &target;

    let coef = match gram.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => gram
            .lu()
            .solve(&rhs)
            .ok_or_else(|| EngineError::Fit("design matrix is singular".into()))?,
    };
    if coef.iter().all(|c| c.is_finite()) {
        Ok(coef)
    } else {
        Err(EngineError::Fit("coefficients are not finite".into()))
    }
}
