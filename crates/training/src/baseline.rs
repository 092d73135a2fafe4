use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use common::{Error, Result};
use indicators::IndicatorFrame;

use crate::features::{chronological_split, latest_row, next_day_dataset, BASELINE_FEATURES};
use crate::linear::{LinearRegression, DEFAULT_RIDGE};
use crate::metrics::RegressionMetrics;

/// Parameters of the baseline training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of usable rows used for fitting; the rest is the test split.
    pub train_ratio: f64,
    /// Minimum usable rows before a model is fitted.
    pub min_rows: usize,
    /// L2 penalty on standardized features.
    pub ridge: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            min_rows: 30,
            ridge: DEFAULT_RIDGE,
        }
    }
}

/// Summary of one baseline fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub id: Uuid,
    pub symbol: String,
    pub features: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: RegressionMetrics,
    pub latest_close: f64,
    pub next_day_prediction: f64,
    pub started_at: DateTime<Utc>,
}

/// A fitted model together with its run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedBaseline {
    pub model: LinearRegression,
    pub run: TrainingRun,
}

/// Fit the next-day close baseline on `frame`.
///
/// Uses [`BASELINE_FEATURES`], a chronological train/test split, and
/// evaluates on the held-out tail.
pub fn train_baseline(
    symbol: &str,
    frame: &IndicatorFrame,
    config: &TrainingConfig,
) -> Result<TrainedBaseline> {
    let started_at = Utc::now();
    let dataset = next_day_dataset(frame, &BASELINE_FEATURES)?;

    if dataset.len() < config.min_rows {
        return Err(Error::Training(format!(
            "{symbol}: {} usable rows, need at least {}",
            dataset.len(),
            config.min_rows
        )));
    }

    let train_len = chronological_split(dataset.len(), config.train_ratio);
    let (train, test) = dataset.split_at(train_len);
    if train.is_empty() || test.is_empty() {
        return Err(Error::Training(format!(
            "{symbol}: train ratio {} leaves an empty split",
            config.train_ratio
        )));
    }

    let model = LinearRegression::fit_ridge(&train.x, &train.y, config.ridge)?;
    let metrics = RegressionMetrics::compute(&test.y, &model.predict(&test.x)?)?;

    let latest_close = frame
        .bars()
        .last()
        .and_then(|b| b.close_value())
        .ok_or_else(|| Error::Training(format!("{symbol}: latest bar has no close")))?;
    let next_day_prediction = model.predict_one(&latest_row(frame, &BASELINE_FEATURES)?)?;

    let run = TrainingRun {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        features: BASELINE_FEATURES.iter().map(|f| f.to_string()).collect(),
        train_size: train.len(),
        test_size: test.len(),
        metrics,
        latest_close,
        next_day_prediction,
        started_at,
    };

    info!(
        run_id = %run.id,
        symbol,
        train_size = run.train_size,
        mae = metrics.mae,
        r2 = metrics.r2,
        latest_close,
        next_day_prediction,
        "Baseline trained"
    );

    Ok(TrainedBaseline { model, run })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use common::PriceBar;
    use indicators::compute_default;

    fn trending_frame(n: usize) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| {
                // Linear trend with a small deterministic wobble so RSI varies.
                let wobble = if i % 3 == 0 { -0.4 } else { 0.2 };
                PriceBar::close_only(
                    start + Days::new(i as u64),
                    100.0 + 0.5 * i as f64 + wobble,
                    1_000 + (i as u64 % 7) * 10,
                )
            })
            .collect();
        compute_default(&bars).unwrap()
    }

    #[test]
    fn trend_is_learned() {
        let frame = trending_frame(200);
        let trained = train_baseline("TEST", &frame, &TrainingConfig::default()).unwrap();
        let run = &trained.run;

        assert_eq!(run.symbol, "TEST");
        assert_eq!(run.features, vec!["MA_5", "MA_20", "RSI", "Volume_MA"]);
        assert_eq!(run.train_size + run.test_size, 199 - 19);
        assert!(run.metrics.r2 > 0.9, "r2 = {}", run.metrics.r2);
        assert!(run.metrics.mae < 2.0, "mae = {}", run.metrics.mae);
        assert!((run.next_day_prediction - run.latest_close).abs() < 5.0);
    }

    #[test]
    fn too_little_history_is_an_error() {
        let frame = trending_frame(40);
        let err = train_baseline("TEST", &frame, &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Training(msg) if msg.contains("usable rows")));
    }

    #[test]
    fn degenerate_split_is_an_error() {
        let frame = trending_frame(120);
        let cfg = TrainingConfig {
            train_ratio: 1.0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train_baseline("TEST", &frame, &cfg),
            Err(Error::Training(_))
        ));
    }
}
