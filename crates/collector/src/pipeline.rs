use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use common::Result;
use indicators::IndicatorConfig;
use training::{
    forecast, forecast_with, sequence_dataset, train_baseline, ModelKind, Prediction,
    PredictionRequest, TrainingConfig,
};

use crate::store::{DataStore, StoredModel, StoredSeries};

/// Lookback of the sequence dataset prepared per symbol.
pub const SEQUENCE_LOOKBACK: usize = 30;

/// Per-symbol outcome of one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport<T> {
    pub done: BTreeMap<String, T>,
    /// Symbol → reason it was skipped.
    pub skipped: BTreeMap<String, String>,
}

impl<T> Default for StageReport<T> {
    fn default() -> Self {
        Self {
            done: BTreeMap::new(),
            skipped: BTreeMap::new(),
        }
    }
}

impl<T> StageReport<T> {
    fn record(&mut self, symbol: &str, outcome: Result<T>, stage: &str) {
        match outcome {
            Ok(value) => {
                self.done.insert(symbol.to_string(), value);
            }
            Err(e) => {
                warn!(symbol, stage, error = %e, "Symbol skipped");
                self.skipped.insert(symbol.to_string(), e.to_string());
            }
        }
    }
}

/// Fit and store a linear baseline on the latest series of each symbol.
///
/// A symbol whose series cannot be read or trained on is skipped.
pub async fn train_stored(
    store: &DataStore,
    symbols: &[String],
    config: &TrainingConfig,
) -> StageReport<PathBuf> {
    let mut report = StageReport::default();
    for symbol in symbols {
        let outcome = train_one(store, symbol, config).await;
        report.record(symbol, outcome, "train");
    }
    info!(
        trained = report.done.len(),
        skipped = report.skipped.len(),
        "Training finished"
    );
    report
}

async fn train_one(store: &DataStore, symbol: &str, config: &TrainingConfig) -> Result<PathBuf> {
    let series = store.load_latest(symbol).await?;
    log_sequence_shape(&series);
    let baseline = train_baseline(symbol, &series.frame, config)?;
    store
        .save_model(&StoredModel::new(ModelKind::Linear, baseline))
        .await
}

fn log_sequence_shape(series: &StoredSeries) {
    match sequence_dataset(&series.frame, SEQUENCE_LOOKBACK) {
        Ok(sequences) => info!(
            symbol = %series.symbol,
            windows = sequences.x.len(),
            lookback = SEQUENCE_LOOKBACK,
            "Sequence dataset prepared"
        ),
        Err(e) => warn!(symbol = %series.symbol, error = %e, "No sequence dataset"),
    }
}

/// Forecast `days_ahead` weekdays for each symbol from its latest series.
///
/// Uses the newest stored model when there is one and trains in place
/// otherwise. A symbol whose series cannot be read or forecast is skipped.
pub async fn forecast_stored(
    store: &DataStore,
    symbols: &[String],
    days_ahead: usize,
    indicators: &IndicatorConfig,
    training: &TrainingConfig,
) -> StageReport<Prediction> {
    let mut report = StageReport::default();
    for symbol in symbols {
        let request = PredictionRequest {
            symbol: symbol.to_uppercase(),
            model: ModelKind::Linear,
            days_ahead,
        };
        let outcome = forecast_one(store, &request, indicators, training).await;
        report.record(symbol, outcome, "forecast");
    }
    report
}

async fn forecast_one(
    store: &DataStore,
    request: &PredictionRequest,
    indicators: &IndicatorConfig,
    training: &TrainingConfig,
) -> Result<Prediction> {
    let series = store.load_latest(&request.symbol).await?;
    let bars = series.frame.bars();
    match store.load_latest_model(request.model, &request.symbol).await {
        Ok(stored) => forecast_with(request, &stored.into_trained(), bars, indicators),
        Err(e) => {
            warn!(symbol = %request.symbol, error = %e, "No stored model, training in place");
            forecast(request, bars, indicators, training)
        }
    }
}
