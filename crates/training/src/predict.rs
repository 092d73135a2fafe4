use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use common::{next_weekday, Error, PriceBar, Result};
use indicators::{compute, IndicatorConfig, IndicatorFrame};

use crate::baseline::{train_baseline, TrainedBaseline, TrainingConfig};
use crate::features::{latest_row, BASELINE_FEATURES};
use crate::metrics::RegressionMetrics;

/// Longest forecast horizon accepted; larger requests are clamped.
pub const MAX_DAYS_AHEAD: usize = 30;

/// Model families that can serve predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Linear,
}

impl ModelKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "linear" => Ok(ModelKind::Linear),
            other => Err(Error::UnsupportedModel(other.to_string())),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Linear => write!(f, "linear"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    symbol: Option<String>,
    #[serde(alias = "model_type")]
    model: Option<String>,
    days_ahead: Option<i64>,
}

/// A validated forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub symbol: String,
    pub model: ModelKind,
    pub days_ahead: usize,
}

impl PredictionRequest {
    /// Parse a JSON request such as
    /// `{"symbol": "aapl", "model": "linear", "days_ahead": 5}`.
    ///
    /// Missing fields default to `AAPL`, `linear` and one day; `days_ahead`
    /// is clamped to `1..=MAX_DAYS_AHEAD`.
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawRequest = serde_json::from_str(body)?;
        let symbol = raw
            .symbol
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "AAPL".to_string());
        let model = ModelKind::parse(raw.model.as_deref().unwrap_or("linear"))?;
        let days_ahead = raw.days_ahead.unwrap_or(1).clamp(1, MAX_DAYS_AHEAD as i64) as usize;

        Ok(Self {
            symbol,
            model,
            days_ahead,
        })
    }
}

/// Forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub symbol: String,
    pub model: ModelKind,
    pub predictions: Vec<f64>,
    pub prediction_dates: Vec<NaiveDate>,
    pub current_price: f64,
    pub metrics: RegressionMetrics,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Train on `bars` and roll the model forward `request.days_ahead` weekdays.
pub fn forecast(
    request: &PredictionRequest,
    bars: &[PriceBar],
    indicator_config: &IndicatorConfig,
    training_config: &TrainingConfig,
) -> Result<Prediction> {
    let frame = compute(bars, indicator_config)?;
    let trained = match request.model {
        ModelKind::Linear => train_baseline(&request.symbol, &frame, training_config)?,
    };
    roll_forward(request, &trained, bars, frame, indicator_config)
}

/// Roll an already fitted model forward `request.days_ahead` weekdays.
///
/// Each step appends a synthetic bar carrying the predicted close and the
/// last observed volume, then recomputes indicators for the next step.
pub fn forecast_with(
    request: &PredictionRequest,
    trained: &TrainedBaseline,
    bars: &[PriceBar],
    indicator_config: &IndicatorConfig,
) -> Result<Prediction> {
    if !trained.run.symbol.eq_ignore_ascii_case(&request.symbol) {
        return Err(Error::InvalidInput(format!(
            "model was trained on {}, not {}",
            trained.run.symbol, request.symbol
        )));
    }
    let frame = compute(bars, indicator_config)?;
    roll_forward(request, trained, bars, frame, indicator_config)
}

fn roll_forward(
    request: &PredictionRequest,
    trained: &TrainedBaseline,
    bars: &[PriceBar],
    mut frame: IndicatorFrame,
    indicator_config: &IndicatorConfig,
) -> Result<Prediction> {
    let current_price = bars
        .iter()
        .rev()
        .find_map(PriceBar::close_value)
        .ok_or_else(|| Error::InvalidInput("no close price to forecast from".into()))?;
    let last_volume = bars.iter().rev().find_map(|b| b.volume).unwrap_or(0);
    let mut extended = bars.to_vec();
    let mut predictions = Vec::with_capacity(request.days_ahead);
    let mut prediction_dates = Vec::with_capacity(request.days_ahead);

    for step in 0..request.days_ahead {
        let row = latest_row(&frame, &BASELINE_FEATURES)?;
        let next_close = trained.model.predict_one(&row)?;
        let last_date = extended
            .last()
            .map(|b| b.date)
            .ok_or_else(|| Error::InvalidInput("no bars to forecast from".into()))?;
        let date = next_weekday(last_date);
        debug!(step, %date, next_close, "Forecast step");

        extended.push(PriceBar::close_only(date, next_close, last_volume));
        predictions.push(next_close);
        prediction_dates.push(date);

        if step + 1 < request.days_ahead {
            frame = compute(&extended, indicator_config)?;
        }
    }

    info!(
        symbol = %request.symbol,
        model = %request.model,
        days_ahead = request.days_ahead,
        run_id = %trained.run.id,
        "Forecast complete"
    );

    Ok(Prediction {
        symbol: request.symbol.clone(),
        model: request.model,
        predictions,
        prediction_dates,
        current_price,
        metrics: trained.run.metrics,
        run_id: trained.run.id,
        timestamp: Utc::now(),
    })
}
