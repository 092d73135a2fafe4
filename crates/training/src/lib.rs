//! Feature preparation, a linear next-day baseline, and forecasting on top of
//! the indicator calculator.

pub mod baseline;
pub mod features;
pub mod linear;
pub mod metrics;
pub mod predict;
pub mod scaler;

pub use baseline::{train_baseline, TrainedBaseline, TrainingConfig, TrainingRun};
pub use features::{
    chronological_split, latest_row, next_day_dataset, sequence_dataset, sequence_windows, Dataset,
    FeatureMatrix, SequenceDataset, BASELINE_FEATURES, SEQUENCE_FEATURES,
};
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
pub use predict::{
    forecast, forecast_with, ModelKind, Prediction, PredictionRequest, MAX_DAYS_AHEAD,
};
pub use scaler::MinMaxScaler;
