pub mod collector;
pub mod mock;
pub mod pipeline;
pub mod store;

pub use collector::{CollectionReport, Collector};
pub use mock::MockSource;
pub use pipeline::{forecast_stored, train_stored, StageReport, SEQUENCE_LOOKBACK};
pub use store::{DataStore, StoredModel, StoredSeries, DEFAULT_PREFIX, MODELS_PREFIX};
