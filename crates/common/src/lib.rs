pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::{Config, MAX_HISTORY_DAYS};
pub use error::{Error, Result};
pub use source::BarSource;
pub use types::*;
