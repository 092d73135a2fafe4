//! Series-level indicator functions.
//!
//! Each function maps an input column (one `Option<f64>` per bar) to an
//! `IndicatorSeries` of the same length.

pub mod bollinger;
pub mod ma;
pub mod rsi;
pub mod volume;

pub use bollinger::{bollinger, rolling_std, BollingerBands};
pub use ma::sma;
pub use rsi::{rsi, rsi_from_averages};
pub use volume::volume_ma;
