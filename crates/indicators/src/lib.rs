//! Technical indicator calculator.
//!
//! Pure functions over an in-memory bar sequence: no state, no I/O. The
//! entry point is [`compute`], which returns the bars augmented with the
//! named columns `MA_<w>`, `RSI`, `BB_Middle`, `BB_Upper`, `BB_Lower` and
//! `Volume_MA`.

pub mod config;
pub mod frame;
pub mod indicators;
pub mod series;

pub use config::IndicatorConfig;
pub use frame::{
    compute, compute_default, ma_column, Column, IndicatorFrame, BB_LOWER, BB_MIDDLE, BB_UPPER,
    RSI, VOLUME_MA,
};
pub use indicators::{bollinger, rolling_std, rsi, sma, volume_ma, BollingerBands};
pub use series::IndicatorSeries;
