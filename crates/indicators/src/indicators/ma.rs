use crate::series::{mean, rolling, IndicatorSeries};

/// Simple moving average over a trailing window of `window` values.
///
/// Position `i` is undefined while `i < window - 1` and whenever a value in
/// the window is missing.
pub fn sma(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    rolling(values, window, mean)
}
