use crate::series::IndicatorSeries;

use super::ma::sma;

/// Trailing mean of traded volume.
pub fn volume_ma(volumes: &[Option<f64>], window: usize) -> IndicatorSeries {
    sma(volumes, window)
}
