// =============================================================================
// Bollinger Bands
// =============================================================================
//
// middle = SMA(close, period)
// upper  = middle + k * σ
// lower  = middle - k * σ
//
// σ is the rolling sample standard deviation (n - 1 denominator) of close
// over the same window.

use crate::series::{rolling, sample_std, IndicatorSeries};

use super::ma::sma;

/// The three band series, each aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: IndicatorSeries,
    pub upper: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Rolling sample standard deviation over `window` values.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    if window < 2 {
        return IndicatorSeries::undefined(values.len());
    }
    rolling(values, window, sample_std)
}

/// Calculate Bollinger Bands with `num_std` standard deviations.
///
/// `upper >= middle >= lower` holds at every defined position for a
/// non-negative `num_std`; the three coincide when the window is flat.
pub fn bollinger(closes: &[Option<f64>], period: usize, num_std: f64) -> BollingerBands {
    let middle = sma(closes, period);
    let std = rolling_std(closes, period);

    let band = |sign: f64| -> IndicatorSeries {
        middle
            .iter()
            .zip(std.iter())
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(m + sign * num_std * s).filter(|v| v.is_finite()),
                _ => None,
            })
            .collect()
    };

    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(xs: impl IntoIterator<Item = f64>) -> Vec<Option<f64>> {
        xs.into_iter().map(Some).collect()
    }

    #[test]
    fn bollinger_basic() {
        let closes = some((1..=20).map(|x| x as f64));
        let bb = bollinger(&closes, 20, 2.0);
        let (u, m, l) = (
            bb.upper.get(19).unwrap(),
            bb.middle.get(19).unwrap(),
            bb.lower.get(19).unwrap(),
        );
        assert!((m - 10.5).abs() < 1e-12);
        assert!(u > m && m > l);
        // Sample std of 1..=20 is sqrt(35).
        assert!((u - m - 2.0 * 35.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = bollinger(&some([1.0, 2.0, 3.0]), 20, 2.0);
        assert_eq!(bb.middle.defined_count(), 0);
        assert_eq!(bb.upper.defined_count(), 0);
        assert_eq!(bb.lower.len(), 3);
    }

    #[test]
    fn bollinger_flat_bands_coincide() {
        let bb = bollinger(&vec![Some(100.0); 25], 20, 2.0);
        assert_eq!(bb.middle.defined_count(), 6);
        for i in 19..25 {
            assert_eq!(bb.upper.get(i), bb.middle.get(i));
            assert_eq!(bb.lower.get(i), bb.middle.get(i));
        }
    }

    #[test]
    fn rolling_std_needs_two_values() {
        assert_eq!(rolling_std(&some([1.0, 2.0]), 1).defined_count(), 0);
    }
}
