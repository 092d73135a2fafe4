// =============================================================================
// Relative Strength Index (RSI), simple rolling averages
// =============================================================================
//
// Step 1: deltas d[j] = close[j] - close[j-1]; d[0] is undefined.
// Step 2: over the trailing `period` deltas ending at i,
//           avg_gain = sum(max(d, 0)) / period
//           avg_loss = sum(max(-d, 0)) / period
// Step 3: RS  = avg_gain / avg_loss
//         RSI = 100 - 100 / (1 + RS)
//
// A zero average loss yields RSI = 100, including the flat-market case.
// =============================================================================

use crate::series::{rolling, IndicatorSeries};

/// Compute the RSI series for `closes` over `period` deltas.
///
/// The result is aligned with `closes`: positions `0..period` are undefined,
/// as is any position whose delta window touches a missing close.
pub fn rsi(closes: &[Option<f64>], period: usize) -> IndicatorSeries {
    let deltas: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        }))
        .take(closes.len())
        .collect();

    rolling(&deltas, period, |window| {
        let (sum_gain, sum_loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
        let n = window.len() as f64;
        rsi_from_averages(sum_gain / n, sum_loss / n)
    })
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// An average loss of zero means no down move was observed and maps to 100.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
