use serde::{Deserialize, Serialize};

/// A derived series aligned 1:1 with the input bars.
///
/// `None` marks a position where the indicator is not available, either
/// because not enough history has accumulated yet or because an input inside
/// the window was missing. It is never a stand-in for zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries(Vec<Option<f64>>);

impl IndicatorSeries {
    /// A series of `len` undefined positions.
    pub fn undefined(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at position `i`; `None` when undefined or out of range.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.0.get(i).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().copied()
    }

    /// Number of defined positions.
    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// Index of the first defined position.
    pub fn first_defined(&self) -> Option<usize> {
        self.0.iter().position(|v| v.is_some())
    }

    /// Most recent defined value.
    pub fn last_defined(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Option<f64>> {
        self.0
    }
}

impl From<Vec<Option<f64>>> for IndicatorSeries {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }
}

impl FromIterator<Option<f64>> for IndicatorSeries {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Apply `f` to every complete trailing window of `window` values.
///
/// Position `i` is defined only when `i + 1 >= window`, every value in
/// `[i + 1 - window, i]` is present, and `f` returns a finite number.
pub(crate) fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> IndicatorSeries
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);

    for i in 0..values.len() {
        if window == 0 || i + 1 < window {
            out.push(None);
            continue;
        }

        buf.clear();
        for v in &values[i + 1 - window..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }

        if buf.len() == window {
            let value = f(&buf);
            out.push(value.is_finite().then_some(value));
        } else {
            out.push(None);
        }
    }

    IndicatorSeries(out)
}

pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Deviations are taken from the first value of the window so that a window
/// of identical values yields exactly zero.
pub(crate) fn sample_std(window: &[f64]) -> f64 {
    let n = window.len();
    if n < 2 {
        return f64::NAN;
    }
    let shift = window[0];
    let (sum, sum_sq) = window.iter().fold((0.0_f64, 0.0_f64), |(s, sq), &x| {
        let d = x - shift;
        (s + d, sq + d * d)
    });
    let variance = (sum_sq - sum * sum / n as f64) / (n - 1) as f64;
    variance.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_leaves_warmup_undefined() {
        let values: Vec<Option<f64>> = (1..=5).map(|x| Some(x as f64)).collect();
        let out = rolling(&values, 3, mean);
        assert_eq!(out.as_slice(), &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn rolling_gap_poisons_only_overlapping_windows() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let out = rolling(&values, 2, mean);
        assert_eq!(
            out.as_slice(),
            &[None, Some(1.5), None, None, Some(4.5), Some(5.5)]
        );
    }

    #[test]
    fn rolling_window_zero_is_all_undefined() {
        let values = vec![Some(1.0); 4];
        assert_eq!(rolling(&values, 0, mean).defined_count(), 0);
    }

    #[test]
    fn sample_std_matches_textbook_value() {
        // Sample std of 2,4,4,4,5,5,7,9 is sqrt(32/7).
        let w = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&w) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sample_std_of_constant_window_is_exactly_zero() {
        assert_eq!(sample_std(&[0.1; 20]), 0.0);
    }

    #[test]
    fn series_accessors() {
        let s = IndicatorSeries::from(vec![None, Some(1.0), None, Some(3.0), None]);
        assert_eq!(s.len(), 5);
        assert_eq!(s.defined_count(), 2);
        assert_eq!(s.first_defined(), Some(1));
        assert_eq!(s.last_defined(), Some(3.0));
        assert_eq!(s.get(2), None);
        assert_eq!(s.get(99), None);
    }

    #[test]
    fn series_serializes_undefined_as_null() {
        let s = IndicatorSeries::from(vec![None, Some(2.5)]);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[null,2.5]");
    }
}
