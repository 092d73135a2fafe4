use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Regression error metrics on a held-out split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        if y_true.is_empty() {
            return Err(Error::Training("no samples to evaluate".into()));
        }
        if y_true.len() != y_pred.len() {
            return Err(Error::Training(format!(
                "length mismatch: {} targets, {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let n = y_true.len() as f64;
        let mean = y_true.iter().sum::<f64>() / n;
        let (abs_sum, ss_res, ss_tot) = y_true.iter().zip(y_pred).fold(
            (0.0_f64, 0.0_f64, 0.0_f64),
            |(a, r, t), (&yt, &yp)| {
                let e = yt - yp;
                (a + e.abs(), r + e * e, t + (yt - mean) * (yt - mean))
            },
        );

        let mse = ss_res / n;
        // A constant target scores 1 when predicted exactly, 0 otherwise.
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(Self {
            mae: abs_sum / n,
            mse,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction() {
        let y = [1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn known_errors() {
        let m = RegressionMetrics::compute(&[1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 3.0, 2.0]).unwrap();
        assert!((m.mae - 0.75).abs() < 1e-12);
        assert!((m.mse - 1.25).abs() < 1e-12);
        assert!((m.rmse - 1.25_f64.sqrt()).abs() < 1e-12);
        // ss_tot = 5, ss_res = 5
        assert!(m.r2.abs() < 1e-12);
    }

    #[test]
    fn mean_prediction_scores_zero_and_worse_is_negative() {
        let y = [1.0, 3.0];
        assert_eq!(RegressionMetrics::compute(&y, &[2.0, 2.0]).unwrap().r2, 0.0);
        assert!(RegressionMetrics::compute(&y, &[3.0, 1.0]).unwrap().r2 < 0.0);
    }

    #[test]
    fn constant_target() {
        assert_eq!(RegressionMetrics::compute(&[2.0, 2.0], &[2.0, 2.0]).unwrap().r2, 1.0);
        assert_eq!(RegressionMetrics::compute(&[2.0, 2.0], &[1.0, 2.0]).unwrap().r2, 0.0);
    }

    #[test]
    fn invalid_input() {
        assert!(RegressionMetrics::compute(&[], &[]).is_err());
        assert!(RegressionMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
    }
}
