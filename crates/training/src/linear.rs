use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Ridge penalty applied on standardized features by [`LinearRegression::fit`].
///
/// Small enough to leave well-posed fits unchanged, large enough to keep the
/// system solvable when features are collinear (MA_5 and MA_20 on a trend).
pub const DEFAULT_RIDGE: f64 = 1e-8;

/// Least-squares linear model with an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        Self::fit_ridge(x, y, DEFAULT_RIDGE)
    }

    /// Fit on standardized features with an L2 penalty of `alpha`.
    ///
    /// Zero-variance features get a zero coefficient.
    pub fn fit_ridge(x: &[Vec<f64>], y: &[f64], alpha: f64) -> Result<Self> {
        let n = x.len();
        if n == 0 {
            return Err(Error::Training("cannot fit on zero rows".into()));
        }
        if y.len() != n {
            return Err(Error::Training(format!(
                "length mismatch: {n} rows, {} targets",
                y.len()
            )));
        }
        let p = x[0].len();
        if x.iter().any(|row| row.len() != p) {
            return Err(Error::Training("ragged feature rows".into()));
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(Error::Training("non-finite value in training data".into()));
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(Error::Training(format!("invalid ridge penalty {alpha}")));
        }

        let nf = n as f64;
        let mean_y = y.iter().sum::<f64>() / nf;
        let mut mean_x = vec![0.0; p];
        let mut std_x = vec![0.0; p];
        for j in 0..p {
            mean_x[j] = x.iter().map(|r| r[j]).sum::<f64>() / nf;
            let var = x.iter().map(|r| (r[j] - mean_x[j]).powi(2)).sum::<f64>() / nf;
            std_x[j] = var.sqrt();
        }

        let active: Vec<usize> = (0..p).filter(|&j| std_x[j] > 0.0).collect();
        let k = active.len();

        // Normal equations on standardized features: (ZᵀZ/n + αI) β = Zᵀy/n
        let mut a = vec![vec![0.0; k]; k];
        let mut b = vec![0.0; k];
        for (row, &target) in x.iter().zip(y) {
            let z: Vec<f64> = active
                .iter()
                .map(|&j| (row[j] - mean_x[j]) / std_x[j])
                .collect();
            let yc = target - mean_y;
            for r in 0..k {
                b[r] += z[r] * yc / nf;
                for c in 0..k {
                    a[r][c] += z[r] * z[c] / nf;
                }
            }
        }
        for (r, row) in a.iter_mut().enumerate() {
            row[r] += alpha;
        }

        let beta = solve(a, b)?;

        let mut coefficients = vec![0.0; p];
        for (slot, &j) in active.iter().enumerate() {
            coefficients[j] = beta[slot] / std_x[j];
        }
        let intercept = mean_y
            - coefficients
                .iter()
                .zip(&mean_x)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(Error::Training(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>())
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(Error::Training("singular normal equations".into()));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut out = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row][c] * out[c]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relation() {
        // y = 3 + 2a - 0.5b
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();
        let model = LinearRegression::fit_ridge(&x, &y, 0.0).unwrap();
        assert!((model.intercept - 3.0).abs() < 1e-9);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-9);
    }

    #[test]
    fn collinear_features_still_predict() {
        // Second feature is an exact shift of the first.
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, i as f64 - 4.0]).collect();
        let y: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let model = LinearRegression::fit(&x, &y).unwrap();
        let pred = model.predict_one(&[40.0, 36.0]).unwrap();
        assert!((pred - 50.0).abs() < 1e-3, "got {pred}");
    }

    #[test]
    fn constant_feature_gets_zero_weight() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 7.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| 2.0 * i as f64).collect();
        let model = LinearRegression::fit(&x, &y).unwrap();
        assert_eq!(model.coefficients[1], 0.0);
        assert!((model.predict_one(&[5.0, 7.0]).unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn singular_without_ridge_is_reported() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(matches!(
            LinearRegression::fit_ridge(&x, &y, 0.0),
            Err(Error::Training(_))
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(LinearRegression::fit(&[], &[]).is_err());
        assert!(LinearRegression::fit(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(LinearRegression::fit(&[vec![f64::NAN]], &[1.0]).is_err());
        let model = LinearRegression::fit(&[vec![1.0], vec![2.0]], &[1.0, 2.0]).unwrap();
        assert!(model.predict_one(&[1.0, 2.0]).is_err());
    }
}
