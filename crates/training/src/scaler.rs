use common::{Error, Result};

/// Per-column min-max scaling to [0, 1].
///
/// A column with zero range is scaled with a range of 1, so its transformed
/// values are all zero instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::Training("cannot fit a scaler on zero rows".into()))?;

        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];
        for row in rows {
            if row.len() != width {
                return Err(Error::Training(format!(
                    "ragged rows: expected width {width}, got {}",
                    row.len()
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }

        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| if hi > lo { hi - lo } else { 1.0 })
            .collect();

        Ok(Self { min, range })
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| (v - self.min[j]) / self.range[j])
                    .collect()
            })
            .collect()
    }

    /// Map scaled values of column `col` back to original units.
    pub fn inverse_transform_column(&self, values: &[f64], col: usize) -> Vec<f64> {
        values
            .iter()
            .map(|&v| v * self.range[col] + self.min[col])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_each_column_to_unit_interval() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0], vec![2.0, 20.0]];
        let scaler = MinMaxScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows);
        assert_eq!(scaled[0], vec![0.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 1.0]);
        assert_eq!(scaled[2], vec![0.5, 0.5]);
    }

    #[test]
    fn inverse_restores_original_units() {
        let rows = vec![vec![100.0], vec![150.0], vec![120.0]];
        let scaler = MinMaxScaler::fit(&rows).unwrap();
        let back = scaler.inverse_transform_column(&[0.0, 1.0, 0.4], 0);
        assert_eq!(back, vec![100.0, 150.0, 120.0]);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let rows = vec![vec![5.0], vec![5.0]];
        let scaler = MinMaxScaler::fit(&rows).unwrap();
        assert_eq!(scaler.transform(&rows), vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn empty_or_ragged_input_is_rejected() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }
}
