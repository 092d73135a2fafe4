use common::{BarField, Error, Result};
use indicators::{IndicatorFrame, IndicatorSeries};

use crate::scaler::MinMaxScaler;

/// Features of the next-day close baseline.
pub const BASELINE_FEATURES: [&str; 4] = ["MA_5", "MA_20", "RSI", "Volume_MA"];

/// Features of the sequence (lookback window) dataset. `Close` comes first so
/// it can serve as the target column.
pub const SEQUENCE_FEATURES: [&str; 7] =
    ["Close", "Volume", "MA_5", "MA_20", "RSI", "BB_Upper", "BB_Lower"];

enum Source<'a> {
    Bar(BarField),
    Column(&'a IndicatorSeries),
}

fn resolve<'a>(frame: &'a IndicatorFrame, names: &[&str]) -> Result<Vec<Source<'a>>> {
    names
        .iter()
        .map(|&name| match BarField::from_column(name) {
            Some(field) => Ok(Source::Bar(field)),
            None => frame
                .column(name)
                .map(Source::Column)
                .ok_or_else(|| Error::UnknownColumn(name.to_string())),
        })
        .collect()
}

fn row_at(frame: &IndicatorFrame, sources: &[Source<'_>], i: usize) -> Option<Vec<f64>> {
    sources
        .iter()
        .map(|s| match s {
            Source::Bar(field) => field.read(&frame.bars()[i]),
            Source::Column(series) => series.get(i),
        })
        .collect()
}

/// Selected feature columns with incomplete rows dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    /// Bar index each row was taken from.
    pub index: Vec<usize>,
}

impl FeatureMatrix {
    pub fn from_frame(frame: &IndicatorFrame, names: &[&str]) -> Result<Self> {
        let sources = resolve(frame, names)?;
        let mut rows = Vec::new();
        let mut index = Vec::new();
        for i in 0..frame.len() {
            if let Some(row) = row_at(frame, &sources, i) {
                rows.push(row);
                index.push(i);
            }
        }
        Ok(Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            rows,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }
}

/// Feature rows paired with regression targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    /// Bar index of each feature row.
    pub index: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Split into the first `train` rows and the rest, preserving order.
    pub fn split_at(&self, train: usize) -> (Dataset, Dataset) {
        let train = train.min(self.len());
        (
            Dataset {
                x: self.x[..train].to_vec(),
                y: self.y[..train].to_vec(),
                index: self.index[..train].to_vec(),
            },
            Dataset {
                x: self.x[train..].to_vec(),
                y: self.y[train..].to_vec(),
                index: self.index[train..].to_vec(),
            },
        )
    }
}

/// Features at bar `i` against the close of bar `i + 1`.
///
/// Rows whose features or next-day close are undefined are skipped.
pub fn next_day_dataset(frame: &IndicatorFrame, names: &[&str]) -> Result<Dataset> {
    let sources = resolve(frame, names)?;
    let bars = frame.bars();
    let mut ds = Dataset::default();

    for i in 0..frame.len().saturating_sub(1) {
        let (Some(row), Some(target)) = (row_at(frame, &sources, i), bars[i + 1].close_value())
        else {
            continue;
        };
        ds.x.push(row);
        ds.y.push(target);
        ds.index.push(i);
    }

    Ok(ds)
}

/// Feature row of the most recent bar.
pub fn latest_row(frame: &IndicatorFrame, names: &[&str]) -> Result<Vec<f64>> {
    let sources = resolve(frame, names)?;
    let last = frame
        .len()
        .checked_sub(1)
        .ok_or_else(|| Error::Training("no bars to read features from".into()))?;
    row_at(frame, &sources, last).ok_or_else(|| {
        Error::Training(format!(
            "latest bar ({}) lacks one of the features {names:?}",
            frame.bars()[last].date
        ))
    })
}

/// Number of leading rows that go to the training split.
pub fn chronological_split(n: usize, train_ratio: f64) -> usize {
    ((n as f64 * train_ratio.clamp(0.0, 1.0)) as usize).min(n)
}

/// Sliding `lookback`-row windows, each paired with the `target_col` value
/// of the row that follows it.
pub fn sequence_windows(
    rows: &[Vec<f64>],
    lookback: usize,
    target_col: usize,
) -> (Vec<Vec<Vec<f64>>>, Vec<f64>) {
    if lookback == 0 || rows.len() <= lookback {
        return (Vec::new(), Vec::new());
    }
    (lookback..rows.len())
        .map(|i| (rows[i - lookback..i].to_vec(), rows[i][target_col]))
        .unzip()
}

/// Scaled lookback windows over [`SEQUENCE_FEATURES`], targeting the
/// scaled close of the following row.
///
/// Input preparation for a sequence model. No sequence model is fitted in
/// this crate; the pipeline builds it to report how many windows a symbol
/// yields.
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    pub x: Vec<Vec<Vec<f64>>>,
    pub y: Vec<f64>,
    pub scaler: MinMaxScaler,
}

impl SequenceDataset {
    /// Convert scaled close predictions back to prices.
    pub fn unscale_close(&self, values: &[f64]) -> Vec<f64> {
        self.scaler.inverse_transform_column(values, 0)
    }
}

/// Build [`SequenceDataset`] windows from the rows of `frame` where every
/// sequence feature is defined. The scaler is fitted on all of those rows.
pub fn sequence_dataset(frame: &IndicatorFrame, lookback: usize) -> Result<SequenceDataset> {
    let matrix = FeatureMatrix::from_frame(frame, &SEQUENCE_FEATURES)?;
    let scaler = MinMaxScaler::fit(&matrix.rows)?;
    let scaled = scaler.transform(&matrix.rows);
    let (x, y) = sequence_windows(&scaled, lookback, 0);
    Ok(SequenceDataset { x, y, scaler })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use common::PriceBar;
    use indicators::compute_default;

    fn frame(n: usize) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| PriceBar::close_only(start + Days::new(i as u64), 100.0 + i as f64, 1000))
            .collect();
        compute_default(&bars).unwrap()
    }

    #[test]
    fn feature_matrix_drops_incomplete_rows() {
        let f = frame(30);
        let m = FeatureMatrix::from_frame(&f, &BASELINE_FEATURES).unwrap();
        // MA_20 and Volume_MA start at 19; RSI at 14.
        assert_eq!(m.len(), 11);
        assert_eq!(m.index.first(), Some(&19));
        assert_eq!(m.width(), 4);
    }

    #[test]
    fn bar_fields_resolve_by_name() {
        let f = frame(5);
        let m = FeatureMatrix::from_frame(&f, &["Close", "Volume"]).unwrap();
        assert_eq!(m.len(), 5);
        assert_eq!(m.column(0), vec![100.0, 101.0, 102.0, 103.0, 104.0]);
        assert_eq!(m.column(1), vec![1000.0; 5]);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let f = frame(5);
        let err = FeatureMatrix::from_frame(&f, &["MA_7"]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(name) if name == "MA_7"));
    }

    #[test]
    fn next_day_targets_are_shifted_closes() {
        let f = frame(25);
        let ds = next_day_dataset(&f, &["Close"]).unwrap();
        assert_eq!(ds.len(), 24);
        for (row, target) in ds.x.iter().zip(&ds.y) {
            assert_eq!(row[0] + 1.0, *target);
        }
    }

    #[test]
    fn latest_row_requires_defined_features() {
        let f = frame(30);
        let row = latest_row(&f, &BASELINE_FEATURES).unwrap();
        assert_eq!(row.len(), 4);
        assert!(latest_row(&frame(10), &BASELINE_FEATURES).is_err());
    }

    #[test]
    fn split_is_chronological() {
        assert_eq!(chronological_split(10, 0.8), 8);
        assert_eq!(chronological_split(7, 0.8), 5);
        assert_eq!(chronological_split(0, 0.8), 0);
        assert_eq!(chronological_split(5, 1.5), 5);

        let ds = next_day_dataset(&frame(11), &["Close"]).unwrap();
        let (train, test) = ds.split_at(8);
        assert_eq!(train.index, (0..8).collect::<Vec<_>>());
        assert_eq!(test.index, vec![8, 9]);
    }

    #[test]
    fn sequence_dataset_is_scaled_and_windowed() {
        let f = frame(100);
        let ds = sequence_dataset(&f, 10).unwrap();
        // Rows start at 19 (MA_20 and the bands): 81 rows.
        assert_eq!(ds.x.len(), 81 - 10);
        assert_eq!(ds.x[0].len(), 10);
        assert_eq!(ds.x[0][0].len(), SEQUENCE_FEATURES.len());
        assert!(ds.y.iter().all(|v| (0.0..=1.0).contains(v)));
        let last = ds.unscale_close(&[*ds.y.last().unwrap()]);
        assert!((last[0] - 199.0).abs() < 1e-9);
    }

    #[test]
    fn sequence_windows_pair_history_with_next_value() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, -(i as f64)]).collect();
        let (x, y) = sequence_windows(&rows, 3, 0);
        assert_eq!(x.len(), 2);
        assert_eq!(x[0], rows[0..3].to_vec());
        assert_eq!(y, vec![3.0, 4.0]);
        assert!(sequence_windows(&rows, 5, 0).0.is_empty());
    }
}
