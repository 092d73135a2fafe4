use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::{Error, PriceBar, Result};

use crate::config::IndicatorConfig;
use crate::indicators::{bollinger, rsi, sma, volume_ma};
use crate::series::IndicatorSeries;

pub const RSI: &str = "RSI";
pub const BB_MIDDLE: &str = "BB_Middle";
pub const BB_UPPER: &str = "BB_Upper";
pub const BB_LOWER: &str = "BB_Lower";
pub const VOLUME_MA: &str = "Volume_MA";

/// Column name of the moving average over `window` closes.
pub fn ma_column(window: usize) -> String {
    format!("MA_{window}")
}

/// One named derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: IndicatorSeries,
}

/// Input bars augmented with named indicator columns.
///
/// Columns keep the order they were computed in: `MA_<w>` for each
/// configured window, then `RSI`, `BB_Middle`, `BB_Upper`, `BB_Lower`,
/// `Volume_MA`. Every column has exactly one position per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    bars: Vec<PriceBar>,
    columns: Vec<Column>,
}

impl IndicatorFrame {
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&IndicatorSeries> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.values)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value of column `name` at bar `i`.
    pub fn value(&self, name: &str, i: usize) -> Option<f64> {
        self.column(name)?.get(i)
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(PriceBar::close_value).collect()
    }

    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(PriceBar::volume_value).collect()
    }

    pub fn into_parts(self) -> (Vec<PriceBar>, Vec<Column>) {
        (self.bars, self.columns)
    }
}

/// Compute every configured indicator for `bars`.
///
/// An empty input yields an empty frame. Bars must be in strictly ascending
/// date order, and at least one bar must carry a usable close; otherwise the
/// call fails with `Error::InvalidInput`. Missing closes or volumes only blank
/// the positions whose windows include them.
pub fn compute(bars: &[PriceBar], config: &IndicatorConfig) -> Result<IndicatorFrame> {
    config.validate()?;

    if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(Error::InvalidInput(format!(
            "bars must be in strictly ascending date order: {} is followed by {}",
            w[0].date, w[1].date
        )));
    }

    let closes: Vec<Option<f64>> = bars.iter().map(PriceBar::close_value).collect();
    let volumes: Vec<Option<f64>> = bars.iter().map(PriceBar::volume_value).collect();

    let missing = closes.iter().filter(|c| c.is_none()).count();
    if !bars.is_empty() && missing == bars.len() {
        return Err(Error::InvalidInput(format!(
            "none of the {} bars has a numeric close price",
            bars.len()
        )));
    }
    if missing > 0 {
        warn!(missing, bars = bars.len(), "Bars with missing close price");
    }

    let mut columns: Vec<Column> = config
        .ma_windows
        .iter()
        .map(|&w| Column {
            name: ma_column(w),
            values: sma(&closes, w),
        })
        .collect();

    columns.push(Column {
        name: RSI.to_string(),
        values: rsi(&closes, config.rsi_period),
    });

    let bands = bollinger(&closes, config.bollinger_period, config.bollinger_std);
    columns.push(Column {
        name: BB_MIDDLE.to_string(),
        values: bands.middle,
    });
    columns.push(Column {
        name: BB_UPPER.to_string(),
        values: bands.upper,
    });
    columns.push(Column {
        name: BB_LOWER.to_string(),
        values: bands.lower,
    });

    columns.push(Column {
        name: VOLUME_MA.to_string(),
        values: volume_ma(&volumes, config.volume_window),
    });

    debug!(bars = bars.len(), columns = columns.len(), "Computed indicators");

    Ok(IndicatorFrame {
        bars: bars.to_vec(),
        columns,
    })
}

/// `compute` with the default windows.
pub fn compute_default(bars: &[PriceBar]) -> Result<IndicatorFrame> {
    compute(bars, &IndicatorConfig::default())
}
