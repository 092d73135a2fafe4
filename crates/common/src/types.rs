use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One trading day's observation.
///
/// Price fields are optional so that gaps in upstream data survive
/// deserialization. A `None` or non-finite price is treated as missing by
/// every consumer; use the `*_value` accessors instead of reading the fields
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Fully populated bar.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Bar carrying only a close and a volume. Open/high/low are not needed
    /// by the indicator calculator.
    pub fn close_only(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: Some(volume),
        }
    }

    pub fn open_value(&self) -> Option<f64> {
        finite(self.open)
    }

    pub fn high_value(&self) -> Option<f64> {
        finite(self.high)
    }

    pub fn low_value(&self) -> Option<f64> {
        finite(self.low)
    }

    pub fn close_value(&self) -> Option<f64> {
        finite(self.close)
    }

    pub fn volume_value(&self) -> Option<f64> {
        self.volume.map(|v| v as f64)
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// The first Monday-to-Friday date after `date`. Holidays are not modelled.
pub fn next_weekday(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
        next = next + Days::new(1);
    }
    next
}

/// Bar fields addressable by name in feature selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl BarField {
    /// Resolve a table column name (`"Close"`, `"Volume"`, ...) to a bar field.
    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "Open" => Some(BarField::Open),
            "High" => Some(BarField::High),
            "Low" => Some(BarField::Low),
            "Close" => Some(BarField::Close),
            "Volume" => Some(BarField::Volume),
            _ => None,
        }
    }

    pub fn read(self, bar: &PriceBar) -> Option<f64> {
        match self {
            BarField::Open => bar.open_value(),
            BarField::High => bar.high_value(),
            BarField::Low => bar.low_value(),
            BarField::Close => bar.close_value(),
            BarField::Volume => bar.volume_value(),
        }
    }
}

impl std::fmt::Display for BarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarField::Open => write!(f, "Open"),
            BarField::High => write!(f, "High"),
            BarField::Low => write!(f, "Low"),
            BarField::Close => write!(f, "Close"),
            BarField::Volume => write!(f, "Volume"),
        }
    }
}
