use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Result};

/// Window sizes for the indicator calculator.
///
/// Example `config/indicators.toml`:
/// ```toml
/// ma_windows = [5, 20, 50]
/// rsi_period = 14
/// bollinger_period = 20
/// bollinger_std = 2.0
/// volume_window = 20
/// ```
/// Omitted keys fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// One `MA_<w>` column per window, in this order.
    pub ma_windows: Vec<usize>,
    /// Number of close-to-close changes averaged for RSI.
    pub rsi_period: usize,
    /// Window of the Bollinger middle band and its standard deviation.
    pub bollinger_period: usize,
    /// Band half-width in standard deviations.
    pub bollinger_std: f64,
    /// Window of the volume moving average.
    pub volume_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 20, 50],
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_std: 2.0,
            volume_window: 20,
        }
    }
}

impl IndicatorConfig {
    /// Load and validate from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read indicator config at '{}': {e}",
                path.display()
            ))
        })?;
        let cfg: IndicatorConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse indicator config at '{}': {e}",
                path.display()
            ))
        })?;
        cfg.validate()?;
        info!(path = %path.display(), ma_windows = ?cfg.ma_windows, "Loaded indicator config");
        Ok(cfg)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ma_windows.is_empty() {
            return Err(Error::Config("ma_windows must not be empty".into()));
        }
        for (i, w) in self.ma_windows.iter().enumerate() {
            if *w == 0 {
                return Err(Error::Config("ma_windows entries must be >= 1".into()));
            }
            if self.ma_windows[..i].contains(w) {
                return Err(Error::Config(format!("ma_windows lists {w} twice")));
            }
        }
        if self.rsi_period == 0 {
            return Err(Error::Config("rsi_period must be >= 1".into()));
        }
        if self.bollinger_period < 2 {
            return Err(Error::Config("bollinger_period must be >= 2".into()));
        }
        if !self.bollinger_std.is_finite() || self.bollinger_std < 0.0 {
            return Err(Error::Config(format!(
                "bollinger_std must be a finite non-negative number, got {}",
                self.bollinger_std
            )));
        }
        if self.volume_window == 0 {
            return Err(Error::Config("volume_window must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = IndicatorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.ma_windows, vec![5, 20, 50]);
        assert_eq!(cfg.rsi_period, 14);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: IndicatorConfig = toml::from_str("rsi_period = 7\nma_windows = [10]").unwrap();
        assert_eq!(cfg.rsi_period, 7);
        assert_eq!(cfg.ma_windows, vec![10]);
        assert_eq!(cfg.bollinger_period, 20);
        assert_eq!(cfg.bollinger_std, 2.0);
    }

    #[test]
    fn rejects_bad_windows() {
        let bad = [
            IndicatorConfig { ma_windows: vec![], ..Default::default() },
            IndicatorConfig { ma_windows: vec![5, 0], ..Default::default() },
            IndicatorConfig { ma_windows: vec![5, 5], ..Default::default() },
            IndicatorConfig { rsi_period: 0, ..Default::default() },
            IndicatorConfig { bollinger_period: 1, ..Default::default() },
            IndicatorConfig { bollinger_std: -1.0, ..Default::default() },
            IndicatorConfig { bollinger_std: f64::NAN, ..Default::default() },
            IndicatorConfig { volume_window: 0, ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = std::env::temp_dir().join(format!("indicators-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("indicators.toml");
        std::fs::write(&path, "volume_window = 10\n").unwrap();

        let cfg = IndicatorConfig::load(&path).unwrap();
        assert_eq!(cfg.volume_window, 10);

        let missing = IndicatorConfig::load(dir.join("nope.toml"));
        assert!(matches!(missing, Err(Error::Config(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
