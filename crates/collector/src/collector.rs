use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use common::{BarSource, Result};
use indicators::{compute, IndicatorConfig};

use crate::store::{DataStore, StoredSeries};

/// Outcome of one collection pass, keyed by symbol.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectionReport {
    pub stored: BTreeMap<String, PathBuf>,
    pub failed: BTreeMap<String, String>,
}

impl CollectionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches bars, derives indicators, and stores the result per symbol.
pub struct Collector {
    source: Arc<dyn BarSource>,
    store: Arc<DataStore>,
    indicators: Arc<IndicatorConfig>,
    history_days: usize,
}

impl Collector {
    pub fn new(
        source: Arc<dyn BarSource>,
        store: Arc<DataStore>,
        indicators: IndicatorConfig,
        history_days: usize,
    ) -> Self {
        Self {
            source,
            store,
            indicators: Arc::new(indicators),
            history_days,
        }
    }

    /// Collect every distinct symbol in its own task.
    ///
    /// A failing symbol is recorded in the report and does not affect the
    /// others.
    pub async fn collect(&self, symbols: &[String]) -> CollectionReport {
        let unique: BTreeSet<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
        info!(
            source = self.source.name(),
            symbols = unique.len(),
            history_days = self.history_days,
            "Collection started"
        );

        let mut tasks = JoinSet::new();
        for symbol in unique.iter().cloned() {
            let source = self.source.clone();
            let store = self.store.clone();
            let config = self.indicators.clone();
            let days = self.history_days;
            tasks.spawn(async move {
                let outcome = collect_symbol(&*source, &store, &config, &symbol, days).await;
                (symbol, outcome)
            });
        }

        let mut report = CollectionReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, Ok(path))) => {
                    report.stored.insert(symbol, path);
                }
                Ok((symbol, Err(e))) => {
                    error!(symbol = %symbol, error = %e, "Collection failed");
                    report.failed.insert(symbol, e.to_string());
                }
                Err(e) => {
                    error!(error = %e, "Collection task panicked");
                }
            }
        }

        // A panicked task never reports its symbol; account for it here.
        for symbol in unique {
            if !report.stored.contains_key(&symbol) && !report.failed.contains_key(&symbol) {
                report.failed.insert(symbol, "collection task aborted".into());
            }
        }

        info!(
            stored = report.stored.len(),
            failed = report.failed.len(),
            "Collection finished"
        );
        report
    }
}

async fn collect_symbol(
    source: &dyn BarSource,
    store: &DataStore,
    config: &IndicatorConfig,
    symbol: &str,
    days: usize,
) -> Result<PathBuf> {
    let bars = source.daily_bars(symbol, days).await?;
    if bars.len() < days {
        warn!(symbol, requested = days, received = bars.len(), "Short history");
    }
    let frame = compute(&bars, config)?;
    let series = StoredSeries {
        symbol: symbol.to_string(),
        source: source.name().to_string(),
        collected_at: Utc::now(),
        frame,
    };
    store.save(&series).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use common::PriceBar;

    use crate::mock::MockSource;

    fn temp_store(name: &str) -> Arc<DataStore> {
        let root = std::env::temp_dir().join(format!(
            "stockpipe-collector-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        Arc::new(DataStore::new(root, "raw-data"))
    }

    fn collector(store: Arc<DataStore>, source: Arc<dyn BarSource>) -> Collector {
        Collector::new(source, store, IndicatorConfig::default(), 60)
    }

    fn mock() -> Arc<dyn BarSource> {
        Arc::new(MockSource::new(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()))
    }

    #[tokio::test]
    async fn every_symbol_is_stored_once() {
        let store = temp_store("all");
        let symbols: Vec<String> = ["AAPL", "msft", "AAPL", "TSLA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let report = collector(store.clone(), mock()).collect(&symbols).await;

        assert!(report.is_success());
        assert_eq!(
            report.stored.keys().cloned().collect::<Vec<_>>(),
            vec!["AAPL", "MSFT", "TSLA"]
        );
        let latest = store.load_latest("MSFT").await.unwrap();
        assert_eq!(latest.frame.len(), 60);
        assert_eq!(latest.source, "mock");
        assert!(latest.frame.column("MA_50").is_some());
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn failing_symbol_does_not_stop_the_others() {
        let store = temp_store("partial");
        let symbols = vec!["GOOGL".to_string(), "BAD!".to_string()];
        let report = collector(store.clone(), mock()).collect(&symbols).await;

        assert!(!report.is_success());
        assert!(report.stored.contains_key("GOOGL"));
        assert!(report.failed["BAD!"].contains("invalid symbol"));
        assert!(store.load_latest("GOOGL").await.is_ok());
        let _ = std::fs::remove_dir_all(store.root());
    }

    struct GappySource;

    #[async_trait]
    impl BarSource for GappySource {
        fn name(&self) -> &str {
            "gappy"
        }

        async fn daily_bars(&self, _symbol: &str, _days: usize) -> Result<Vec<PriceBar>> {
            let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            Ok(vec![PriceBar {
                date: day,
                open: None,
                high: None,
                low: None,
                close: None,
                volume: Some(1),
            }])
        }
    }

    #[tokio::test]
    async fn series_without_prices_is_reported() {
        let store = temp_store("gappy");
        let report = collector(store, Arc::new(GappySource))
            .collect(&["AMZN".to_string()])
            .await;
        assert!(report.stored.is_empty());
        assert!(report.failed["AMZN"].starts_with("Invalid input"));
    }
}
