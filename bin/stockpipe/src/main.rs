use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use collector::{forecast_stored, train_stored, Collector, DataStore, MockSource};
use common::{BarSource, Config, Result};
use indicators::IndicatorConfig;
use training::{TrainingConfig, MAX_DAYS_AHEAD};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        error!(error = %e, "Pipeline failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    let indicator_cfg = IndicatorConfig::load_or_default(cfg.indicator_config_path.as_deref())?;
    let training_cfg = TrainingConfig::default();
    info!(
        symbols = ?cfg.symbols,
        data_dir = %cfg.data_dir.display(),
        history_days = cfg.history_days,
        "Stock pipeline starting"
    );

    // ── Collection ────────────────────────────────────────────────────────────
    let source: Arc<dyn BarSource> = Arc::new(MockSource::today());
    let store = Arc::new(DataStore::new(cfg.data_dir.clone(), cfg.data_prefix.clone()));
    let collector = Collector::new(source, store.clone(), indicator_cfg.clone(), cfg.history_days);
    let collected = collector.collect(&cfg.symbols).await;
    for (symbol, reason) in &collected.failed {
        warn!(symbol = %symbol, reason = %reason, "Skipping symbol");
    }
    let symbols: Vec<String> = collected.stored.keys().cloned().collect();

    // ── Training ──────────────────────────────────────────────────────────────
    let trained = train_stored(&store, &symbols, &training_cfg).await;

    // ── Forecasts ─────────────────────────────────────────────────────────────
    let days_ahead = cfg.days_ahead.clamp(1, MAX_DAYS_AHEAD);
    let forecasts =
        forecast_stored(&store, &symbols, days_ahead, &indicator_cfg, &training_cfg).await;
    for prediction in forecasts.done.values() {
        info!(
            symbol = %prediction.symbol,
            run_id = %prediction.run_id,
            rmse = prediction.metrics.rmse,
            r2 = prediction.metrics.r2,
            "Forecast ready"
        );
        println!("{}", serde_json::to_string_pretty(prediction)?);
    }

    info!(
        stored = collected.stored.len(),
        failed = collected.failed.len(),
        trained = trained.done.len(),
        forecasts = forecasts.done.len(),
        "Pipeline finished"
    );
    Ok(())
}
