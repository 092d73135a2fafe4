use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{Error, Result};
use indicators::IndicatorFrame;
use training::{LinearRegression, ModelKind, TrainedBaseline, TrainingRun};

pub const DEFAULT_PREFIX: &str = "raw-data";

/// Directory under the store root that holds trained models.
pub const MODELS_PREFIX: &str = "models";

/// One collected and enriched series, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSeries {
    pub symbol: String,
    /// Name of the bar source the data came from.
    pub source: String,
    pub collected_at: DateTime<Utc>,
    pub frame: IndicatorFrame,
}

/// A fitted model as persisted. Test-split metrics travel in `run.metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredModel {
    pub kind: ModelKind,
    pub model: LinearRegression,
    pub run: TrainingRun,
}

impl StoredModel {
    pub fn new(kind: ModelKind, trained: TrainedBaseline) -> Self {
        Self {
            kind,
            model: trained.model,
            run: trained.run,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.run.symbol
    }

    pub fn into_trained(self) -> TrainedBaseline {
        TrainedBaseline {
            model: self.model,
            run: self.run,
        }
    }
}

/// JSON files on the local filesystem.
///
/// Series live under `<root>/<prefix>/<SYMBOL>/<YYYYmmdd_HHMMSS>.json`,
/// models under `<root>/models/<model>/<SYMBOL>/<YYYYmmdd_HHMMSS>.json`.
/// Saves within the same second overwrite each other. Loaded models are
/// cached by file path, so a newer save is picked up on the next load.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
    prefix: String,
    models: Arc<RwLock<HashMap<PathBuf, StoredModel>>>,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            models: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.root.join(&self.prefix).join(symbol.to_uppercase())
    }

    fn model_dir(&self, kind: ModelKind, symbol: &str) -> PathBuf {
        self.root
            .join(MODELS_PREFIX)
            .join(kind.to_string())
            .join(symbol.to_uppercase())
    }

    /// Write `series` and return the path of the new file.
    pub async fn save(&self, series: &StoredSeries) -> Result<PathBuf> {
        let dir = self.symbol_dir(&series.symbol);
        let path = write_json(&dir, series.collected_at, series).await?;
        info!(
            symbol = %series.symbol,
            rows = series.frame.len(),
            path = %path.display(),
            "Series stored"
        );
        Ok(path)
    }

    /// Stored series files for `symbol`, oldest first. Unknown symbols have none.
    pub async fn list(&self, symbol: &str) -> Result<Vec<PathBuf>> {
        list_json(&self.symbol_dir(symbol)).await
    }

    /// The most recently collected series for `symbol`.
    pub async fn load_latest(&self, symbol: &str) -> Result<StoredSeries> {
        let path = self
            .list(symbol)
            .await?
            .pop()
            .ok_or_else(|| Error::NotFound(format!("no stored data for {symbol}")))?;
        debug!(symbol, path = %path.display(), "Loading latest series");
        load(&path).await
    }

    /// Write a fitted model, named after the time its training run started.
    pub async fn save_model(&self, stored: &StoredModel) -> Result<PathBuf> {
        let dir = self.model_dir(stored.kind, stored.symbol());
        let path = write_json(&dir, stored.run.started_at, stored).await?;
        self.models.write().await.insert(path.clone(), stored.clone());
        info!(
            symbol = %stored.symbol(),
            model = %stored.kind,
            run_id = %stored.run.id,
            path = %path.display(),
            "Model stored"
        );
        Ok(path)
    }

    /// Stored model files for `symbol`, oldest first.
    pub async fn list_models(&self, kind: ModelKind, symbol: &str) -> Result<Vec<PathBuf>> {
        list_json(&self.model_dir(kind, symbol)).await
    }

    /// The most recently trained `kind` model for `symbol`.
    pub async fn load_latest_model(&self, kind: ModelKind, symbol: &str) -> Result<StoredModel> {
        let path = self
            .list_models(kind, symbol)
            .await?
            .pop()
            .ok_or_else(|| Error::NotFound(format!("no stored {kind} model for {symbol}")))?;

        if let Some(cached) = self.models.read().await.get(&path) {
            debug!(symbol, path = %path.display(), "Model cache hit");
            return Ok(cached.clone());
        }

        debug!(symbol, path = %path.display(), "Loading latest model");
        let stored: StoredModel = read_json(&path).await?;
        self.models.write().await.insert(path, stored.clone());
        Ok(stored)
    }
}

pub async fn load(path: &Path) -> Result<StoredSeries> {
    read_json(path).await
}

async fn write_json<T: Serialize>(dir: &Path, at: DateTime<Utc>, value: &T) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.json", at.format("%Y%m%d_%H%M%S")));
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let body = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn list_json(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
