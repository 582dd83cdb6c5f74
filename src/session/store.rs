//! Persisted session state.

use crate::error::{CaptureError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::sync::RwLock;

/// Process-wide key/value store that outlives a single page context.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read `keys`; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Write every entry as one atomic group
    async fn set(&self, entries: Map<String, Value>) -> Result<()>;
}

/// Read with a bounded number of attempts a fixed delay apart; the last failure
/// is returned
pub async fn get_with_retry(
    store: &dyn StateStore,
    keys: &[&str],
    attempts: u32,
    delay: Duration,
) -> Result<Map<String, Value>> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.get(keys).await {
            Ok(values) => return Ok(values),
            Err(e) if attempt < attempts => {
                log::warn!("State read failed (attempt {}/{}): {}", attempt, attempts, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn select(values: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| values.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// In-memory store for a single process and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self { values: RwLock::new(entries) }
    }

    /// Copy of everything stored
    pub async fn dump(&self) -> Map<String, Value> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let values = self.values.read().await;
        Ok(select(&values, keys))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        let mut values = self.values.write().await;
        values.extend(entries);
        Ok(())
    }
}

/// Store persisted as one JSON object on disk.
///
/// Writes go to a sibling temp file that is renamed over the target, so a group
/// lands in full or not at all.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(CaptureError::Storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(values) => Ok(values),
            other => Err(CaptureError::Storage(format!(
                "{} does not hold an object (found {})",
                self.path.display(),
                other
            ))),
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.read().await;
        let values = self.read_all().await?;
        Ok(select(&values, keys))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut values = self.read_all().await?;
        values.extend(entries);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(&Value::Object(values))?;
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        log::debug!("Persisted state to {}", self.path.display());
        Ok(())
    }
}
