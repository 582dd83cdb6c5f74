//! Host-side collaborators of the capture engine.
//!
//! - Notifier: short user-facing messages with a severity
//! - ControlChannel: requests to the coordinator that owns every page
//! - ReferenceSource: per-phase reference documents
//! - ExportSink: destination of export files

use crate::error::{CaptureError, Result};
use crate::session::state::ACTIVE_CAPTURE_TABS;
use crate::session::store::StateStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Best-effort user notification; failures never affect capture
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) -> Result<()>;
}

/// Notifier that renders notifications as log records
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity, _duration: Duration) -> Result<()> {
        match severity {
            Severity::Info | Severity::Success => log::info!("[notify] {}", message),
            Severity::Warning => log::warn!("[notify] {}", message),
            Severity::Error => log::error!("[notify] {}", message),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    GetCurrentTabId,
    CleanupControlsOnAllTabs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlResponse {
    TabId(String),
    Ack,
}

#[async_trait]
pub trait ControlChannel: Send + Sync {
    async fn send(&self, message: ControlMessage) -> Result<ControlResponse>;
}

/// Coordinator for a single page in this process
pub struct LocalCoordinator {
    tab_id: String,
    store: Arc<dyn StateStore>,
}

impl LocalCoordinator {
    pub fn new(tab_id: impl Into<String>, store: Arc<dyn StateStore>) -> Self {
        Self {
            tab_id: tab_id.into(),
            store,
        }
    }
}

#[async_trait]
impl ControlChannel for LocalCoordinator {
    async fn send(&self, message: ControlMessage) -> Result<ControlResponse> {
        match message {
            ControlMessage::GetCurrentTabId => Ok(ControlResponse::TabId(self.tab_id.clone())),
            ControlMessage::CleanupControlsOnAllTabs => {
                let mut entries = Map::new();
                entries.insert(ACTIVE_CAPTURE_TABS.to_string(), Value::Array(Vec::new()));
                self.store.set(entries).await?;
                log::debug!("Cleared active capture tabs");
                Ok(ControlResponse::Ack)
            }
        }
    }
}

/// Source of per-phase reference documents
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn load(&self, file: &str) -> Result<Value>;
}

/// Reference documents read from a directory
#[derive(Debug, Clone)]
pub struct DirectoryReferenceSource {
    dir: PathBuf,
}

impl DirectoryReferenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReferenceSource for DirectoryReferenceSource {
    async fn load(&self, file: &str) -> Result<Value> {
        let path = self.dir.join(file);
        let raw = fs::read_to_string(&path).await.map_err(|e| CaptureError::ReferenceLoad {
            file: file.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        serde_json::from_str(&raw).map_err(|e| CaptureError::ReferenceLoad {
            file: file.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Destination of export files
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Write `document` under `file_name`; returns where it landed
    async fn write(&self, file_name: &str, document: &Value) -> Result<String>;
}

/// Export files written as pretty JSON into a directory
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ExportSink for DirectoryExportSink {
    async fn write(&self, file_name: &str, document: &Value) -> Result<String> {
        let export_err = |reason: String| CaptureError::Export {
            file: file_name.to_string(),
            reason,
        };
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| export_err(e.to_string()))?;
        let path = self.dir.join(file_name);
        let body = serde_json::to_string_pretty(document)?;
        fs::write(&path, body)
            .await
            .map_err(|e| export_err(e.to_string()))?;
        Ok(path.display().to_string())
    }
}
