use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the capture engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Scroll deltas smaller than this are treated as noise
    pub scroll_threshold_px: f64,

    /// Quiet period before a window scroll is recorded
    pub window_scroll_debounce_ms: u64,

    /// Quiet period before a scroll inside an element is recorded
    pub element_scroll_debounce_ms: u64,

    /// Settle delay after a mutation or submit before the page boundary is pushed
    pub boundary_settle_ms: u64,

    /// Delay between start and arming of mutation/submit observation
    pub observer_arm_delay_ms: u64,

    pub store_retry_attempts: u32,
    pub store_retry_delay_ms: u64,

    pub notification_duration_ms: u64,

    /// Element ids whose subtrees never trigger a page boundary (notification UI)
    pub ignored_subtree_ids: Vec<String>,

    /// Id of the injected manual control container
    pub controls_container_id: String,

    /// Field name used when no label, aria-label or placeholder is available
    pub fallback_field_name: String,

    /// Message attached to `intervene` actions
    pub intervene_message: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scroll_threshold_px: 10.0,
            window_scroll_debounce_ms: 1000,
            element_scroll_debounce_ms: 300,
            boundary_settle_ms: 500,
            observer_arm_delay_ms: 1000,
            store_retry_attempts: 3,
            store_retry_delay_ms: 200,
            notification_duration_ms: 3000,
            ignored_subtree_ids: vec!["capture-toast-container".to_string()],
            controls_container_id: "capture-control-buttons".to_string(),
            fallback_field_name: "unknown_field".to_string(),
            intervene_message: "manual intervention needed".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Builder method: set the scroll noise threshold
    pub fn scroll_threshold(mut self, px: f64) -> Self {
        self.scroll_threshold_px = px;
        self
    }

    /// Builder method: set the window and element scroll debounce periods
    pub fn scroll_debounce(mut self, window_ms: u64, element_ms: u64) -> Self {
        self.window_scroll_debounce_ms = window_ms;
        self.element_scroll_debounce_ms = element_ms;
        self
    }

    /// Builder method: set the page boundary settle delay
    pub fn boundary_settle(mut self, ms: u64) -> Self {
        self.boundary_settle_ms = ms;
        self
    }

    /// Builder method: set the observer arming delay
    pub fn observer_arm_delay(mut self, ms: u64) -> Self {
        self.observer_arm_delay_ms = ms;
        self
    }

    /// Builder method: set the store retry policy
    pub fn store_retry(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.store_retry_attempts = attempts;
        self.store_retry_delay_ms = delay_ms;
        self
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn store_retry_delay(&self) -> Duration {
        Duration::from_millis(self.store_retry_delay_ms)
    }
}
