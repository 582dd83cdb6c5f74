use crate::document::ReverseValueMap;
use crate::dom::InteractableDescriptor;
use crate::error::Result;
use crate::recorder::RecordedAction;
use crate::session::store::StateStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted keys
pub const IS_CAPTURING: &str = "is_capturing";
pub const CAPTURE_PHASE: &str = "capture_phase";
pub const PAUSED_FOR_INTERVENTION: &str = "paused_for_intervention";
pub const CAPTURED_PAGES: &str = "captured_pages";
pub const REVERSE_VALUE_MAP: &str = "reverse_value_map";
pub const ACTIVE_CAPTURE_TABS: &str = "active_capture_tabs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Paused,
}

/// Session flags, always written together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub is_capturing: bool,
    pub capture_phase: Option<String>,
    pub paused_for_intervention: bool,
}

impl SessionFlags {
    pub fn capturing(phase: &str) -> Self {
        Self {
            is_capturing: true,
            capture_phase: Some(phase.to_string()),
            paused_for_intervention: false,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.is_capturing, self.paused_for_intervention) {
            (false, _) => SessionState::Idle,
            (true, false) => SessionState::Capturing,
            (true, true) => SessionState::Paused,
        }
    }

    /// Handlers only record while capturing and not paused
    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Capturing
    }

    pub async fn load(store: &dyn StateStore) -> Result<Self> {
        let values = store
            .get(&[IS_CAPTURING, CAPTURE_PHASE, PAUSED_FOR_INTERVENTION])
            .await?;
        Ok(Self::from_entries(&values))
    }

    pub fn from_entries(values: &Map<String, Value>) -> Self {
        Self {
            is_capturing: values.get(IS_CAPTURING).and_then(Value::as_bool).unwrap_or(false),
            capture_phase: values
                .get(CAPTURE_PHASE)
                .and_then(Value::as_str)
                .map(str::to_string),
            paused_for_intervention: values
                .get(PAUSED_FOR_INTERVENTION)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    pub fn to_entries(&self) -> Map<String, Value> {
        let mut entries = Map::new();
        entries.insert(IS_CAPTURING.to_string(), Value::Bool(self.is_capturing));
        entries.insert(
            CAPTURE_PHASE.to_string(),
            self.capture_phase.clone().map(Value::String).unwrap_or(Value::Null),
        );
        entries.insert(
            PAUSED_FOR_INTERVENTION.to_string(),
            Value::Bool(self.paused_for_intervention),
        );
        entries
    }
}

/// One finalized page of the capture; immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCapture {
    pub url: String,
    pub interactables: Vec<InteractableDescriptor>,
    pub phase: Option<String>,
    pub scroll_y: f64,
    pub actions: Vec<RecordedAction>,
}

/// Capture export document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureExport {
    pub pages: Vec<PageCapture>,
}

pub async fn load_pages(store: &dyn StateStore) -> Result<Vec<PageCapture>> {
    let mut values = store.get(&[CAPTURED_PAGES]).await?;
    match values.remove(CAPTURED_PAGES) {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(pages) => Ok(serde_json::from_value(pages)?),
    }
}

pub async fn load_reverse_map(store: &dyn StateStore) -> Result<ReverseValueMap> {
    let mut values = store.get(&[REVERSE_VALUE_MAP]).await?;
    match values.remove(REVERSE_VALUE_MAP) {
        Some(Value::Null) | None => Ok(ReverseValueMap::new()),
        Some(map) => Ok(serde_json::from_value(map)?),
    }
}

pub async fn save_reverse_map(store: &dyn StateStore, map: &ReverseValueMap) -> Result<()> {
    let mut entries = Map::new();
    entries.insert(REVERSE_VALUE_MAP.to_string(), serde_json::to_value(map)?);
    store.set(entries).await
}

pub fn tab_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|tabs| {
            tabs.iter()
                .filter_map(|tab| match tab {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
