//! Interaction recording
//!
//! Turns resolved page interactions into a per-page action log:
//! - action: recorded action types and fill de-duplication
//! - scroll: scroll baselines, noise threshold and container listener ownership

pub mod action;
pub mod scroll;

pub use action::{RecordedAction, ScrollSource, UNKNOWN_SCROLL_ID, WINDOW_SCROLL_ID, dedup_actions};
pub use scroll::{ScrollListeners, ScrollTracker};

use crate::document::ReverseValueMap;
use crate::dom::{ScanGeneration, StructuralPath};

/// Outcome of recording an input change
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub action: RecordedAction,

    /// The reverse map gained an entry and must be persisted
    pub map_changed: bool,
}

/// Raw action buffer for the page currently being captured
#[derive(Debug, Clone)]
pub struct ActionRecorder {
    raw: Vec<RecordedAction>,
    scroll: ScrollTracker,
}

impl ActionRecorder {
    pub fn new(scroll_threshold: f64) -> Self {
        Self {
            raw: Vec::new(),
            scroll: ScrollTracker::new(scroll_threshold),
        }
    }

    /// Record a click; targets without a uid are dropped
    pub fn record_click(&mut self, generation: &ScanGeneration, path: &StructuralPath) -> Option<RecordedAction> {
        let id = generation.uid_for(path)?.clone();
        let action = RecordedAction::Click { id };
        self.raw.push(action.clone());
        Some(action)
    }

    /// Record an input change as a placeholder fill.
    ///
    /// Known values reuse their first placeholder; new values get `$<field>` with
    /// the field name produced lazily by `infer_field`.
    pub fn record_fill(
        &mut self,
        generation: &ScanGeneration,
        path: &StructuralPath,
        value: &str,
        reverse_map: &mut ReverseValueMap,
        infer_field: impl FnOnce() -> String,
    ) -> Option<FillOutcome> {
        let id = generation.uid_for(path)?.clone();
        let (token, map_changed) = reverse_map.resolve_or_insert(value, infer_field);
        let action = RecordedAction::Fill { id, value: token.to_string() };
        self.raw.push(action.clone());
        Some(FillOutcome { action, map_changed })
    }

    /// Record a window scroll unless it is noise
    pub fn record_window_scroll(&mut self, scroll_y: f64) -> Option<RecordedAction> {
        let delta_y = self.scroll.window_delta(scroll_y)?;
        let action = RecordedAction::Scroll {
            id: WINDOW_SCROLL_ID.to_string(),
            delta_y,
            scroll_to: scroll_y,
            source: ScrollSource::Window,
        };
        self.raw.push(action.clone());
        self.scroll.commit_window(scroll_y);
        Some(action)
    }

    /// Record a container scroll unless it is noise
    pub fn record_element_scroll(
        &mut self,
        generation: &ScanGeneration,
        path: &StructuralPath,
        scroll_top: f64,
    ) -> Option<RecordedAction> {
        let delta_y = self.scroll.element_delta(path, scroll_top)?;
        let id = generation
            .uid_for(path)
            .map(|uid| uid.to_string())
            .unwrap_or_else(|| UNKNOWN_SCROLL_ID.to_string());
        let action = RecordedAction::Scroll {
            id,
            delta_y,
            scroll_to: scroll_top,
            source: ScrollSource::Element,
        };
        self.raw.push(action.clone());
        self.scroll.commit_element(path, scroll_top);
        Some(action)
    }

    pub fn record_intervention(&mut self, message: &str) {
        self.raw.push(RecordedAction::Intervene { message: message.to_string() });
    }

    pub fn reset_window_scroll(&mut self, scroll_y: f64) {
        self.scroll.reset_window(scroll_y);
    }

    /// De-duplicated view of the buffer
    pub fn finalize(&self) -> Vec<RecordedAction> {
        dedup_actions(&self.raw)
    }

    pub fn raw(&self) -> &[RecordedAction] {
        &self.raw
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }
}
