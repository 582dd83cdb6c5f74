use crate::dom::Uid;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scroll id recorded for window scrolls
pub const WINDOW_SCROLL_ID: &str = "window";

/// Scroll id recorded for containers without a uid in the current generation
pub const UNKNOWN_SCROLL_ID: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollSource {
    Window,
    Element,
}

/// One entry of a page's action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordedAction {
    Click {
        id: Uid,
    },
    /// `value` holds a placeholder token, never the typed text
    Fill {
        id: Uid,
        value: String,
    },
    Scroll {
        id: String,
        delta_y: f64,
        scroll_to: f64,
        source: ScrollSource,
    },
    Intervene {
        message: String,
    },
}

impl RecordedAction {
    pub fn is_fill(&self) -> bool {
        matches!(self, RecordedAction::Fill { .. })
    }
}

/// Collapse fills per target to the latest value.
///
/// Clicks, scrolls and interventions keep their relative order; the surviving
/// fills follow them, ordered by each target's first fill.
pub fn dedup_actions(raw: &[RecordedAction]) -> Vec<RecordedAction> {
    let mut fills: IndexMap<&Uid, &RecordedAction> = IndexMap::new();
    let mut finalized = Vec::with_capacity(raw.len());

    for action in raw {
        match action {
            RecordedAction::Fill { id, .. } => {
                fills.insert(id, action);
            }
            other => finalized.push(other.clone()),
        }
    }

    finalized.extend(fills.into_values().cloned());
    finalized
}
