use crate::dom::{Page, PageEvent, PageSnapshot, StructuralPath};
use crate::error::{CaptureError, Result};
use crate::host::{Notifier, Severity};
use headless_chrome::Tab;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const SNAPSHOT_JS: &str = include_str!("snapshot.js");
const CAPTURE_HOOKS_JS: &str = include_str!("capture_hooks.js");

/// Page hook state to restore after the document is replaced
#[derive(Debug, Default)]
struct HookState {
    listening: bool,
    watched: Vec<StructuralPath>,
    controls: Option<String>,
}

/// [`Page`] backed by a Chrome tab.
///
/// Page events are queued inside the document by an injected hook script and
/// collected with [`CdpPage::drain_events`]. When a navigation replaces the
/// document the hooks are reinstalled and the listener, scroll and control
/// state is re-applied.
pub struct CdpPage {
    tab: Arc<Tab>,
    toast_container_id: String,
    ignored_subtrees: Vec<String>,
    hooks: Mutex<HookState>,
}

/// JS expression calling `window.__domCapture.<method>` with JSON arguments
fn hook_call(method: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("window.__domCapture.{}({})", method, args.join(", "))
}

impl CdpPage {
    pub fn new(tab: Arc<Tab>, toast_container_id: impl Into<String>) -> Self {
        let toast_container_id = toast_container_id.into();
        Self {
            tab,
            ignored_subtrees: vec![toast_container_id.clone()],
            toast_container_id,
            hooks: Mutex::new(HookState::default()),
        }
    }

    /// Element ids whose subtree mutations never stand in for page changes
    /// when the page coalesces its mutation events
    pub fn with_ignored_subtrees(mut self, ids: &[String]) -> Self {
        self.ignored_subtrees = ids.to_vec();
        if !self.ignored_subtrees.contains(&self.toast_container_id) {
            self.ignored_subtrees.push(self.toast_container_id.clone());
        }
        self
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Take every event queued in the page since the last call
    pub fn drain_events(&self) -> Result<Vec<PageEvent>> {
        self.ensure_hooks()?;
        let raw = self.evaluate_string(&hook_call("drain", &[]))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn hooks(&self) -> Result<MutexGuard<'_, HookState>> {
        self.hooks
            .lock()
            .map_err(|e| CaptureError::PageAccess(format!("hook state lock poisoned: {}", e)))
    }

    fn evaluate(&self, js: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(js, false)
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn evaluate_string(&self, js: &str) -> Result<String> {
        let value = self.evaluate(js)?;
        serde_json::from_value(value)
            .map_err(|e| CaptureError::ScriptFailed(format!("expected a string result: {}", e)))
    }

    /// Install the hook script if the current document lacks it
    fn ensure_hooks(&self) -> Result<()> {
        if self.evaluate_string(CAPTURE_HOOKS_JS)? != "installed" {
            return Ok(());
        }
        log::debug!("Capture hooks installed");
        self.evaluate(&hook_call("setIgnoredSubtrees", &[json!(self.ignored_subtrees)]))?;

        let hooks = self.hooks()?;
        if hooks.listening {
            self.evaluate(&hook_call("setListening", &[json!(true)]))?;
        }
        if !hooks.watched.is_empty() {
            self.evaluate(&hook_call("watchScroll", &[json!(hooks.watched)]))?;
        }
        if let Some(id) = &hooks.controls {
            self.evaluate(&hook_call("injectControls", &[json!(id)]))?;
        }
        Ok(())
    }
}

impl Page for CdpPage {
    fn snapshot(&self) -> Result<PageSnapshot> {
        let raw = self.evaluate_string(SNAPSHOT_JS)?;
        serde_json::from_str(&raw)
            .map_err(|e| CaptureError::PageAccess(format!("failed to parse page snapshot: {}", e)))
    }

    fn set_capture_listeners(&self, attached: bool) -> Result<()> {
        self.ensure_hooks()?;
        self.evaluate(&hook_call("setListening", &[json!(attached)]))?;
        self.hooks()?.listening = attached;
        Ok(())
    }

    fn watch_scroll(&self, targets: &[StructuralPath]) -> Result<()> {
        self.ensure_hooks()?;
        let attached = self.evaluate(&hook_call("watchScroll", &[json!(targets)]))?;
        log::debug!("Watching {} of {} scroll containers", attached, targets.len());
        self.hooks()?.watched = targets.to_vec();
        Ok(())
    }

    fn inject_controls(&self, container_id: &str) -> Result<()> {
        self.ensure_hooks()?;
        self.evaluate(&hook_call("injectControls", &[json!(container_id)]))?;
        self.hooks()?.controls = Some(container_id.to_string());
        Ok(())
    }

    fn remove_controls(&self, container_id: &str) -> Result<()> {
        self.ensure_hooks()?;
        self.evaluate(&hook_call("removeControls", &[json!(container_id)]))?;
        self.hooks()?.controls = None;
        Ok(())
    }
}

impl Notifier for CdpPage {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) -> Result<()> {
        self.ensure_hooks()?;
        self.evaluate(&hook_call(
            "toast",
            &[
                json!(self.toast_container_id),
                json!(message),
                json!(severity),
                json!(duration.as_millis() as u64),
            ],
        ))?;
        Ok(())
    }
}
