use crate::dom::element::{DomNode, Viewport};
use crate::dom::path::{NodeHandle, StructuralPath};
use crate::error::{CaptureError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Live document state at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,

    #[serde(default)]
    pub viewport: Viewport,

    /// Window vertical scroll offset
    #[serde(default)]
    pub scroll_y: f64,

    /// The root (`html`) element
    pub root: DomNode,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, root: DomNode) -> Self {
        Self {
            url: url.into(),
            viewport: Viewport::default(),
            scroll_y: 0.0,
            root,
        }
    }

    /// Builder method: set the viewport size
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    /// Builder method: set the window scroll offset
    pub fn with_scroll_y(mut self, scroll_y: f64) -> Self {
        self.scroll_y = scroll_y;
        self
    }
}

/// Kind of DOM mutation reported by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// Raw events delivered by the page host.
///
/// Click and change targets carry the structural path computed when the event
/// fired, so later DOM changes cannot redirect them to another element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    Click { path: StructuralPath },
    Change { path: StructuralPath, value: String },
    WindowScroll { scroll_y: f64 },
    /// Scroll inside a container registered through [`Page::watch_scroll`]
    ElementScroll { path: StructuralPath, scroll_top: f64 },
    Mutation { target: NodeHandle, kind: MutationKind },
    Submit,
    /// Manual control: pause capture for an untracked intervention
    InterveneRequested,
    /// Manual control: resume capture
    ContinueRequested,
}

/// Access to the live page the engine records
pub trait Page: Send + Sync {
    /// Snapshot the current document
    fn snapshot(&self) -> Result<PageSnapshot>;

    /// Attach or detach the click, change and scroll listeners
    fn set_capture_listeners(&self, attached: bool) -> Result<()>;

    /// Replace the set of scroll containers reporting [`PageEvent::ElementScroll`];
    /// an empty slice detaches them all
    fn watch_scroll(&self, targets: &[StructuralPath]) -> Result<()>;

    /// Add the manual control buttons
    fn inject_controls(&self, container_id: &str) -> Result<()>;

    fn remove_controls(&self, container_id: &str) -> Result<()>;
}

/// In-memory page backed by a replaceable snapshot
#[derive(Debug)]
pub struct SnapshotPage {
    snapshot: Mutex<PageSnapshot>,
    watched: Mutex<Vec<StructuralPath>>,
    controls: Mutex<Option<String>>,
    listening: Mutex<bool>,
    closed: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| CaptureError::PageAccess(format!("page state lock poisoned: {}", e)))
}

impl SnapshotPage {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            watched: Mutex::new(Vec::new()),
            controls: Mutex::new(None),
            listening: Mutex::new(false),
            closed: Mutex::new(false),
        }
    }

    /// Make every page call fail from now on, like a closed tab
    pub fn close(&self) -> Result<()> {
        *lock(&self.closed)? = true;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if *lock(&self.closed)? {
            return Err(CaptureError::PageAccess("page closed".to_string()));
        }
        Ok(())
    }

    /// Replace the document, e.g. after a navigation
    pub fn set_snapshot(&self, snapshot: PageSnapshot) -> Result<()> {
        *lock(&self.snapshot)? = snapshot;
        Ok(())
    }

    /// Mutate the document in place
    pub fn update(&self, change: impl FnOnce(&mut PageSnapshot)) -> Result<()> {
        change(&mut *lock(&self.snapshot)?);
        Ok(())
    }

    pub fn watched_scroll_targets(&self) -> Result<Vec<StructuralPath>> {
        Ok(lock(&self.watched)?.clone())
    }

    pub fn controls_container(&self) -> Result<Option<String>> {
        Ok(lock(&self.controls)?.clone())
    }

    pub fn is_listening(&self) -> Result<bool> {
        Ok(*lock(&self.listening)?)
    }
}

impl Page for SnapshotPage {
    fn snapshot(&self) -> Result<PageSnapshot> {
        self.ensure_open()?;
        Ok(lock(&self.snapshot)?.clone())
    }

    fn set_capture_listeners(&self, attached: bool) -> Result<()> {
        self.ensure_open()?;
        *lock(&self.listening)? = attached;
        Ok(())
    }

    fn watch_scroll(&self, targets: &[StructuralPath]) -> Result<()> {
        self.ensure_open()?;
        *lock(&self.watched)? = targets.to_vec();
        Ok(())
    }

    fn inject_controls(&self, container_id: &str) -> Result<()> {
        self.ensure_open()?;
        *lock(&self.controls)? = Some(container_id.to_string());
        Ok(())
    }

    fn remove_controls(&self, _container_id: &str) -> Result<()> {
        self.ensure_open()?;
        *lock(&self.controls)? = None;
        Ok(())
    }
}
