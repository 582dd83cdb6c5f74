use crate::dom::{Page, StructuralPath};
use crate::error::Result;
use std::collections::HashMap;

/// Last captured scroll positions for the window and for each container
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f64,
    window_last: f64,
    element_last: HashMap<StructuralPath, f64>,
}

impl ScrollTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            window_last: 0.0,
            element_last: HashMap::new(),
        }
    }

    /// Reset the window baseline, e.g. when listeners are (re)attached
    pub fn reset_window(&mut self, scroll_y: f64) {
        self.window_last = scroll_y;
    }

    /// Delta against the last captured window position, `None` below the threshold
    pub fn window_delta(&self, scroll_y: f64) -> Option<f64> {
        self.significant(scroll_y - self.window_last)
    }

    pub fn commit_window(&mut self, scroll_y: f64) {
        self.window_last = scroll_y;
    }

    /// Delta for a container; containers never captured before start at 0
    pub fn element_delta(&self, path: &StructuralPath, scroll_top: f64) -> Option<f64> {
        let last = self.element_last.get(path).copied().unwrap_or(0.0);
        self.significant(scroll_top - last)
    }

    pub fn commit_element(&mut self, path: &StructuralPath, scroll_top: f64) {
        self.element_last.insert(path.clone(), scroll_top);
    }

    fn significant(&self, delta: f64) -> Option<f64> {
        (delta.abs() >= self.threshold).then_some(delta)
    }
}

/// Scroll containers this engine registered with the page.
///
/// Owns the registrations: attaching a new set always detaches the previous one.
#[derive(Debug, Clone, Default)]
pub struct ScrollListeners {
    attached: Vec<StructuralPath>,
}

impl ScrollListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, page: &dyn Page, targets: Vec<StructuralPath>) -> Result<()> {
        page.watch_scroll(&targets)?;
        self.attached = targets;
        log::debug!("Attached scroll listeners: {}", self.attached.len());
        Ok(())
    }

    pub fn detach_all(&mut self, page: &dyn Page) -> Result<()> {
        if !self.attached.is_empty() {
            page.watch_scroll(&[])?;
            self.attached.clear();
        }
        Ok(())
    }

    pub fn is_watching(&self, path: &StructuralPath) -> bool {
        self.attached.contains(path)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}
