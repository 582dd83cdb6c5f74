use crate::config::CaptureConfig;
use crate::dom::{InteractableDescriptor, Scan, ScanGeneration};
use crate::recorder::{ActionRecorder, ScrollListeners};
use crate::scheduler::Scheduler;
use std::sync::Arc;

/// In-memory context of the page being captured.
///
/// Lost whenever the page context is torn down; the persisted flags survive and
/// a fresh `LocalState` is built from them.
#[derive(Debug)]
pub struct LocalState {
    /// Current scan generation; handlers clone the `Arc` at dispatch time
    pub generation: Arc<ScanGeneration>,
    pub interactables: Vec<InteractableDescriptor>,
    pub recorder: ActionRecorder,
    pub listeners: ScrollListeners,
    pub scheduler: Scheduler,
    pub listeners_attached: bool,
    pub controls_injected: bool,
    /// Clock time from which mutation and submit events count
    pub observer_armed_at: Option<u64>,
    next_serial: u64,
}

impl LocalState {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            generation: Arc::new(ScanGeneration::empty()),
            interactables: Vec::new(),
            recorder: ActionRecorder::new(config.scroll_threshold_px),
            listeners: ScrollListeners::new(),
            scheduler: Scheduler::new(),
            listeners_attached: false,
            controls_injected: false,
            observer_armed_at: None,
            next_serial: 1,
        }
    }

    pub fn next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Replace the generation and interactable snapshot with a new scan
    pub fn install_scan(&mut self, scan: Scan) {
        self.generation = Arc::new(scan.generation);
        self.interactables = scan.interactables;
    }

    pub fn arm_observer(&mut self, now: u64, delay_ms: u64) {
        self.observer_armed_at = Some(now.saturating_add(delay_ms));
    }

    pub fn observer_armed(&self, now: u64) -> bool {
        self.observer_armed_at.is_some_and(|at| now >= at)
    }
}
