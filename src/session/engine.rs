use crate::config::CaptureConfig;
use crate::document::{ReverseValueMap, reconstruct_document};
use crate::dom::{
    MutationKind, Page, PageEvent, ScanGeneration, StructuralPath, infer_field_name, label_text, lineage, locate,
    scan_page, within_subtree,
};
use crate::error::{CaptureError, Result};
use crate::host::{
    ControlChannel, ControlMessage, ControlResponse, DirectoryExportSink, DirectoryReferenceSource, ExportSink,
    LocalCoordinator, LogNotifier, Notifier, ReferenceSource, Severity,
};
use crate::scheduler::Task;
use crate::session::local::LocalState;
use crate::session::state::{
    ACTIVE_CAPTURE_TABS, CAPTURED_PAGES, CaptureExport, PageCapture, REVERSE_VALUE_MAP, SessionFlags, SessionState,
    load_pages, load_reverse_map, save_reverse_map, tab_list,
};
use crate::session::store::{StateStore, get_with_retry};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Files written by a stop
#[derive(Debug, Clone, PartialEq)]
pub struct StopReport {
    /// Name of the capture export (`instruction-<epoch ms>.json`)
    pub capture_file: String,
    pub capture_location: String,
    pub pages: usize,

    /// Location of the reconstructed document; `None` when the phase was unknown
    pub document_location: Option<String>,
}

/// Capture engine for one page context.
///
/// Session flags, captured pages and the reverse value map live in the
/// [`StateStore`]; everything tied to the live document (scan generation,
/// action buffer, listeners, pending debounced work) lives in a [`LocalState`]
/// that is rebuilt whenever it is missing while the store says a capture is
/// running.
///
/// Time is a caller-supplied millisecond clock: `handle_event` schedules
/// debounced work and `tick` runs whatever is due.
pub struct CaptureEngine {
    page: Arc<dyn Page>,
    store: Arc<dyn StateStore>,
    references: Arc<dyn ReferenceSource>,
    exports: Arc<dyn ExportSink>,
    notifier: Arc<dyn Notifier>,
    control: Arc<dyn ControlChannel>,
    config: CaptureConfig,
    local: Option<LocalState>,
}

impl CaptureEngine {
    /// Create an engine with file-backed references (`data/`), exports to the
    /// working directory, log notifications and an in-process coordinator
    pub fn new(page: Arc<dyn Page>, store: Arc<dyn StateStore>, config: CaptureConfig) -> Self {
        let control = Arc::new(LocalCoordinator::new("local", Arc::clone(&store)));
        Self {
            page,
            store,
            references: Arc::new(DirectoryReferenceSource::new("data")),
            exports: Arc::new(DirectoryExportSink::new(".")),
            notifier: Arc::new(LogNotifier),
            control,
            config,
            local: None,
        }
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceSource>) -> Self {
        self.references = references;
        self
    }

    pub fn with_exports(mut self, exports: Arc<dyn ExportSink>) -> Self {
        self.exports = exports;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_control(mut self, control: Arc<dyn ControlChannel>) -> Self {
        self.control = control;
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// In-memory page context, if any
    pub fn local(&self) -> Option<&LocalState> {
        self.local.as_ref()
    }

    /// Current scan generation
    pub fn generation(&self) -> Option<Arc<ScanGeneration>> {
        self.local.as_ref().map(|local| Arc::clone(&local.generation))
    }

    pub async fn state(&self) -> Result<SessionState> {
        Ok(SessionFlags::load(self.store.as_ref()).await?.state())
    }

    /// Start capturing `phase`, or refresh the running capture.
    ///
    /// A fresh start builds the reverse value map and resets the persisted
    /// session. Starting while capturing keeps pages, phase and map and only
    /// drops the unflushed action buffer.
    pub async fn start(&mut self, phase: &str, now: u64) -> Result<()> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        let resumed = flags.is_capturing;

        if resumed {
            if flags.capture_phase.as_deref() != Some(phase) {
                log::info!(
                    "Capture already running for {:?}, ignoring requested phase \"{}\"",
                    flags.capture_phase,
                    phase
                );
            }
            let local = self.local.get_or_insert_with(|| LocalState::new(&self.config));
            local.recorder.clear();
        } else {
            let map = self.build_reverse_map(phase).await;
            let mut entries = SessionFlags::capturing(phase).to_entries();
            entries.insert(CAPTURED_PAGES.to_string(), Value::Array(Vec::new()));
            entries.insert(REVERSE_VALUE_MAP.to_string(), serde_json::to_value(&map)?);
            self.store.set(entries).await?;
            self.local = Some(LocalState::new(&self.config));
        }

        self.attach_listeners(now)?;
        self.install_controls().await?;
        self.rescan()?;

        if resumed {
            log::info!("Capture resumes from where it was left");
            self.notify("Capture resumes from where it was left", Severity::Info);
        } else {
            log::info!("Capture started (phase \"{}\")", phase);
            self.notify("Capture started", Severity::Info);
        }
        Ok(())
    }

    /// Finish the capture: final page push, capture export, document
    /// reconstruction, then the session is cleared.
    ///
    /// Returns `None` when no capture is running. A page that can no longer be
    /// reached only costs the unflushed final page: the persisted pages are still
    /// exported and the session is cleared. A reconstruction failure other than
    /// an unknown phase is returned after the session has been cleared.
    pub async fn stop(&mut self, now: u64) -> Result<Option<StopReport>> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        if !flags.is_capturing {
            log::debug!("Stop requested while idle");
            return Ok(None);
        }

        if let Err(e) = self.finish_page(&flags, now).await {
            log::warn!("Final page not captured: {}", e);
            self.notify("Final page could not be captured", Severity::Warning);
        }

        let pages = load_pages(self.store.as_ref()).await?;
        let page_count = pages.len();
        let capture_file = format!("instruction-{}.json", epoch_millis());
        let export = serde_json::to_value(CaptureExport { pages })?;
        let capture_location = self.exports.write(&capture_file, &export).await?;
        log::info!("Final data saved to {} ({} pages)", capture_location, page_count);
        self.notify("Final data saved", Severity::Success);

        let document = self.export_document(flags.capture_phase.as_deref()).await;

        self.store.set(SessionFlags::default().to_entries()).await?;

        if let Err(e) = self.page.remove_controls(&self.config.controls_container_id) {
            log::warn!("Failed to remove capture controls: {}", e);
        }
        if let Err(e) = self.control.send(ControlMessage::CleanupControlsOnAllTabs).await {
            log::warn!("Failed to send cleanup to coordinator: {}", e);
        }
        self.local = None;

        Ok(Some(StopReport {
            capture_file,
            capture_location,
            pages: page_count,
            document_location: document?,
        }))
    }

    /// Pause for a manual intervention: records an `intervene` action and pushes
    /// the current page
    pub async fn pause(&mut self, now: u64) -> Result<()> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        if flags.state() != SessionState::Capturing {
            return Ok(());
        }
        self.restore_local(&flags, now).await?;

        let paused = SessionFlags {
            paused_for_intervention: true,
            ..flags
        };
        self.store.set(paused.to_entries()).await?;
        log::info!("Capture paused for manual instruction");
        self.notify("Capture paused for manual instruction", Severity::Info);

        if let Some(local) = self.local.as_mut() {
            local.recorder.record_intervention(&self.config.intervene_message);
        }
        self.push_page().await?;
        Ok(())
    }

    /// Leave a manual intervention; the page is not rescanned
    pub async fn resume(&mut self) -> Result<()> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        if flags.state() != SessionState::Paused {
            return Ok(());
        }
        let resumed = SessionFlags {
            paused_for_intervention: false,
            ..flags
        };
        self.store.set(resumed.to_entries()).await?;
        log::info!("Capture resumed");
        self.notify("Capture resumed", Severity::Success);
        Ok(())
    }

    /// Push the current page now, e.g. before the page loses focus.
    /// Returns whether a page was appended.
    pub async fn flush_pending(&mut self, now: u64) -> Result<bool> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        if !flags.is_capturing {
            return Ok(false);
        }
        self.restore_local(&flags, now).await?;
        self.push_page().await
    }

    /// Rebuild the in-memory page context when the store says a capture is
    /// running but this engine has none. Returns whether it was rebuilt.
    pub async fn ensure_local_state(&mut self, now: u64) -> Result<bool> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        self.restore_local(&flags, now).await
    }

    /// Dispatch one page event
    pub async fn handle_event(&mut self, event: PageEvent, now: u64) -> Result<()> {
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        if !flags.is_capturing {
            return Ok(());
        }
        self.restore_local(&flags, now).await?;

        match event {
            PageEvent::InterveneRequested => return self.pause(now).await,
            PageEvent::ContinueRequested => return self.resume().await,
            _ => {}
        }
        if !flags.is_recording() {
            return Ok(());
        }
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let generation = Arc::clone(&local.generation);

        match event {
            PageEvent::Click { path } if local.listeners_attached => {
                if let Some(action) = local.recorder.record_click(&generation, &path) {
                    log::debug!("Click captured: {:?}", action);
                }
            }
            PageEvent::Change { path, value } if local.listeners_attached => {
                self.record_change(&generation, &path, &value).await?;
            }
            PageEvent::WindowScroll { scroll_y } if local.listeners_attached => {
                local.scheduler.schedule(
                    Task::WindowScroll { scroll_y },
                    now,
                    self.config.window_scroll_debounce_ms,
                );
            }
            PageEvent::ElementScroll { path, scroll_top } => {
                if local.listeners.is_watching(&path) {
                    local.scheduler.schedule(
                        Task::ElementScroll { path, scroll_top },
                        now,
                        self.config.element_scroll_debounce_ms,
                    );
                }
            }
            PageEvent::Mutation { target, kind } => {
                if !local.observer_armed(now) || kind == MutationKind::CharacterData {
                    return Ok(());
                }
                let snapshot = self.page.snapshot()?;
                if within_subtree(&snapshot.root, &target, &self.config.ignored_subtree_ids) {
                    return Ok(());
                }
                local.scheduler.schedule(Task::BoundaryCheck, now, self.config.boundary_settle_ms);
            }
            PageEvent::Submit => {
                if local.observer_armed(now) {
                    local.scheduler.schedule(Task::BoundaryCheck, now, self.config.boundary_settle_ms);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Run the debounced work due at `now`
    pub async fn tick(&mut self, now: u64) -> Result<()> {
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let due = local.scheduler.take_due(now);
        if due.is_empty() {
            return Ok(());
        }

        let flags = SessionFlags::load(self.store.as_ref()).await?;
        for task in due {
            if !flags.is_recording() {
                log::debug!("Dropping {:?}, capture not recording", task.key());
                continue;
            }
            self.run_task(task).await?;
        }
        Ok(())
    }

    /// Scan the page into a new generation and re-attach container scroll listeners
    pub fn rescan(&mut self) -> Result<()> {
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let snapshot = self.page.snapshot()?;
        let scan = scan_page(&snapshot, local.next_serial());
        local.listeners.replace(self.page.as_ref(), scan.scrollables.clone())?;
        log::debug!(
            "Scan {} found {} interactables on {}",
            scan.generation.serial(),
            scan.interactables.len(),
            snapshot.url
        );
        local.install_scan(scan);
        Ok(())
    }

    async fn run_task(&mut self, task: Task) -> Result<()> {
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let recorded = match task {
            Task::WindowScroll { scroll_y } => local.recorder.record_window_scroll(scroll_y),
            Task::ElementScroll { path, scroll_top } => {
                let generation = Arc::clone(&local.generation);
                local.recorder.record_element_scroll(&generation, &path, scroll_top)
            }
            Task::BoundaryCheck => {
                self.push_page().await?;
                return self.rescan();
            }
        };

        if let Some(action) = recorded {
            log::debug!("Scroll captured: {:?}", action);
            self.push_page().await?;
            self.rescan()?;
        }
        Ok(())
    }

    async fn record_change(&mut self, generation: &ScanGeneration, path: &StructuralPath, value: &str) -> Result<()> {
        let mut map = load_reverse_map(self.store.as_ref()).await?;
        let page = self.page.as_ref();
        let fallback = self.config.fallback_field_name.as_str();
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let outcome = local
            .recorder
            .record_fill(generation, path, value, &mut map, || infer_field(page, path, fallback));

        if let Some(outcome) = outcome {
            log::debug!("Input captured: {:?}", outcome.action);
            if outcome.map_changed {
                save_reverse_map(self.store.as_ref(), &map).await?;
            }
        }
        Ok(())
    }

    /// Append the current page to the captured pages.
    ///
    /// No-op without tracked interactables or without actions after dedup.
    async fn push_page(&mut self) -> Result<bool> {
        let Some(local) = self.local.as_ref() else {
            return Ok(false);
        };
        if local.interactables.is_empty() {
            log::debug!("No tracked interactables, nothing to push");
            return Ok(false);
        }
        let actions = local.recorder.finalize();
        if actions.is_empty() {
            log::info!("Skipping page capture (no actions)");
            self.notify("Skipping page capture (no actions)", Severity::Info);
            return Ok(false);
        }
        let interactables = local.interactables.clone();

        let snapshot = self.page.snapshot()?;
        let flags = SessionFlags::load(self.store.as_ref()).await?;
        let mut pages = load_pages(self.store.as_ref()).await?;
        let action_count = actions.len();
        pages.push(PageCapture {
            url: snapshot.url.clone(),
            interactables,
            phase: flags.capture_phase,
            scroll_y: snapshot.scroll_y,
            actions,
        });

        let mut entries = Map::new();
        entries.insert(CAPTURED_PAGES.to_string(), serde_json::to_value(&pages)?);
        self.store.set(entries).await?;

        if let Some(local) = self.local.as_mut() {
            local.recorder.clear();
            local.interactables.clear();
        }
        log::info!("Captured page {} ({} actions)", snapshot.url, action_count);
        self.notify("Page captured", Severity::Success);
        Ok(true)
    }

    async fn build_reverse_map(&self, phase: &str) -> ReverseValueMap {
        match ReverseValueMap::build(phase, self.references.as_ref()).await {
            Ok(map) => {
                log::info!("Reverse map built for phase \"{}\" ({} values)", phase, map.len());
                self.notify(&format!("Reverse map built for phase \"{}\"", phase), Severity::Success);
                map
            }
            Err(CaptureError::UnknownPhase(name)) => {
                log::warn!("Unknown capture phase: \"{}\"", name);
                self.notify(&format!("Unknown capture phase: \"{}\"", name), Severity::Warning);
                ReverseValueMap::new()
            }
            Err(e) => {
                log::error!("{}", e);
                self.notify(&e.to_string(), Severity::Error);
                ReverseValueMap::new()
            }
        }
    }

    async fn export_document(&self, phase: Option<&str>) -> Result<Option<String>> {
        let map = load_reverse_map(self.store.as_ref()).await?;
        match reconstruct_document(phase.unwrap_or_default(), &map) {
            Ok(reconstructed) => {
                let location = self
                    .exports
                    .write(&reconstructed.file_name, &reconstructed.document)
                    .await?;
                log::info!("Exported {} to {}", reconstructed.file_name, location);
                self.notify(&format!("Exported {}", reconstructed.file_name), Severity::Success);
                Ok(Some(location))
            }
            Err(CaptureError::UnknownPhase(_)) => {
                log::warn!("Unknown capture phase. Skipping export.");
                self.notify("Unknown capture phase. Skipping export.", Severity::Warning);
                Ok(None)
            }
            Err(e) => {
                log::error!("Document reconstruction failed: {}", e);
                self.notify("Document reconstruction failed", Severity::Error);
                Err(e)
            }
        }
    }

    fn attach_listeners(&mut self, now: u64) -> Result<()> {
        let snapshot = self.page.snapshot()?;
        self.page.set_capture_listeners(true)?;
        if let Some(local) = self.local.as_mut() {
            local.recorder.reset_window_scroll(snapshot.scroll_y);
            local.listeners_attached = true;
            local.arm_observer(now, self.config.observer_arm_delay_ms);
        }
        Ok(())
    }

    /// Rebuild the page context after the page was torn down: listeners,
    /// manual controls and a fresh scan
    async fn restore_local(&mut self, flags: &SessionFlags, now: u64) -> Result<bool> {
        if !flags.is_capturing || self.local.is_some() {
            return Ok(false);
        }
        log::info!("Local capture state reinitialized");
        self.local = Some(LocalState::new(&self.config));
        self.attach_listeners(now)?;
        self.install_controls().await?;
        self.rescan()?;
        Ok(true)
    }

    /// Inject the manual controls and register this page's tab, once per page context
    async fn install_controls(&mut self) -> Result<()> {
        let pending = self.local.as_ref().is_some_and(|local| !local.controls_injected);
        if !pending {
            return Ok(());
        }
        self.page.inject_controls(&self.config.controls_container_id)?;
        if let Some(local) = self.local.as_mut() {
            local.controls_injected = true;
        }
        self.register_tab().await
    }

    /// Detach the page listeners and push the last page
    async fn finish_page(&mut self, flags: &SessionFlags, now: u64) -> Result<()> {
        self.restore_local(flags, now).await?;
        if let Some(local) = self.local.as_mut() {
            local.scheduler.clear();
            local.listeners_attached = false;
            self.page.set_capture_listeners(false)?;
            local.listeners.detach_all(self.page.as_ref())?;
        }
        self.push_page().await?;
        Ok(())
    }

    async fn register_tab(&self) -> Result<()> {
        let tab_id = match self.control.send(ControlMessage::GetCurrentTabId).await {
            Ok(ControlResponse::TabId(id)) => id,
            Ok(other) => {
                log::warn!("Unexpected reply to tab id request: {:?}", other);
                return Ok(());
            }
            Err(e) => {
                log::warn!("Failed to resolve current tab id: {}", e);
                return Ok(());
            }
        };

        let values = get_with_retry(
            self.store.as_ref(),
            &[ACTIVE_CAPTURE_TABS],
            self.config.store_retry_attempts,
            self.config.store_retry_delay(),
        )
        .await?;
        let mut tabs = tab_list(values.get(ACTIVE_CAPTURE_TABS));
        if !tabs.contains(&tab_id) {
            tabs.push(tab_id);
            let mut entries = Map::new();
            entries.insert(
                ACTIVE_CAPTURE_TABS.to_string(),
                Value::Array(tabs.into_iter().map(Value::String).collect()),
            );
            self.store.set(entries).await?;
        }
        Ok(())
    }

    fn notify(&self, message: &str, severity: Severity) {
        if let Err(e) = self
            .notifier
            .notify(message, severity, self.config.notification_duration())
        {
            log::debug!("Notification not shown: {}", e);
        }
    }
}

/// Field name for a new value typed into the element at `path`, read from the live page
fn infer_field(page: &dyn Page, path: &StructuralPath, fallback: &str) -> String {
    let snapshot = match page.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::debug!("No snapshot for field inference: {}", e);
            return fallback.to_string();
        }
    };
    let root = &snapshot.root;
    let chain = locate(root, path).and_then(|handle| lineage(root, &handle));
    match chain.as_deref().and_then(|chain| chain.split_last()) {
        Some((node, ancestors)) => {
            let label = label_text(node, root, ancestors);
            infer_field_name(node, label.as_deref(), fallback)
        }
        None => fallback.to_string(),
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
