//! End-to-end capture sessions against an in-memory page

use async_trait::async_trait;
use dom_capture::dom::{DomNode, NodeHandle, PageSnapshot, structural_path};
use dom_capture::host::{ExportSink, LocalCoordinator, Notifier, ReferenceSource, Severity};
use dom_capture::recorder::{RecordedAction, ScrollSource};
use dom_capture::session::{CaptureExport, PageCapture};
use dom_capture::{
    CaptureConfig, CaptureEngine, CaptureError, MemoryStore, PageEvent, Result, SessionState, SnapshotPage,
    StateStore, StructuralPath, Uid,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct References(HashMap<String, Value>);

impl References {
    fn with(mut self, file: &str, doc: Value) -> Self {
        self.0.insert(file.to_string(), doc);
        self
    }
}

#[async_trait]
impl ReferenceSource for References {
    async fn load(&self, file: &str) -> Result<Value> {
        self.0.get(file).cloned().ok_or_else(|| CaptureError::ReferenceLoad {
            file: file.to_string(),
            reason: "not found".to_string(),
        })
    }
}

#[derive(Default)]
struct Exports(Mutex<Vec<(String, Value)>>);

impl Exports {
    fn files(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap().clone()
    }

    fn capture(&self) -> CaptureExport {
        let (_, doc) = self
            .files()
            .into_iter()
            .find(|(name, _)| name.starts_with("instruction-"))
            .expect("capture export written");
        serde_json::from_value(doc).unwrap()
    }
}

#[async_trait]
impl ExportSink for Exports {
    async fn write(&self, file_name: &str, document: &Value) -> Result<String> {
        self.0.lock().unwrap().push((file_name.to_string(), document.clone()));
        Ok(format!("memory://{}", file_name))
    }
}

#[derive(Default)]
struct Notifications(Mutex<Vec<(String, Severity)>>);

impl Notifications {
    fn contains(&self, message: &str, severity: Severity) -> bool {
        self.0
            .lock()
            .unwrap()
            .iter()
            .any(|(m, s)| m == message && *s == severity)
    }

    fn any_with(&self, severity: Severity) -> bool {
        self.0.lock().unwrap().iter().any(|(_, s)| *s == severity)
    }
}

impl Notifier for Notifications {
    fn notify(&self, message: &str, severity: Severity, _duration: Duration) -> Result<()> {
        self.0.lock().unwrap().push((message.to_string(), severity));
        Ok(())
    }
}

const EMAIL: [usize; 3] = [0, 0, 1];
const PASSWORD: [usize; 3] = [0, 0, 2];
const SIGN_IN: [usize; 3] = [0, 0, 3];
const UNLABELED: [usize; 3] = [0, 0, 4];
const TOAST: [usize; 3] = [0, 1, 0];
const SCROLL_BOX: [usize; 2] = [0, 2];

/// html > body > (form, toast container, scroll box)
///
/// Uids: email el_0, password el_1, sign in el_2, unlabeled el_3, scroll box el_4
fn login_page() -> PageSnapshot {
    let root = DomNode::new("html").with_child(
        DomNode::new("body")
            .with_child(
                DomNode::new("form")
                    .with_child(DomNode::new("label").with_attribute("for", "email").with_text("Email"))
                    .with_child(
                        DomNode::new("input")
                            .with_attribute("id", "email")
                            .with_bounding_box(10.0, 10.0, 200.0, 20.0),
                    )
                    .with_child(
                        DomNode::new("input")
                            .with_attribute("type", "password")
                            .with_attribute("aria-label", "Password")
                            .with_bounding_box(10.0, 40.0, 200.0, 20.0),
                    )
                    .with_child(
                        DomNode::new("button")
                            .with_text("Sign in")
                            .with_bounding_box(10.0, 70.0, 80.0, 20.0),
                    )
                    .with_child(DomNode::new("input").with_bounding_box(10.0, 100.0, 200.0, 20.0)),
            )
            .with_child(
                DomNode::new("div")
                    .with_attribute("id", "capture-toast-container")
                    .with_child(DomNode::new("div").with_text("Capture started")),
            )
            .with_child(
                DomNode::new("div")
                    .with_scroll(2000.0, 300.0, 0.0)
                    .with_bounding_box(300.0, 10.0, 200.0, 300.0),
            ),
    );
    PageSnapshot::new("https://example.com/login", root)
}

struct Harness {
    page: Arc<SnapshotPage>,
    store: Arc<MemoryStore>,
    exports: Arc<Exports>,
    notifications: Arc<Notifications>,
    engine: CaptureEngine,
}

impl Harness {
    fn new() -> Self {
        let references = References::default().with(
            "applicant_credentials.json",
            json!({ "email": "a@b.com", "password": "hunter2" }),
        );
        Self::with_store(Arc::new(MemoryStore::new()), references)
    }

    fn with_store(store: Arc<MemoryStore>, references: References) -> Self {
        Self::on_tab("tab-1", store, references)
    }

    fn on_tab(tab_id: &str, store: Arc<MemoryStore>, references: References) -> Self {
        let page = Arc::new(SnapshotPage::new(login_page()));
        let exports = Arc::new(Exports::default());
        let notifications = Arc::new(Notifications::default());
        let engine = CaptureEngine::new(page.clone(), store.clone(), CaptureConfig::default())
            .with_references(Arc::new(references))
            .with_exports(exports.clone())
            .with_notifier(notifications.clone())
            .with_control(Arc::new(LocalCoordinator::new(tab_id, store.clone())));
        Self {
            page,
            store,
            exports,
            notifications,
            engine,
        }
    }

    async fn event(&mut self, event: PageEvent, now: u64) {
        self.engine.handle_event(event, now).await.unwrap();
    }

    async fn click(&mut self, target: [usize; 3], now: u64) {
        self.event(PageEvent::Click { path: login_path(&target) }, now).await;
    }

    async fn fill(&mut self, target: [usize; 3], value: &str, now: u64) {
        self.event(
            PageEvent::Change {
                path: login_path(&target),
                value: value.to_string(),
            },
            now,
        )
        .await;
    }

    async fn pages(&self) -> Vec<PageCapture> {
        let stored = self.store.dump().await;
        match stored.get("captured_pages") {
            Some(pages) => serde_json::from_value(pages.clone()).unwrap(),
            None => Vec::new(),
        }
    }
}

fn click(uid: usize) -> RecordedAction {
    RecordedAction::Click { id: Uid::new(uid) }
}

fn fill(uid: usize, token: &str) -> RecordedAction {
    RecordedAction::Fill {
        id: Uid::new(uid),
        value: token.to_string(),
    }
}

/// Path of `target` in the unmodified login page, as the page reports it when the event fires
fn login_path(target: &[usize]) -> StructuralPath {
    structural_path(&login_page().root, &NodeHandle::from(target.to_vec())).unwrap()
}

fn scroll_box_path() -> StructuralPath {
    login_path(&SCROLL_BOX)
}

#[tokio::test]
async fn test_signin_capture_exports_placeholders_and_document() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();
    assert_eq!(h.engine.state().await.unwrap(), SessionState::Capturing);
    assert!(h.page.is_listening().unwrap());
    assert!(h.page.controls_container().unwrap().is_some());

    h.fill(EMAIL, "a@b.com", 100).await;
    h.fill(PASSWORD, "hunter2", 200).await;
    h.click(SIGN_IN, 300).await;

    let report = h.engine.stop(400).await.unwrap().expect("capture was running");
    assert_eq!(report.pages, 1);
    assert!(report.capture_file.starts_with("instruction-"));
    assert_eq!(report.document_location.as_deref(), Some("memory://applicant_credentials.json"));

    let export = h.exports.capture();
    assert_eq!(export.pages.len(), 1);
    let page = &export.pages[0];
    assert_eq!(page.url, "https://example.com/login");
    assert_eq!(page.phase.as_deref(), Some("signin"));
    assert_eq!(page.actions, vec![click(2), fill(0, "$email"), fill(1, "$password")]);
    assert_eq!(page.interactables.len(), 5);
    assert_eq!(page.interactables[0].label.as_deref(), Some("Email"));

    let serialized = serde_json::to_string(&export).unwrap();
    assert!(!serialized.contains("hunter2"));

    let files = h.exports.files();
    let (_, document) = files
        .iter()
        .find(|(name, _)| name == "applicant_credentials.json")
        .expect("document exported");
    assert_eq!(document, &json!({ "email": "a@b.com", "password": "hunter2" }));

    assert_eq!(h.engine.state().await.unwrap(), SessionState::Idle);
    assert!(h.engine.local().is_none());
    assert!(!h.page.is_listening().unwrap());
    assert!(h.page.controls_container().unwrap().is_none());
    assert!(h.page.watched_scroll_targets().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_phase_infers_fields_and_skips_document() {
    let mut h = Harness::new();
    h.engine.start("bogus", 0).await.unwrap();
    assert!(h.notifications.contains("Unknown capture phase: \"bogus\"", Severity::Warning));

    h.fill(PASSWORD, "s3cret", 100).await;
    h.fill(UNLABELED, "42", 200).await;

    let report = h.engine.stop(300).await.unwrap().unwrap();
    assert_eq!(report.document_location, None);
    assert!(h.notifications.contains("Unknown capture phase. Skipping export.", Severity::Warning));

    let files = h.exports.files();
    assert_eq!(files.len(), 1);
    let export = h.exports.capture();
    assert_eq!(export.pages[0].actions, vec![fill(1, "$password"), fill(3, "$unknown_field")]);
}

#[tokio::test]
async fn test_missing_reference_still_captures() {
    let mut h = Harness::with_store(Arc::new(MemoryStore::new()), References::default());
    h.engine.start("search", 0).await.unwrap();
    assert!(h.notifications.any_with(Severity::Error));
    assert_eq!(h.engine.state().await.unwrap(), SessionState::Capturing);

    h.fill(EMAIL, "remote", 100).await;
    let report = h.engine.stop(200).await.unwrap().unwrap();

    assert_eq!(report.pages, 1);
    let files = h.exports.files();
    let (_, document) = files
        .iter()
        .find(|(name, _)| name == "applicant_preferences.json")
        .expect("document exported");
    assert_eq!(document, &json!({ "email": "remote" }));
}

#[tokio::test]
async fn test_repeated_fills_keep_last_value_after_other_actions() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.fill(PASSWORD, "hunter2", 100).await;
    h.click(SIGN_IN, 200).await;
    h.fill(EMAIL, "a@b.com", 300).await;
    h.fill(PASSWORD, "hunter2", 400).await;
    h.click(SIGN_IN, 500).await;

    assert_eq!(h.engine.local().unwrap().recorder.raw().len(), 5);
    assert!(h.engine.flush_pending(600).await.unwrap());

    let pages = h.pages().await;
    assert_eq!(
        pages[0].actions,
        vec![click(2), click(2), fill(1, "$password"), fill(0, "$email")]
    );
}

#[tokio::test]
async fn test_new_value_reuses_first_placeholder() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    // Not in the reference: named after the label
    h.fill(EMAIL, "other@b.com", 100).await;
    // Known value typed into an unrelated field keeps its reference placeholder
    h.fill(UNLABELED, "a@b.com", 200).await;
    h.engine.flush_pending(300).await.unwrap();

    let pages = h.pages().await;
    assert_eq!(pages[0].actions, vec![fill(0, "$email"), fill(3, "$email")]);

    let stored = h.store.dump().await;
    let map = stored.get("reverse_value_map").unwrap();
    assert!(map.get("other@b.com").is_some());
}

#[tokio::test]
async fn test_clicks_outside_interactables_are_dropped() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.click([0, 0, 0], 100).await; // label
    h.event(PageEvent::Click { path: StructuralPath::new("body > nav") }, 150).await;
    assert!(h.engine.local().unwrap().recorder.raw().is_empty());

    let report = h.engine.stop(200).await.unwrap().unwrap();
    assert_eq!(report.pages, 0);
    assert!(h.notifications.contains("Skipping page capture (no actions)", Severity::Info));
    assert!(h.exports.capture().pages.is_empty());
}

#[tokio::test]
async fn test_window_scroll_noise_and_debounce() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.event(PageEvent::WindowScroll { scroll_y: 5.0 }, 100).await;
    h.engine.tick(1100).await.unwrap();
    assert!(h.engine.local().unwrap().recorder.raw().is_empty());
    assert!(h.pages().await.is_empty());

    h.event(PageEvent::WindowScroll { scroll_y: 300.0 }, 1200).await;
    h.event(PageEvent::WindowScroll { scroll_y: 400.0 }, 1500).await;
    h.engine.tick(2000).await.unwrap();
    assert!(h.pages().await.is_empty());

    h.engine.tick(2500).await.unwrap();
    let pages = h.pages().await;
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0].actions,
        vec![RecordedAction::Scroll {
            id: "window".to_string(),
            delta_y: 400.0,
            scroll_to: 400.0,
            source: ScrollSource::Window,
        }]
    );
    assert!(h.engine.local().unwrap().scheduler.is_empty());
}

#[tokio::test]
async fn test_element_scroll_only_for_watched_containers() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();
    let path = scroll_box_path();
    assert_eq!(h.page.watched_scroll_targets().unwrap(), vec![path.clone()]);

    h.event(
        PageEvent::ElementScroll {
            path: StructuralPath::new("body > section"),
            scroll_top: 500.0,
        },
        100,
    )
    .await;
    assert!(h.engine.local().unwrap().scheduler.is_empty());

    h.event(PageEvent::ElementScroll { path, scroll_top: 150.0 }, 200).await;
    h.engine.tick(500).await.unwrap();

    let pages = h.pages().await;
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0].actions,
        vec![RecordedAction::Scroll {
            id: "el_4".to_string(),
            delta_y: 150.0,
            scroll_to: 150.0,
            source: ScrollSource::Element,
        }]
    );
}

#[tokio::test]
async fn test_mutations_wait_for_observer_and_settle() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();
    let first_serial = h.engine.generation().unwrap().serial();

    let mutation = |target: [usize; 2], now: u64| {
        (
            PageEvent::Mutation {
                target: target.to_vec().into(),
                kind: dom_capture::dom::MutationKind::ChildList,
            },
            now,
        )
    };

    let (event, now) = mutation([0, 0], 500);
    h.event(event, now).await;
    assert!(h.engine.local().unwrap().scheduler.is_empty());

    h.click(SIGN_IN, 1100).await;
    let (event, now) = mutation([0, 0], 1200);
    h.event(event, now).await;
    let (event, now) = mutation([0, 0], 1400);
    h.event(event, now).await;
    assert_eq!(h.engine.local().unwrap().scheduler.len(), 1);

    h.engine.tick(1800).await.unwrap();
    assert!(h.pages().await.is_empty());

    h.engine.tick(1900).await.unwrap();
    assert_eq!(h.pages().await.len(), 1);
    assert!(h.engine.generation().unwrap().serial() > first_serial);
    assert!(h.engine.local().unwrap().recorder.raw().is_empty());
}

#[tokio::test]
async fn test_toast_and_text_mutations_do_not_split_pages() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.event(
        PageEvent::Mutation {
            target: TOAST.to_vec().into(),
            kind: dom_capture::dom::MutationKind::ChildList,
        },
        2000,
    )
    .await;
    h.event(
        PageEvent::Mutation {
            target: vec![0, 0].into(),
            kind: dom_capture::dom::MutationKind::CharacterData,
        },
        2000,
    )
    .await;
    assert!(h.engine.local().unwrap().scheduler.is_empty());
}

#[tokio::test]
async fn test_submit_pushes_page_after_settle() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.fill(EMAIL, "a@b.com", 1100).await;
    h.event(PageEvent::Submit, 1200).await;
    h.engine.tick(1700).await.unwrap();

    let pages = h.pages().await;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].actions, vec![fill(0, "$email")]);
}

#[tokio::test]
async fn test_intervention_pauses_and_resumes() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.click(SIGN_IN, 100).await;
    h.event(PageEvent::InterveneRequested, 200).await;
    assert_eq!(h.engine.state().await.unwrap(), SessionState::Paused);

    let pages = h.pages().await;
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0].actions,
        vec![
            click(2),
            RecordedAction::Intervene {
                message: "manual intervention needed".to_string()
            }
        ]
    );

    // Ignored while paused
    h.click(SIGN_IN, 300).await;
    h.event(PageEvent::WindowScroll { scroll_y: 800.0 }, 300).await;
    assert!(h.engine.local().unwrap().recorder.raw().is_empty());
    assert!(h.engine.local().unwrap().scheduler.is_empty());

    h.event(PageEvent::ContinueRequested, 400).await;
    assert_eq!(h.engine.state().await.unwrap(), SessionState::Capturing);
    assert!(h.notifications.contains("Capture resumed", Severity::Success));

    // The resumed page has no fresh scan until the next boundary
    assert!(h.engine.local().unwrap().interactables.is_empty());
    h.engine.rescan().unwrap();
    h.click(SIGN_IN, 500).await;

    let report = h.engine.stop(600).await.unwrap().unwrap();
    assert_eq!(report.pages, 2);
}

#[tokio::test]
async fn test_restart_keeps_captured_pages() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();
    h.click(SIGN_IN, 100).await;
    h.engine.flush_pending(200).await.unwrap();
    h.click(SIGN_IN, 300).await;

    h.engine.start("search", 400).await.unwrap();
    assert!(h.notifications.contains("Capture resumes from where it was left", Severity::Info));
    assert!(h.engine.local().unwrap().recorder.raw().is_empty());

    let stored = h.store.dump().await;
    assert_eq!(stored.get("capture_phase"), Some(&json!("signin")));
    assert_eq!(h.pages().await.len(), 1);
}

#[tokio::test]
async fn test_stop_while_idle_is_noop() {
    let mut h = Harness::new();
    assert!(h.engine.stop(0).await.unwrap().is_none());
    assert!(h.exports.files().is_empty());

    h.click(SIGN_IN, 100).await;
    assert!(h.engine.local().is_none());
}

#[tokio::test]
async fn test_new_page_context_rebuilds_local_state() {
    let store = Arc::new(MemoryStore::new());
    let mut first = Harness::with_store(
        store.clone(),
        References::default().with("applicant_credentials.json", json!({ "email": "a@b.com" })),
    );
    first.engine.start("signin", 0).await.unwrap();
    first.fill(EMAIL, "a@b.com", 100).await;
    first.engine.flush_pending(200).await.unwrap();

    let mut second = Harness::on_tab("tab-2", store.clone(), References::default());
    assert!(second.engine.ensure_local_state(1000).await.unwrap());
    assert!(!second.engine.ensure_local_state(1000).await.unwrap());
    assert!(second.page.is_listening().unwrap());
    assert!(second.page.controls_container().unwrap().is_some());
    assert_eq!(second.engine.local().unwrap().interactables.len(), 5);

    let tabs = store.get(&["active_capture_tabs"]).await.unwrap();
    assert_eq!(tabs.get("active_capture_tabs"), Some(&json!(["tab-1", "tab-2"])));

    second.click(SIGN_IN, 1100).await;
    let report = second.engine.stop(1200).await.unwrap().unwrap();
    assert_eq!(report.pages, 2);

    let files = second.exports.files();
    let (_, document) = files
        .iter()
        .find(|(name, _)| name == "applicant_credentials.json")
        .expect("document exported");
    assert_eq!(document, &json!({ "email": "a@b.com" }));
}

#[tokio::test]
async fn test_capture_tab_registration() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    let tabs = h.store.get(&["active_capture_tabs"]).await.unwrap();
    assert_eq!(tabs.get("active_capture_tabs"), Some(&json!(["tab-1"])));

    // Refreshing does not register twice
    h.engine.start("signin", 100).await.unwrap();
    let tabs = h.store.get(&["active_capture_tabs"]).await.unwrap();
    assert_eq!(tabs.get("active_capture_tabs"), Some(&json!(["tab-1"])));

    h.engine.stop(200).await.unwrap();
    let stored = h.store.dump().await;
    assert_eq!(stored.get("active_capture_tabs"), Some(&json!([])));
    assert_eq!(stored.get("is_capturing"), Some(&json!(false)));
    assert_eq!(stored.get("capture_phase"), Some(&Value::Null));
}

#[tokio::test]
async fn test_click_keeps_its_target_when_the_page_changes_before_dispatch() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    // A paragraph lands at the top of the form after the click fired
    h.page
        .update(|snapshot| snapshot.root.children[0].children[0].children.insert(0, DomNode::new("p")))
        .unwrap();
    h.click(SIGN_IN, 100).await;
    h.fill(EMAIL, "a@b.com", 200).await;

    let raw = h.engine.local().unwrap().recorder.raw().to_vec();
    assert_eq!(raw, vec![click(2), fill(0, "$email")]);
}

#[tokio::test]
async fn test_stop_after_page_closed_exports_persisted_pages() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();
    h.fill(EMAIL, "a@b.com", 100).await;
    assert!(h.engine.flush_pending(200).await.unwrap());
    h.click(SIGN_IN, 300).await;

    h.page.close().unwrap();
    let report = h.engine.stop(400).await.unwrap().expect("capture was running");

    assert_eq!(report.pages, 1);
    assert!(h.notifications.contains("Final page could not be captured", Severity::Warning));
    assert_eq!(h.exports.capture().pages[0].actions, vec![fill(0, "$email")]);
    assert_eq!(report.document_location.as_deref(), Some("memory://applicant_credentials.json"));

    assert_eq!(h.engine.state().await.unwrap(), SessionState::Idle);
    assert!(h.engine.local().is_none());
    let stored = h.store.dump().await;
    assert_eq!(stored.get("is_capturing"), Some(&json!(false)));
}

#[tokio::test]
async fn test_stop_reports_structural_conflict_after_clearing_session() {
    let references = References::default().with(
        "applicant_credentials.json",
        json!({ "email": { "work": "a@b.com" } }),
    );
    let mut h = Harness::with_store(Arc::new(MemoryStore::new()), references);
    h.engine.start("signin", 0).await.unwrap();

    // A new value named after the "Email" label claims the path holding an object
    h.fill(EMAIL, "x@y.com", 100).await;

    let err = h.engine.stop(200).await.unwrap_err();
    assert!(matches!(err, CaptureError::StructuralConflict { ref path, .. } if path == "email"));

    let files = h.exports.files();
    assert_eq!(files.len(), 1);
    assert!(files[0].0.starts_with("instruction-"));
    assert_eq!(h.exports.capture().pages.len(), 1);

    assert_eq!(h.engine.state().await.unwrap(), SessionState::Idle);
    assert!(h.engine.local().is_none());
}

#[tokio::test]
async fn test_flush_without_interactables_keeps_recorded_actions() {
    let mut h = Harness::new();
    h.engine.start("signin", 0).await.unwrap();

    h.click(SIGN_IN, 100).await;
    h.event(PageEvent::InterveneRequested, 200).await;
    h.event(PageEvent::ContinueRequested, 300).await;
    assert_eq!(h.pages().await.len(), 1);

    // Resumed without a fresh scan: the click still resolves, but no page can be pushed
    h.click(SIGN_IN, 400).await;
    assert!(h.engine.local().unwrap().interactables.is_empty());
    assert!(!h.engine.flush_pending(500).await.unwrap());

    assert_eq!(h.pages().await.len(), 1);
    assert_eq!(h.engine.local().unwrap().recorder.raw(), &[click(2)][..]);
}
