//! # dom-capture
//!
//! Records a user's interactions with a web page as a per-page, placeholder-normalized
//! instruction log and rebuilds the data document the typed values came from.
//!
//! ## Features
//!
//! - **Placeholder normalization**: Values typed into the page are replaced by `$path`
//!   placeholders taken from the phase's reference document
//! - **Element identity**: Visible interactables get short-lived `el_<n>` uids backed by
//!   sibling-indexed structural paths
//! - **Page segmentation**: DOM mutations, form submits and scrolls split the capture into
//!   discrete page records
//! - **Document reconstruction**: On stop, the placeholder map is turned back into a nested
//!   document shaped like the reference
//!
//! ## Running a Capture
//!
//! ```bash
//! # Capture a sign-in flow in a visible browser, Ctrl-C to stop and export
//! cargo run --bin dom-capture -- --url https://example.com/login --phase signin --headed
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use dom_capture::{CaptureConfig, CaptureEngine, MemoryStore, PageEvent, SnapshotPage, StructuralPath};
//! use dom_capture::dom::{DomNode, PageSnapshot};
//! use std::sync::Arc;
//!
//! # async fn run() -> dom_capture::Result<()> {
//! let root = DomNode::new("html").with_child(
//!     DomNode::new("body").with_child(DomNode::new("input").with_bounding_box(0.0, 0.0, 200.0, 20.0)),
//! );
//! let page = Arc::new(SnapshotPage::new(PageSnapshot::new("https://example.com/login", root)));
//! let mut engine = CaptureEngine::new(page, Arc::new(MemoryStore::new()), CaptureConfig::default());
//!
//! engine.start("signin", 0).await?;
//! engine
//!     .handle_event(PageEvent::Change { path: StructuralPath::new("body > input"), value: "a@b.com".to_string() }, 10)
//!     .await?;
//! let report = engine.stop(20).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`session`]: Capture state machine and persisted session state - **Start here**
//! - [`document`]: Flattening, reverse value map and document reconstruction
//! - [`dom`]: Page model, structural paths, scanning and uid assignment
//! - [`recorder`]: Action log, fill de-duplication and scroll capture
//! - [`scheduler`]: Coalescing debounce queue
//! - [`host`]: Notifications, coordinator channel, reference inputs and export outputs
//! - [`browser`]: Chrome binding
//! - [`config`], [`phase`], [`error`]: Tunables, capture phases and error types

pub mod browser;
pub mod config;
pub mod document;
pub mod dom;
pub mod error;
pub mod host;
pub mod phase;
pub mod recorder;
pub mod scheduler;
pub mod session;

pub use browser::{BrowserSession, CdpPage, ConnectionOptions, LaunchOptions};
pub use config::CaptureConfig;
pub use document::{PlaceholderToken, ReverseValueMap, flatten, reconstruct_document, unflatten};
pub use dom::{Page, PageEvent, ScanGeneration, SnapshotPage, StructuralPath, Uid, scan_page};
pub use error::{CaptureError, Result};
pub use host::{ExportSink, Notifier, ReferenceSource, Severity};
pub use phase::Phase;
pub use recorder::{ActionRecorder, RecordedAction, dedup_actions};
pub use session::{CaptureEngine, JsonFileStore, MemoryStore, PageCapture, SessionState, StateStore, StopReport};
