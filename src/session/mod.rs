//! Capture session management
//!
//! - state: persisted flags, captured pages and export document
//! - store: async key/value store the session state lives in
//! - local: in-memory context of the page being captured
//! - engine: the capture state machine (start, stop, pause, resume, events)

pub mod engine;
pub mod local;
pub mod state;
pub mod store;

pub use engine::{CaptureEngine, StopReport};
pub use local::LocalState;
pub use state::{CaptureExport, PageCapture, SessionFlags, SessionState};
pub use store::{JsonFileStore, MemoryStore, StateStore, get_with_retry};
