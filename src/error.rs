use thiserror::Error;

/// Errors raised by the capture engine and its collaborators
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Phase name outside the recognized set
    #[error("Unknown capture phase: \"{0}\"")]
    UnknownPhase(String),

    /// Reference document could not be read or parsed
    #[error("Failed to load {file}: {reason}")]
    ReferenceLoad { file: String, reason: String },

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// A flat path expects a container where a scalar lives, or the reverse
    #[error("Structural conflict at '{path}': {reason}")]
    StructuralConflict { path: String, reason: String },

    /// The live page could not be inspected or modified
    #[error("Page access failed: {0}")]
    PageAccess(String),

    /// Control message to the coordinator failed
    #[error("Control message failed: {0}")]
    Control(String),

    /// An export file could not be written
    #[error("Failed to export {file}: {reason}")]
    Export { file: String, reason: String },

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Injected page script failed or returned an unexpected value
    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CaptureError>;
