//! Error types for the agentflow library.
//!
//! Workflows fail in two different ways:
//!
//! * [`WorkflowError`]: **fatal**, the run cannot continue (a generation call
//!   failed, a credential is missing, a checkpoint is unknown). Returned as
//!   `Err(WorkflowError)` from every workflow entry point.
//!
//! * Boundary degradation: document open, transcript fetch, web search and
//!   similar steps swallow their failure, fall back to an empty or placeholder
//!   value and leave a human-readable notice in the workflow state. Those never
//!   surface here.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the agentflow library.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string is not usable for this workflow.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The document could not be opened or parsed.
    ///
    /// Extraction boundaries convert this into a notice and an empty result;
    /// it is never returned from a workflow entry point.
    #[error("PDF extraction failed for '{path}': {detail}")]
    DocumentUnreadable { path: PathBuf, detail: String },

    /// The uploaded image could not be decoded or re-encoded.
    #[error("Image processing failed: {detail}")]
    ImageFailed { detail: String },

    // ── Credential errors ─────────────────────────────────────────────────
    /// A credential required by the selected workflow is absent.
    #[error("Missing credential {var}.\nSet it in the environment before starting {workflow}.")]
    MissingCredential {
        var: &'static str,
        workflow: &'static str,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The text-generation collaborator failed.
    #[error("LLM generation failed: {message}")]
    Generation { message: String },

    /// The provider reported an exhausted quota / rate limit.
    ///
    /// This is the only class retried by [`crate::retry::retry_on_quota`].
    #[error("LLM quota exhausted: {message}")]
    QuotaExhausted { message: String },

    /// Text recognition failed for one extracted image.
    #[error("Text recognition failed for page {page}: {detail}")]
    Recognition { page: usize, detail: String },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The web-search collaborator failed.
    #[error("Web search failed for '{query}': {detail}")]
    Search { query: String, detail: String },

    /// The transcript collaborator failed.
    #[error("Transcript unavailable for video '{video_id}': {detail}")]
    Transcript { video_id: String, detail: String },

    /// A browser-automation call failed.
    #[error("Browser step '{step}' failed: {detail}")]
    Browser { step: &'static str, detail: String },

    // ── Checkpoint errors ─────────────────────────────────────────────────
    /// No checkpoint exists for the given session id.
    #[error("No paused session '{session_id}'")]
    SessionNotFound { session_id: String },

    /// A checkpoint exists but resumes at a different step than requested.
    #[error("Session '{session_id}' is paused at '{found}', cannot resume at '{expected}'")]
    WrongResumePoint {
        session_id: String,
        expected: String,
        found: String,
    },

    /// Checkpoint storage failed.
    #[error("Checkpoint store error for '{session_id}': {detail}")]
    Checkpoint { session_id: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Whether a retry of the same call could plausibly succeed.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, WorkflowError::QuotaExhausted { .. })
    }
}
