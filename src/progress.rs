//! Progress-callback trait for per-step workflow events.
//!
//! Inject an [`Arc<dyn StepProgressCallback>`] via
//! [`crate::config::WorkflowConfigBuilder::progress_callback`] to receive
//! events as a workflow enters and leaves each step. The CLI forwards them
//! to a terminal spinner; tests count them.
//!
//! # Example
//!
//! ```rust
//! use agentflow::{StepProgressCallback, WorkflowConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl StepProgressCallback for CountingCallback {
//!     fn on_step_complete(&self, step: &str, elapsed_ms: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{step} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = WorkflowConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by a workflow as it runs each step.
///
/// Steps never run concurrently, but the callback is shared behind an `Arc`
/// and may be moved into spawned tasks, hence `Send + Sync`. All methods
/// have default no-op implementations.
pub trait StepProgressCallback: Send + Sync {
    /// Called once before the first step.
    fn on_workflow_start(&self, workflow: &str) {
        let _ = workflow;
    }

    /// Called just before a step starts.
    fn on_step_start(&self, step: &str) {
        let _ = step;
    }

    /// Called when a step finished and its update was merged.
    fn on_step_complete(&self, step: &str, elapsed_ms: u64) {
        let _ = (step, elapsed_ms);
    }

    /// Called when a conditional step is bypassed.
    fn on_step_skipped(&self, step: &str) {
        let _ = step;
    }

    /// Called when a boundary step degraded and left a user-visible notice.
    fn on_notice(&self, message: &str) {
        let _ = message;
    }

    /// Called once after the terminal step.
    fn on_workflow_complete(&self, workflow: &str) {
        let _ = workflow;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl StepProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WorkflowConfig`].
pub type ProgressCallback = Arc<dyn StepProgressCallback>;

/// Small helper that forwards to an optional callback.
pub(crate) struct Progress<'a>(pub(crate) Option<&'a ProgressCallback>);

impl Progress<'_> {
    pub(crate) fn workflow_start(&self, workflow: &str) {
        if let Some(cb) = self.0 {
            cb.on_workflow_start(workflow);
        }
    }

    pub(crate) fn step_start(&self, step: &str) {
        if let Some(cb) = self.0 {
            cb.on_step_start(step);
        }
    }

    pub(crate) fn step_complete(&self, step: &str, started: std::time::Instant) {
        if let Some(cb) = self.0 {
            cb.on_step_complete(step, started.elapsed().as_millis() as u64);
        }
    }

    pub(crate) fn step_skipped(&self, step: &str) {
        if let Some(cb) = self.0 {
            cb.on_step_skipped(step);
        }
    }

    pub(crate) fn notice(&self, message: &str) {
        if let Some(cb) = self.0 {
            cb.on_notice(message);
        }
    }

    pub(crate) fn workflow_complete(&self, workflow: &str) {
        if let Some(cb) = self.0 {
            cb.on_workflow_complete(workflow);
        }
    }
}
