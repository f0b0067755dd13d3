//! The non-document workflows.
//!
//! Each workflow owns a serialisable state struct that starts empty, is
//! filled one step at a time and is returned when the last step finishes.
//! Collaborators are injected as trait objects; the `from_config`
//! constructors wire up the production adapters.
//!
//! | Workflow   | Steps                                              |
//! |------------|----------------------------------------------------|
//! | summarize  | extract → summarize                                |
//! | blog       | research → write → feedback                        |
//! | image      | prepare → describe                                 |
//! | campaign   | ideas → research → draft → synthesize              |
//! | shopping   | search → cart → payment → track                    |
//! | analysts   | create → (pause for feedback) → create … → finish  |
//! | youtube    | video id → transcript → generate (quota retry)     |

pub mod analysts;
pub mod blog;
pub mod campaign;
pub mod image;
pub mod shopping;
pub mod summarize;
pub mod youtube;

use crate::collab::SearchHit;
use crate::error::WorkflowError;
use crate::progress::Progress;
use std::future::Future;
use std::time::Instant;

/// Run one step between progress events. `on_step_complete` only fires on
/// success.
pub(crate) async fn run_step<T, Fut>(
    progress: &Progress<'_>,
    step: &str,
    fut: Fut,
) -> Result<T, WorkflowError>
where
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let started = Instant::now();
    progress.step_start(step);
    let out = fut.await?;
    progress.step_complete(step, started);
    Ok(out)
}

/// Non-empty result bodies joined by newlines, or `fallback`.
pub(crate) fn join_snippets(hits: &[SearchHit], fallback: &str) -> String {
    let joined = hits
        .iter()
        .map(|h| h.body.as_str())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        fallback.to_string()
    } else {
        joined
    }
}
