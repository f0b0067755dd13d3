//! Routing between extraction and reasoning.

use crate::record::PipelineRecord;

/// Next step after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// At least one image was extracted; transcribe before reasoning.
    NeedsOcr,
    /// Nothing to transcribe.
    SkipToReasoning,
}

/// Pure function of the record's image sequence.
pub fn route(record: &PipelineRecord) -> Route {
    if record.images.is_empty() {
        Route::SkipToReasoning
    } else {
        Route::NeedsOcr
    }
}
