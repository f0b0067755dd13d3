//! Reasoning over extracted text and OCR output.

use crate::collab::{GenerationRequest, TextGenerator};
use crate::config::ModelSettings;
use crate::error::WorkflowError;
use crate::prompts::{document_analysis_prompt, NO_OCR_PLACEHOLDER, NO_TEXT_PLACEHOLDER};
use crate::record::{OcrText, PageText};
use tracing::debug;

/// Page texts joined by single spaces, or the placeholder when there is
/// nothing to join. Empty pages contribute nothing.
pub fn text_blob(pages: &[PageText]) -> String {
    join_or(pages.iter().map(|p| p.text.as_str()), NO_TEXT_PLACEHOLDER)
}

/// OCR texts joined by single spaces, or the placeholder.
pub fn ocr_blob(ocr: &[OcrText]) -> String {
    join_or(ocr.iter().map(|o| o.recognized_text.as_str()), NO_OCR_PLACEHOLDER)
}

fn join_or<'a>(parts: impl Iterator<Item = &'a str>, placeholder: &str) -> String {
    let joined = parts
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        placeholder.to_string()
    } else {
        joined
    }
}

/// Split a model reply on `\n` boundaries, keeping blank lines.
pub fn split_lines(reply: &str) -> Vec<String> {
    reply.split('\n').map(str::to_string).collect()
}

/// Ask the model the fixed three analysis questions about the document.
///
/// No retry, no timeout and no validation of the reply: any failure from
/// the generator propagates.
pub async fn reason(
    generator: &dyn TextGenerator,
    settings: &ModelSettings,
    pages: &[PageText],
    ocr: &[OcrText],
) -> Result<Vec<String>, WorkflowError> {
    let text = text_blob(pages);
    let ocr = ocr_blob(ocr);
    debug!("Reasoning over {} text chars, {} OCR chars", text.len(), ocr.len());

    let prompt = document_analysis_prompt(&text, &ocr);
    let reply = generator
        .generate(&GenerationRequest::new(prompt, settings))
        .await?;
    Ok(split_lines(&reply))
}
