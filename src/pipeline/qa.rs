//! Follow-up questions over an analyzed document.

use crate::collab::{GenerationRequest, TextGenerator};
use crate::config::ModelSettings;
use crate::error::WorkflowError;
use crate::pipeline::reason::{ocr_blob, text_blob};
use crate::prompts::document_question_prompt;
use crate::record::PipelineRecord;
use serde::{Deserialize, Serialize};

/// The text a follow-up question is answered against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext(String);

impl DocumentContext {
    pub fn from_record(record: &PipelineRecord) -> Self {
        Self(format!(
            "Text: {}\nOCR: {}",
            text_blob(&record.pages),
            ocr_blob(&record.ocr_results)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One question and its answer, in asking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// Answer one question about the document. Generation failures propagate.
pub async fn answer_question(
    generator: &dyn TextGenerator,
    settings: &ModelSettings,
    context: &DocumentContext,
    question: &str,
) -> Result<ChatTurn, WorkflowError> {
    let prompt = document_question_prompt(context.as_str(), question);
    let answer = generator
        .generate(&GenerationRequest::new(prompt, settings))
        .await?;
    Ok(ChatTurn {
        question: question.to_string(),
        answer,
    })
}
