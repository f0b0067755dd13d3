//! Summarizer: extract → summarize.

use crate::collab::llm::LlmGenerator;
use crate::collab::{GenerationRequest, TextGenerator};
use crate::config::{ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::pipeline::extract::{ContentExtractor, PdfiumExtractor};
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::{summarize_prompt, NO_TEXT_EXTRACTED, NO_TEXT_TO_SUMMARIZE};
use crate::workflows::run_step;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const WORKFLOW: &str = "summarize";

/// What to summarize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryInput {
    Document(PathBuf),
    Text(String),
}

impl SummaryInput {
    /// Inputs ending in `.pdf` are documents; anything else is raw text.
    pub fn parse(input: &str) -> Self {
        if input.to_ascii_lowercase().ends_with(".pdf") {
            SummaryInput::Document(PathBuf::from(input))
        } else {
            SummaryInput::Text(input.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryState {
    pub input: SummaryInput,
    /// One chunk per page for documents, a single chunk for raw text.
    pub chunks: Vec<String>,
    pub summary: String,
    pub notices: Vec<String>,
}

pub struct Summarizer {
    extractor: Arc<dyn ContentExtractor>,
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
    progress: Option<ProgressCallback>,
}

impl Summarizer {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        generator: Arc<dyn TextGenerator>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            extractor,
            generator,
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        Ok(Self::new(
            Arc::new(PdfiumExtractor::new(config).text_only()),
            Arc::new(LlmGenerator::from_settings(&config.summarizer)?),
            config.summarizer.clone(),
        )
        .with_progress(config.progress_callback.clone()))
    }

    pub async fn run(&self, input: SummaryInput) -> Result<SummaryState, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);
        let mut state = SummaryState {
            input,
            chunks: Vec::new(),
            summary: String::new(),
            notices: Vec::new(),
        };

        let (chunks, notice) = run_step(&progress, "extract", async {
            Ok(self.extract(&state.input).await)
        })
        .await?;
        state.chunks = chunks;
        if let Some(notice) = notice {
            progress.notice(&notice);
            state.notices.push(notice);
        }

        state.summary = run_step(&progress, "summarize", self.summarize(&state.chunks)).await?;

        info!(
            "Summary: {} chars from {} chunks",
            state.summary.len(),
            state.chunks.len()
        );
        progress.workflow_complete(WORKFLOW);
        Ok(state)
    }

    async fn extract(&self, input: &SummaryInput) -> (Vec<String>, Option<String>) {
        match input {
            SummaryInput::Text(text) => (vec![text.clone()], None),
            SummaryInput::Document(path) => {
                let content = self.extractor.extract(path).await;
                match content.failure {
                    Some(reason) => {
                        warn!("Summarizer extraction failed: {}", reason);
                        (
                            vec![NO_TEXT_EXTRACTED.to_string()],
                            Some(format!("Extraction failed: {reason}")),
                        )
                    }
                    None => (content.pages.into_iter().map(|p| p.text).collect(), None),
                }
            }
        }
    }

    async fn summarize(&self, chunks: &[String]) -> Result<String, WorkflowError> {
        let text = chunks
            .iter()
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let text = if text.is_empty() {
            NO_TEXT_TO_SUMMARIZE.to_string()
        } else {
            text
        };
        let reply = self
            .generator
            .generate(&GenerationRequest::new(summarize_prompt(&text), &self.settings))
            .await?;
        Ok(reply.trim().to_string())
    }
}
