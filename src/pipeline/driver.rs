//! The document-understanding driver: extract, route, optionally OCR,
//! reason.
//!
//! ```text
//! extract ──▶ route ──┬── NeedsOcr ────────▶ ocr ──▶ reason ──▶ record
//!                     └── SkipToReasoning ─────────▶ reason ──▶ record
//! ```
//!
//! There is exactly one decision point. Each step reads the record, returns
//! a [`RecordUpdate`] and the driver merges it before the next step starts.

use crate::collab::llm::{LlmGenerator, VisionRecognizer};
use crate::collab::{TextGenerator, TextRecognizer};
use crate::config::{ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::pipeline::extract::{ContentExtractor, PdfiumExtractor};
use crate::pipeline::input;
use crate::pipeline::ocr::transcribe;
use crate::pipeline::reason::reason;
use crate::pipeline::router::{route, Route};
use crate::progress::{Progress, ProgressCallback};
use crate::record::{PipelineRecord, RecordUpdate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const WORKFLOW: &str = "document";
pub const STEP_EXTRACT: &str = "extract";
pub const STEP_OCR: &str = "ocr";
pub const STEP_REASON: &str = "reason";

/// Wired-up document pipeline.
///
/// Build it with [`DocumentPipeline::new`] to inject collaborators (tests do
/// this with fakes) or with [`DocumentPipeline::from_config`] for the
/// pdfium + LLM production adapters.
pub struct DocumentPipeline {
    extractor: Arc<dyn ContentExtractor>,
    recognizer: Arc<dyn TextRecognizer>,
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
    progress: Option<ProgressCallback>,
}

impl DocumentPipeline {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        recognizer: Arc<dyn TextRecognizer>,
        generator: Arc<dyn TextGenerator>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            generator,
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Production adapters: pdfium extraction, vision OCR, chat reasoning.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let extractor = Arc::new(PdfiumExtractor::new(config));
        let recognizer = Arc::new(VisionRecognizer::from_settings(&config.ocr)?);
        let generator = Arc::new(LlmGenerator::from_settings(&config.document)?);
        Ok(Self::new(extractor, recognizer, generator, config.document.clone())
            .with_progress(config.progress_callback.clone()))
    }

    /// Run every step against `source` and return the filled record.
    pub async fn run(&self, source: impl Into<PathBuf>) -> Result<PipelineRecord, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        let mut record = PipelineRecord::new(source);
        info!("Analyzing document: {}", record.source.display());
        progress.workflow_start(WORKFLOW);

        let started = Instant::now();
        progress.step_start(STEP_EXTRACT);
        let update = self.extract(&record).await;
        for notice in &update.notices {
            progress.notice(notice);
        }
        record.apply(update);
        progress.step_complete(STEP_EXTRACT, started);

        match route(&record) {
            Route::NeedsOcr => {
                let started = Instant::now();
                progress.step_start(STEP_OCR);
                let update = self.ocr(&record).await?;
                record.apply(update);
                progress.step_complete(STEP_OCR, started);
            }
            Route::SkipToReasoning => {
                info!("No images extracted, skipping OCR");
                progress.step_skipped(STEP_OCR);
            }
        }

        let started = Instant::now();
        progress.step_start(STEP_REASON);
        let update = self.reason(&record).await?;
        record.apply(update);
        progress.step_complete(STEP_REASON, started);

        info!(
            "Document analysis complete: {} pages, {} images, {} answer lines",
            record.pages.len(),
            record.images.len(),
            record.answer_lines.len()
        );
        progress.workflow_complete(WORKFLOW);
        Ok(record)
    }

    async fn extract(&self, record: &PipelineRecord) -> RecordUpdate {
        let content = self.extractor.extract(&record.source).await;
        let mut notices = Vec::new();
        if let Some(reason) = content.failure {
            warn!("Extraction degraded to empty result: {}", reason);
            notices.push(format!("Error extracting PDF: {reason}"));
        }
        RecordUpdate {
            pages: Some(content.pages),
            images: Some(content.images),
            notices,
            ..RecordUpdate::default()
        }
    }

    async fn ocr(&self, record: &PipelineRecord) -> Result<RecordUpdate, WorkflowError> {
        let ocr_results = transcribe(self.recognizer.as_ref(), &record.images).await?;
        Ok(RecordUpdate {
            ocr_results: Some(ocr_results),
            ..RecordUpdate::default()
        })
    }

    async fn reason(&self, record: &PipelineRecord) -> Result<RecordUpdate, WorkflowError> {
        let lines = reason(
            self.generator.as_ref(),
            &self.settings,
            &record.pages,
            &record.ocr_results,
        )
        .await?;
        Ok(RecordUpdate {
            answer_lines: Some(lines),
            ..RecordUpdate::default()
        })
    }
}

/// Analyze a local path or HTTP(S) URL with the production adapters.
///
/// Downloaded documents live in a temp directory that is removed when this
/// returns.
pub async fn analyze_document(
    input_str: impl AsRef<str>,
    config: &WorkflowConfig,
) -> Result<PipelineRecord, WorkflowError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let pipeline = DocumentPipeline::from_config(config)?;
    pipeline.run(resolved.path()).await
}

/// Analyze an in-memory document, e.g. an upload.
pub async fn analyze_bytes(
    bytes: &[u8],
    config: &WorkflowConfig,
) -> Result<PipelineRecord, WorkflowError> {
    let resolved = input::ResolvedInput::from_bytes(bytes, ".pdf")?;
    let pipeline = DocumentPipeline::from_config(config)?;
    pipeline.run(resolved.path()).await
}
