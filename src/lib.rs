//! # agentflow
//!
//! Small LLM agent workflows as typed, testable Rust: document
//! understanding, summaries, blog posts, animal photos, marketing
//! campaigns, a browser shopping agent, analyst personas with human
//! feedback, and YouTube notes.
//!
//! ## Document pipeline
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file, URL download or upload
//!  ├─ 2. Extract  per-page text + embedded images via pdfium (spawn_blocking)
//!  ├─ 3. Route    images present? → OCR, else straight to reasoning
//!  ├─ 4. OCR      vision model transcribes each image
//!  └─ 5. Reason   fixed three-question analysis → answer lines
//! ```
//!
//! Every step is awaited in order against collaborators hidden behind the
//! traits in [`collab`], so tests swap in fakes without touching the
//! network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentflow::{analyze_document, WorkflowConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / GEMINI_API_KEY / ...
//!     let config = WorkflowConfig::default();
//!     let record = analyze_document("invoice.pdf", &config).await?;
//!     for line in &record.answer_lines {
//!         println!("{line}");
//!     }
//!     for notice in &record.notices {
//!         eprintln!("warning: {notice}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `agentflow` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! agentflow = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod collab;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod retry;
pub mod workflows;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Credential, Credentials, ModelSettings, WorkflowConfig, WorkflowConfigBuilder};
pub use error::WorkflowError;
pub use pipeline::driver::{analyze_bytes, analyze_document, DocumentPipeline};
pub use pipeline::extract::{ContentExtractor, ExtractedContent, PdfiumExtractor};
pub use pipeline::qa::{answer_question, ChatTurn, DocumentContext};
pub use pipeline::router::{route, Route};
pub use progress::{NoopProgressCallback, ProgressCallback, StepProgressCallback};
pub use record::{OcrText, PageImage, PageText, PipelineRecord, RecordUpdate};
pub use retry::{retry_on_quota, PollPolicy, RetryPolicy};
