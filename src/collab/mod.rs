//! Collaborator seams: every external system a workflow talks to.
//!
//! Workflows depend only on the traits below. Each submodule provides the
//! production adapter for one family of collaborators:
//!
//! ```text
//! llm         ──▶ TextGenerator, VisionModel, TextRecognizer   (edgequake-llm)
//! search      ──▶ WebSearch                                     (reqwest + scraper: DuckDuckGo HTML, Tavily)
//! transcript  ──▶ TranscriptSource                              (reqwest + roxmltree: YouTube timedtext)
//! browser     ──▶ Storefront, PaymentConfirmation               (chromiumoxide, stdin)
//! checkpoint  ──▶ CheckpointStore                               (memory, JSON files)
//! ```
//!
//! Tests substitute in-process fakes for all of them.

pub mod browser;
pub mod checkpoint;
pub mod llm;
pub mod search;
pub mod transcript;

use crate::config::ModelSettings;
use crate::error::WorkflowError;
use async_trait::async_trait;
use edgequake_llm::ImageData;
use serde::{Deserialize, Serialize};

pub use checkpoint::{
    new_session_id, Checkpoint, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
};

// ── Text generation ──────────────────────────────────────────────────────

/// One text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Optional system message sent before the prompt.
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl GenerationRequest {
    /// A request carrying the sampling settings of `settings`.
    pub fn new(prompt: impl Into<String>, settings: &ModelSettings) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Synchronous-looking chat completion: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, WorkflowError>;
}

// ── Vision ───────────────────────────────────────────────────────────────

/// Prompt plus one base64 image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    pub image: ImageData,
    pub temperature: Option<f32>,
}

/// Multimodal completion over a single image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn describe(&self, request: &VisionRequest) -> Result<String, WorkflowError>;
}

/// Image-to-text recognition (OCR). Input is an encoded image (PNG/JPEG).
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, WorkflowError>;
}

// ── Web search ───────────────────────────────────────────────────────────

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub body: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WorkflowError>;
}

// ── Transcripts ──────────────────────────────────────────────────────────

/// One caption line of a video transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, WorkflowError>;
}

// ── Storefront ───────────────────────────────────────────────────────────

/// What the order-history page currently says about the latest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Shipped { tracking_url: Option<String> },
    Delivered,
    NotShipped,
}

/// Sequential page interactions against a live shop session.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// Open the product page and click its add-to-cart control.
    async fn add_to_cart(&self, product_url: &str) -> Result<(), WorkflowError>;

    /// Navigate to the cart so a human can check out.
    async fn open_cart(&self) -> Result<(), WorkflowError>;

    /// Navigate to the order history.
    async fn open_order_history(&self) -> Result<(), WorkflowError>;

    /// Read the status of the most recent order on the current page.
    async fn order_state(&self) -> Result<OrderState, WorkflowError>;

    /// Reload the current page.
    async fn refresh(&self) -> Result<(), WorkflowError>;
}

/// Blocks until a human reports that payment is complete.
#[async_trait]
pub trait PaymentConfirmation: Send + Sync {
    async fn wait_for_payment(&self) -> bool;
}
