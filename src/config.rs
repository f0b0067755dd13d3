//! Configuration types for every workflow.
//!
//! All behaviour is controlled through [`WorkflowConfig`], built via its
//! [`WorkflowConfigBuilder`] once at process start and passed by reference
//! into each workflow and collaborator adapter. Credentials are read from the
//! environment exactly once into [`Credentials`]; no step reads ambient
//! process state afterwards.

use crate::error::WorkflowError;
use crate::progress::ProgressCallback;
use crate::retry::{PollPolicy, RetryPolicy};
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model choice and sampling settings for one workflow.
///
/// Every field is optional: a `None` provider name falls back to the
/// environment auto-detection chain in [`crate::collab::llm::resolve_provider`],
/// a `None` temperature leaves the provider default in place.
#[derive(Clone, Default)]
pub struct ModelSettings {
    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    pub provider_name: Option<String>,

    /// Model identifier, e.g. "gpt-4o-mini". If None, uses provider default.
    pub model: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Maximum generated tokens per call.
    pub max_tokens: Option<usize>,
}

impl ModelSettings {
    /// Settings with a fixed temperature and everything else auto-detected.
    pub fn with_temperature(temperature: f32) -> Self {
        Self::default().temperature(temperature)
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = Some(n);
        self
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Configuration shared by all workflows.
///
/// Built via [`WorkflowConfig::builder()`] or using [`WorkflowConfig::default()`].
///
/// # Example
/// ```rust
/// use agentflow::{ModelSettings, WorkflowConfig};
///
/// let config = WorkflowConfig::builder()
///     .document(ModelSettings::with_temperature(0.2).model("gpt-4o-mini"))
///     .blog_search_results(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Reasoner settings for the document pipeline. Default temperature: 0.2.
    pub document: ModelSettings,

    /// Vision model used as the OCR engine. Default temperature: 0.0.
    ///
    /// Transcription must be faithful to the pixels, so sampling stays greedy.
    pub ocr: ModelSettings,

    /// Follow-up question answering over a processed document. Default: 0.2.
    pub chat: ModelSettings,

    /// Summarizer. Default temperature: 0.2.
    pub summarizer: ModelSettings,

    /// Blog writer and refiner. Default temperature: 0.7.
    pub blog: ModelSettings,

    /// Image description. Provider default temperature.
    pub vision: ModelSettings,

    /// Campaign ideas, draft and synthesis. Default temperature: 0.0.
    pub campaign: ModelSettings,

    /// Analyst persona generation. Provider default temperature.
    pub analysts: ModelSettings,

    /// YouTube transcript summary. Provider default temperature.
    pub youtube: ModelSettings,

    /// Quota-scoped retry used by the YouTube generation call.
    pub retry: RetryPolicy,

    /// Shipping-status polling policy.
    pub poll: PollPolicy,

    /// Search results requested by the blog researcher. Default: 3.
    pub blog_search_results: usize,

    /// Search results requested by the campaign researcher. Default: 3.
    pub campaign_search_results: usize,

    /// Search results scanned for a product page. Default: 10.
    pub shopping_search_results: usize,

    /// Transcript characters kept before summarising. Default: 10 000.
    pub transcript_char_limit: usize,

    /// Side length of the square image sent to the vision model. Default: 200.
    pub vision_image_side: u32,

    /// Explicit pdfium library to bind. Falls back to the working directory
    /// and then the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional step-progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            document: ModelSettings::with_temperature(0.2),
            ocr: ModelSettings::with_temperature(0.0),
            chat: ModelSettings::with_temperature(0.2),
            summarizer: ModelSettings::with_temperature(0.2),
            blog: ModelSettings::with_temperature(0.7),
            vision: ModelSettings::default(),
            campaign: ModelSettings::with_temperature(0.0),
            analysts: ModelSettings::default(),
            youtube: ModelSettings::default(),
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            blog_search_results: 3,
            campaign_search_results: 3,
            shopping_search_results: 10,
            transcript_char_limit: 10_000,
            vision_image_side: 200,
            pdfium_lib_path: None,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("document", &self.document)
            .field("ocr", &self.ocr)
            .field("chat", &self.chat)
            .field("summarizer", &self.summarizer)
            .field("blog", &self.blog)
            .field("vision", &self.vision)
            .field("campaign", &self.campaign)
            .field("analysts", &self.analysts)
            .field("youtube", &self.youtube)
            .field("retry", &self.retry)
            .field("poll", &self.poll)
            .field("transcript_char_limit", &self.transcript_char_limit)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn StepProgressCallback>"),
            )
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn document(mut self, settings: ModelSettings) -> Self {
        self.config.document = settings;
        self
    }

    pub fn ocr(mut self, settings: ModelSettings) -> Self {
        self.config.ocr = settings;
        self
    }

    pub fn chat(mut self, settings: ModelSettings) -> Self {
        self.config.chat = settings;
        self
    }

    pub fn summarizer(mut self, settings: ModelSettings) -> Self {
        self.config.summarizer = settings;
        self
    }

    pub fn blog(mut self, settings: ModelSettings) -> Self {
        self.config.blog = settings;
        self
    }

    pub fn vision(mut self, settings: ModelSettings) -> Self {
        self.config.vision = settings;
        self
    }

    pub fn campaign(mut self, settings: ModelSettings) -> Self {
        self.config.campaign = settings;
        self
    }

    pub fn analysts(mut self, settings: ModelSettings) -> Self {
        self.config.analysts = settings;
        self
    }

    pub fn youtube(mut self, settings: ModelSettings) -> Self {
        self.config.youtube = settings;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn poll(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    pub fn blog_search_results(mut self, n: usize) -> Self {
        self.config.blog_search_results = n;
        self
    }

    pub fn campaign_search_results(mut self, n: usize) -> Self {
        self.config.campaign_search_results = n;
        self
    }

    pub fn shopping_search_results(mut self, n: usize) -> Self {
        self.config.shopping_search_results = n;
        self
    }

    pub fn transcript_char_limit(mut self, n: usize) -> Self {
        self.config.transcript_char_limit = n;
        self
    }

    pub fn vision_image_side(mut self, px: u32) -> Self {
        self.config.vision_image_side = px;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, WorkflowError> {
        let c = &self.config;
        if c.retry.max_attempts == 0 {
            return Err(WorkflowError::InvalidConfig(
                "Retry attempts must be ≥ 1".into(),
            ));
        }
        if c.retry.min_wait > c.retry.max_wait {
            return Err(WorkflowError::InvalidConfig(format!(
                "Retry min wait {:?} exceeds max wait {:?}",
                c.retry.min_wait, c.retry.max_wait
            )));
        }
        if c.poll.max_attempts == 0 {
            return Err(WorkflowError::InvalidConfig(
                "Poll attempts must be ≥ 1".into(),
            ));
        }
        if c.vision_image_side < 16 || c.vision_image_side > 2048 {
            return Err(WorkflowError::InvalidConfig(format!(
                "Vision image side must be 16–2048 px, got {}",
                c.vision_image_side
            )));
        }
        if c.transcript_char_limit == 0 {
            return Err(WorkflowError::InvalidConfig(
                "Transcript character limit must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Credentials ──────────────────────────────────────────────────────────

/// A credential one of the workflows may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    OpenAi,
    Google,
    Tavily,
}

impl Credential {
    /// Environment variable the credential is read from.
    pub fn var(self) -> &'static str {
        match self {
            Credential::OpenAi => "OPENAI_API_KEY",
            Credential::Google => "GOOGLE_API_KEY",
            Credential::Tavily => "TAVILY_API_KEY",
        }
    }
}

/// Collaborator credentials captured once at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    openai: Option<String>,
    google: Option<String>,
    tavily: Option<String>,
}

impl Credentials {
    /// Read every known credential from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read credentials through an arbitrary lookup (used by tests).
    ///
    /// Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |c: Credential| lookup(c.var()).filter(|v| !v.trim().is_empty());
        Self {
            openai: get(Credential::OpenAi),
            google: get(Credential::Google),
            tavily: get(Credential::Tavily),
        }
    }

    pub fn get(&self, credential: Credential) -> Option<&str> {
        match credential {
            Credential::OpenAi => self.openai.as_deref(),
            Credential::Google => self.google.as_deref(),
            Credential::Tavily => self.tavily.as_deref(),
        }
    }

    /// Return the credential or a fatal startup error naming the workflow.
    pub fn require(
        &self,
        credential: Credential,
        workflow: &'static str,
    ) -> Result<&str, WorkflowError> {
        self.get(credential)
            .ok_or(WorkflowError::MissingCredential {
                var: credential.var(),
                workflow,
            })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "<set>");
        f.debug_struct("Credentials")
            .field("openai", &mask(&self.openai))
            .field("google", &mask(&self.google))
            .field("tavily", &mask(&self.tavily))
            .finish()
    }
}
