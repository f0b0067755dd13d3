//! LLM adapters: text generation, vision and vision-backed OCR.
//!
//! This module is thin: all prompt wording lives in
//! [`crate::prompts`]. Errors coming back from the provider are classified
//! once here, by [`LlmError`] variant: rate limiting becomes
//! [`WorkflowError::QuotaExhausted`] so the one retrying caller can single
//! it out, everything else becomes [`WorkflowError::Generation`].

use crate::collab::{GenerationRequest, TextGenerator, TextRecognizer, VisionModel, VisionRequest};
use crate::config::ModelSettings;
use crate::error::WorkflowError;
use crate::pipeline::encode;
use crate::prompts::OCR_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Model used when a provider is named but no model is.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// [`TextGenerator`] backed by any `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the provider described by `settings`.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, WorkflowError> {
        Ok(Self::new(resolve_provider(settings)?))
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, WorkflowError> {
        let start = Instant::now();
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage::system(system.as_str()));
        }
        messages.push(ChatMessage::user(request.prompt.as_str()));

        let options = build_options(request.temperature, request.max_tokens);
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(classify_error)?;

        debug!(
            "generation: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// [`VisionModel`] backed by any vision-capable `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmVision {
    provider: Arc<dyn LLMProvider>,
}

impl LlmVision {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self, WorkflowError> {
        Ok(Self::new(resolve_provider(settings)?))
    }
}

#[async_trait]
impl VisionModel for LlmVision {
    async fn describe(&self, request: &VisionRequest) -> Result<String, WorkflowError> {
        let messages = vec![ChatMessage::user_with_images(
            request.prompt.as_str(),
            vec![request.image.clone()],
        )];
        let options = build_options(request.temperature, None);
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(classify_error)?;

        debug!(
            "vision: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// OCR through a vision model: the image goes in with a strict
/// transcription prompt, the raw transcription comes back.
#[derive(Clone)]
pub struct VisionRecognizer {
    vision: Arc<dyn VisionModel>,
    temperature: Option<f32>,
}

impl VisionRecognizer {
    pub fn new(vision: Arc<dyn VisionModel>, temperature: Option<f32>) -> Self {
        Self {
            vision,
            temperature,
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self, WorkflowError> {
        let vision = LlmVision::from_settings(settings)?;
        Ok(Self::new(Arc::new(vision), settings.temperature))
    }
}

#[async_trait]
impl TextRecognizer for VisionRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, WorkflowError> {
        let image = encode::image_data_from_bytes(image)?;
        self.vision
            .describe(&VisionRequest {
                prompt: OCR_PROMPT.to_string(),
                image,
                temperature: self.temperature,
            })
            .await
    }
}

/// Build `CompletionOptions` from per-call sampling settings.
fn build_options(temperature: Option<f32>, max_tokens: Option<usize>) -> CompletionOptions {
    CompletionOptions {
        temperature,
        max_tokens,
        ..Default::default()
    }
}

/// Map a provider error onto the crate's error classes.
///
/// Providers without a dedicated rate-limit mapping (Gemini among them)
/// report quota exhaustion as an API error carrying HTTP 429 or the
/// `RESOURCE_EXHAUSTED` status.
pub(crate) fn classify_error(e: LlmError) -> WorkflowError {
    match e {
        LlmError::RateLimited(message) => WorkflowError::QuotaExhausted { message },
        LlmError::ApiError(ref m) | LlmError::ProviderError(ref m) if is_quota_status(m) => {
            WorkflowError::QuotaExhausted {
                message: e.to_string(),
            }
        }
        other => WorkflowError::Generation {
            message: other.to_string(),
        },
    }
}

fn is_quota_status(message: &str) -> bool {
    message.contains("RESOURCE_EXHAUSTED") || message.contains("(429)")
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, WorkflowError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        WorkflowError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`settings.provider`), used as-is.
/// 2. **Named provider + model** (`settings.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is present.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(settings: &ModelSettings) -> Result<Arc<dyn LLMProvider>, WorkflowError> {
    if let Some(ref provider) = settings.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = settings.provider_name {
        let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let model = settings.model.clone().unwrap_or(model);
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| WorkflowError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn build_options_forwards_settings() {
        let opts = build_options(Some(0.2), Some(512));
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(512));
    }

    #[test]
    fn rate_limits_are_quota_errors() {
        let err = classify_error(LlmError::RateLimited("Rate limit reached for gpt-4o".into()));
        assert!(err.is_quota_exhausted());
        assert!(classify_error(LlmError::ApiError(
            "Gemini API error (429): Resource has been exhausted".into()
        ))
        .is_quota_exhausted());
        assert!(classify_error(LlmError::ApiError(
            "RESOURCE_EXHAUSTED: Quota exceeded for metric".into()
        ))
        .is_quota_exhausted());
    }

    #[test]
    fn other_provider_errors_are_generation_errors() {
        // Token counts such as 4290 must not look like a 429 status.
        let too_long = classify_error(LlmError::TokenLimitExceeded { max: 4096, got: 4290 });
        assert!(matches!(too_long, WorkflowError::Generation { .. }));
        assert!(!classify_error(LlmError::AuthError("invalid api key".into())).is_quota_exhausted());
        assert!(!classify_error(LlmError::ApiError(
            "context window exceeded the quota of 4290 tokens".into()
        ))
        .is_quota_exhausted());
        assert!(!classify_error(LlmError::Timeout).is_quota_exhausted());
    }

    struct CapturingVision {
        seen: Mutex<Vec<(String, String, Option<f32>)>>,
    }

    #[async_trait]
    impl VisionModel for CapturingVision {
        async fn describe(&self, request: &VisionRequest) -> Result<String, WorkflowError> {
            self.seen.lock().unwrap().push((
                request.prompt.clone(),
                request.image.mime_type.clone(),
                request.temperature,
            ));
            Ok("  INVOICE 123  ".into())
        }
    }

    #[tokio::test]
    async fn recognizer_sends_ocr_prompt_with_png() {
        use image::{DynamicImage, Rgba, RgbaImage};

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let png = encode::png_bytes(&img).unwrap();

        let vision = Arc::new(CapturingVision {
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = VisionRecognizer::new(vision.clone(), Some(0.0));
        let text = recognizer.recognize(&png).await.unwrap();

        // Trimming is the transcriber's job, not the adapter's.
        assert_eq!(text, "  INVOICE 123  ");
        let seen = vision.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, OCR_PROMPT);
        assert_eq!(seen[0].1, "image/png");
        assert_eq!(seen[0].2, Some(0.0));
    }
}
