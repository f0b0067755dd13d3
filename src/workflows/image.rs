//! Image recognition: shrink the upload, ask a vision model to describe it.

use crate::collab::llm::LlmVision;
use crate::collab::{VisionModel, VisionRequest};
use crate::config::{ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::pipeline::encode::{image_data_from_bytes, square_jpeg};
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::ANIMAL_IMAGE_PROMPT;
use crate::workflows::run_step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const WORKFLOW: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageState {
    /// Size of the original upload in bytes.
    pub original_bytes: usize,
    /// Size of the re-encoded square JPEG.
    pub prepared_bytes: usize,
    pub description: String,
}

pub struct ImageRecognizer {
    vision: Arc<dyn VisionModel>,
    settings: ModelSettings,
    side: u32,
    progress: Option<ProgressCallback>,
}

impl ImageRecognizer {
    pub fn new(vision: Arc<dyn VisionModel>, settings: ModelSettings, side: u32) -> Self {
        Self {
            vision,
            settings,
            side,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        Ok(Self::new(
            Arc::new(LlmVision::from_settings(&config.vision)?),
            config.vision.clone(),
            config.vision_image_side,
        )
        .with_progress(config.progress_callback.clone()))
    }

    /// Describe an encoded image (PNG, JPEG, ...).
    pub async fn run(&self, upload: &[u8]) -> Result<ImageState, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);

        let jpeg = run_step(&progress, "prepare", async { square_jpeg(upload, self.side) }).await?;
        let description = run_step(&progress, "describe", async {
            let image = image_data_from_bytes(&jpeg)?;
            self.vision
                .describe(&VisionRequest {
                    prompt: ANIMAL_IMAGE_PROMPT.to_string(),
                    image,
                    temperature: self.settings.temperature,
                })
                .await
        })
        .await?;

        info!("Image described in {} chars", description.len());
        progress.workflow_complete(WORKFLOW);
        Ok(ImageState {
            original_bytes: upload.len(),
            prepared_bytes: jpeg.len(),
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::png_bytes;
    use async_trait::async_trait;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
    use std::sync::Mutex;

    #[derive(Default)]
    struct SeenVision {
        seen: Mutex<Vec<VisionRequest>>,
    }

    #[async_trait]
    impl VisionModel for SeenVision {
        async fn describe(&self, request: &VisionRequest) -> Result<String, WorkflowError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok("A small brown dog.".into())
        }
    }

    #[tokio::test]
    async fn sends_a_square_jpeg_with_the_animal_prompt() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let upload = png_bytes(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            300,
            120,
            Rgba([10, 20, 30, 255]),
        )))
        .unwrap();
        let vision = Arc::new(SeenVision::default());
        let state = ImageRecognizer::new(vision.clone(), ModelSettings::default(), 200)
            .run(&upload)
            .await
            .unwrap();

        assert_eq!(state.description, "A small brown dog.");
        let seen = vision.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, ANIMAL_IMAGE_PROMPT);
        assert_eq!(seen[0].image.mime_type, "image/jpeg");
        let sent = STANDARD.decode(&seen[0].image.data).unwrap();
        assert_eq!(image::load_from_memory(&sent).unwrap().dimensions(), (200, 200));
    }

    #[tokio::test]
    async fn undecodable_upload_fails_before_the_model_call() {
        let vision = Arc::new(SeenVision::default());
        let err = ImageRecognizer::new(vision.clone(), ModelSettings::default(), 200)
            .run(b"definitely not an image")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ImageFailed { .. }));
        assert!(vision.seen.lock().unwrap().is_empty());
    }
}
