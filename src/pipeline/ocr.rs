//! Image-to-text transcription of extracted page images.

use crate::collab::TextRecognizer;
use crate::error::WorkflowError;
use crate::record::{OcrText, PageImage};
use tracing::debug;

/// Recognise every image in order, pairing the trimmed text with the page
/// the image came from.
///
/// There is no per-image guard: the first recognition failure aborts the
/// whole step.
pub async fn transcribe(
    recognizer: &dyn TextRecognizer,
    images: &[PageImage],
) -> Result<Vec<OcrText>, WorkflowError> {
    let mut results = Vec::with_capacity(images.len());
    for image in images {
        let text = recognizer
            .recognize(&image.image_bytes)
            .await
            .map_err(|e| match e {
                WorkflowError::Recognition { .. } => e,
                other => WorkflowError::Recognition {
                    page: image.page_number,
                    detail: other.to_string(),
                },
            })?;
        debug!("OCR page {}: {} chars", image.page_number, text.len());
        results.push(OcrText {
            page_number: image.page_number,
            recognized_text: text.trim().to_string(),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the first byte back as text; fails on byte 0xFF.
    struct ByteEcho {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextRecognizer for ByteEcho {
        async fn recognize(&self, image: &[u8]) -> Result<String, WorkflowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match image.first() {
                Some(0xFF) => Err(WorkflowError::Generation {
                    message: "unreadable".into(),
                }),
                Some(b) => Ok(format!("  byte {b}\n")),
                None => Ok(String::new()),
            }
        }
    }

    fn image(page_number: usize, byte: u8) -> PageImage {
        PageImage {
            page_number,
            image_bytes: vec![byte],
        }
    }

    #[tokio::test]
    async fn keeps_order_and_page_numbers() {
        let rec = ByteEcho { calls: AtomicUsize::new(0) };
        let out = transcribe(&rec, &[image(1, 7), image(1, 8), image(3, 9)])
            .await
            .unwrap();
        let pairs: Vec<(usize, &str)> = out
            .iter()
            .map(|o| (o.page_number, o.recognized_text.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "byte 7"), (1, "byte 8"), (3, "byte 9")]);
    }

    #[tokio::test]
    async fn one_failure_fails_the_step() {
        let rec = ByteEcho { calls: AtomicUsize::new(0) };
        let err = transcribe(&rec, &[image(1, 7), image(2, 0xFF), image(3, 9)])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Recognition { page: 2, .. }));
        // The third image is never attempted.
        assert_eq!(rec.calls.load(Ordering::SeqCst), 2);
    }
}
