//! The accumulator threaded through the document pipeline.
//!
//! A [`PipelineRecord`] is created empty, receives exactly one
//! [`RecordUpdate`] per step and is handed back to the caller when the
//! driver finishes. Nothing is persisted between runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Plain text of one page. `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// One embedded raster image, re-encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub page_number: usize,
    #[serde(with = "base64_bytes")]
    pub image_bytes: Vec<u8>,
}

/// Text recognised in one [`PageImage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrText {
    pub page_number: usize,
    pub recognized_text: String,
}

/// Mutable accumulator for one document-pipeline run.
///
/// `pages` and `images` are ordered by page number (non-decreasing);
/// `images` and `ocr_results` correlate by page number but may differ in
/// length because a page can carry zero or several images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub source: PathBuf,
    pub pages: Vec<PageText>,
    pub images: Vec<PageImage>,
    pub ocr_results: Vec<OcrText>,
    pub answer_lines: Vec<String>,
    /// User-visible messages left by degraded boundary steps.
    pub notices: Vec<String>,
}

impl PipelineRecord {
    /// A fresh record for `source` with every accumulator empty.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Merge a step's partial update. Fields the step did not produce are
    /// left untouched.
    pub fn apply(&mut self, update: RecordUpdate) {
        if let Some(pages) = update.pages {
            self.pages = pages;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(ocr) = update.ocr_results {
            self.ocr_results = ocr;
        }
        if let Some(lines) = update.answer_lines {
            self.answer_lines = lines;
        }
        self.notices.extend(update.notices);
    }
}

/// Partial update returned by one pipeline step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub pages: Option<Vec<PageText>>,
    pub images: Option<Vec<PageImage>>,
    pub ocr_results: Option<Vec<OcrText>>,
    pub answer_lines: Option<Vec<String>>,
    pub notices: Vec<String>,
}

/// Serialise raw bytes as a base64 string so JSON output stays readable.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_present_fields() {
        let mut record = PipelineRecord::new("doc.pdf");
        record.apply(RecordUpdate {
            pages: Some(vec![PageText {
                page_number: 1,
                text: "Hello".into(),
            }]),
            images: Some(vec![]),
            ..RecordUpdate::default()
        });
        record.apply(RecordUpdate {
            answer_lines: Some(vec!["1. Greeting".into()]),
            ..RecordUpdate::default()
        });

        assert_eq!(record.pages.len(), 1);
        assert!(record.images.is_empty());
        assert!(record.ocr_results.is_empty());
        assert_eq!(record.answer_lines, vec!["1. Greeting"]);
    }

    #[test]
    fn notices_accumulate() {
        let mut record = PipelineRecord::new("doc.pdf");
        record.apply(RecordUpdate {
            notices: vec!["first".into()],
            ..RecordUpdate::default()
        });
        record.apply(RecordUpdate {
            notices: vec!["second".into()],
            ..RecordUpdate::default()
        });
        assert_eq!(record.notices, vec!["first", "second"]);
    }

    #[test]
    fn image_bytes_serialise_as_base64() {
        let image = PageImage {
            page_number: 2,
            image_bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"iVBORw==\""), "got: {json}");
        let back: PageImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }
}
