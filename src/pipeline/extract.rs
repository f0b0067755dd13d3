//! Content extraction: per-page text and embedded raster images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while parsing. The work runs on Tokio's blocking pool so
//! the async workers never stall.
//!
//! ## Degrade, don't fail
//!
//! Extraction is a boundary step. Any failure (engine not bindable, file
//! missing, encrypted or corrupt, unreadable page objects) is caught here
//! and returned as an [`ExtractedContent`] with no pages, no images and the
//! failure reason. The caller shows the reason to the user and carries on
//! with empty input.

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::pipeline::encode::png_bytes;
use crate::record::{PageImage, PageText};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output of one extraction: ordered page texts, ordered page images, and
/// the reason extraction degraded, if it did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub pages: Vec<PageText>,
    pub images: Vec<PageImage>,
    pub failure: Option<String>,
}

impl ExtractedContent {
    /// The empty-result sentinel returned when a document cannot be read.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            images: Vec::new(),
            failure: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    /// Append one page: its text is trimmed and every image is tagged with
    /// `page_number`, keeping embedded order.
    pub fn push_page(&mut self, page_number: usize, raw_text: &str, images: Vec<Vec<u8>>) {
        self.pages.push(PageText {
            page_number,
            text: raw_text.trim().to_string(),
        });
        self.images.extend(images.into_iter().map(|image_bytes| PageImage {
            page_number,
            image_bytes,
        }));
    }
}

/// Produces page text and images for a document handle. Never fails.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, source: &Path) -> ExtractedContent;
}

/// [`ContentExtractor`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
    password: Option<String>,
    text_only: bool,
}

impl PdfiumExtractor {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            lib_path: config.pdfium_lib_path.clone(),
            password: config.password.clone(),
            text_only: false,
        }
    }

    /// Skip image objects entirely (used by the summarizer).
    pub fn text_only(mut self) -> Self {
        self.text_only = true;
        self
    }
}

#[async_trait]
impl ContentExtractor for PdfiumExtractor {
    async fn extract(&self, source: &Path) -> ExtractedContent {
        let path = source.to_path_buf();
        let lib_path = self.lib_path.clone();
        let password = self.password.clone();
        let text_only = self.text_only;

        let joined = tokio::task::spawn_blocking(move || {
            extract_blocking(&path, lib_path.as_deref(), password.as_deref(), text_only)
        })
        .await;

        match joined {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!("{}", e);
                ExtractedContent::failed(e.to_string())
            }
            Err(e) => {
                warn!("Extraction task panicked: {}", e);
                ExtractedContent::failed(format!("extraction task panicked: {e}"))
            }
        }
    }
}

/// Bind pdfium from an explicit path, then the working directory, then the
/// system library search path.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, PdfiumError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path)?,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())?,
    };
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of extraction.
fn extract_blocking(
    pdf_path: &Path,
    lib_path: Option<&Path>,
    password: Option<&str>,
    text_only: bool,
) -> Result<ExtractedContent, WorkflowError> {
    let unreadable = |detail: String| WorkflowError::DocumentUnreadable {
        path: pdf_path.to_path_buf(),
        detail,
    };

    let pdfium = bind_pdfium(lib_path).map_err(|e| unreadable(format!("pdfium unavailable: {e:?}")))?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| unreadable(format!("{e:?}")))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut content = ExtractedContent::default();
    for (idx, page) in pages.iter().enumerate() {
        let page_number = idx + 1;
        let text = page
            .text()
            .map_err(|e| unreadable(format!("page {page_number} text: {e:?}")))?
            .all();

        let mut images = Vec::new();
        if !text_only {
            for object in page.objects().iter() {
                if let Some(image_object) = object.as_image_object() {
                    let raw = image_object
                        .get_raw_image()
                        .map_err(|e| unreadable(format!("page {page_number} image: {e:?}")))?;
                    let bytes = png_bytes(&raw)
                        .map_err(|e| unreadable(format!("page {page_number} image encode: {e}")))?;
                    images.push(bytes);
                }
            }
        }

        debug!(
            "Page {}: {} chars, {} images",
            page_number,
            text.len(),
            images.len()
        );
        content.push_page(page_number, &text, images);
    }

    Ok(content)
}
