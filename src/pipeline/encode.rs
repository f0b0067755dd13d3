//! Image encoding: raw bytes / `DynamicImage` → PNG, JPEG, base64 `ImageData`.
//!
//! Vision APIs accept images as base64 payloads embedded in the JSON request
//! body. Extracted PDF images are stored as lossless PNG so text in scans
//! stays crisp for OCR; the animal-recognition upload is shrunk and sent as
//! JPEG, matching what the model is told it receives.

use crate::error::WorkflowError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Wrap already-encoded image bytes as base64 `ImageData`.
///
/// The MIME type is sniffed from the magic bytes; unknown formats are
/// rejected rather than sent under a wrong label.
pub fn image_data_from_bytes(bytes: &[u8]) -> Result<ImageData, WorkflowError> {
    let format = image::guess_format(bytes).map_err(|e| WorkflowError::ImageFailed {
        detail: format!("unrecognised image format: {e}"),
    })?;
    let mime = format.to_mime_type();
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} image → {} bytes base64", mime, b64.len());
    Ok(ImageData::new(b64, mime).with_detail("high"))
}

/// Decode an uploaded image, resize it to exactly `side`×`side` with a
/// Lanczos3 filter and re-encode it as JPEG.
pub fn square_jpeg(bytes: &[u8], side: u32) -> Result<Vec<u8>, WorkflowError> {
    let img = image::load_from_memory(bytes).map_err(|e| WorkflowError::ImageFailed {
        detail: format!("decode failed: {e}"),
    })?;
    let resized = img.resize_exact(side, side, FilterType::Lanczos3);
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| WorkflowError::ImageFailed {
            detail: format!("JPEG encode failed: {e}"),
        })?;
    debug!("Resized upload to {side}x{side} → {} JPEG bytes", buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn red_square(side: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(side, side, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn png_roundtrip_keeps_dimensions() {
        let bytes = png_bytes(&red_square(10)).expect("encode should succeed");
        assert_eq!(&bytes[1..4], b"PNG");
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!(back.dimensions(), (10, 10));
    }

    #[test]
    fn image_data_sniffs_png() {
        let bytes = png_bytes(&red_square(3)).unwrap();
        let data = image_data_from_bytes(&bytes).unwrap();
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn image_data_rejects_garbage() {
        let err = image_data_from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, WorkflowError::ImageFailed { .. }));
    }

    #[test]
    fn square_jpeg_resizes_exactly() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 480, Rgba([0, 128, 0, 255])));
        let png = png_bytes(&src).unwrap();
        let jpeg = square_jpeg(&png, 200).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&jpeg).unwrap().dimensions(), (200, 200));
    }
}
