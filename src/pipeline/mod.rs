//! Document-understanding pipeline stages.
//!
//! | Module   | Responsibility                                         |
//! |----------|--------------------------------------------------------|
//! | input    | resolve a path, URL or upload to a local file          |
//! | extract  | per-page text and embedded images (pdfium, blocking)   |
//! | encode   | PNG/JPEG re-encoding and base64 `ImageData`            |
//! | router   | decide whether OCR is needed                           |
//! | ocr      | transcribe extracted images                            |
//! | reason   | fixed analysis prompt over text and OCR                |
//! | driver   | run the steps in order and return the record           |
//! | qa       | follow-up questions over a finished record             |

pub mod driver;
pub mod encode;
pub mod extract;
pub mod input;
pub mod ocr;
pub mod qa;
pub mod reason;
pub mod router;
