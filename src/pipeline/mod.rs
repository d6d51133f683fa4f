//! Pipeline stages for template stamping.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the batch layer only has to sequence them.
//!
//! ## Data Flow
//!
//! ```text
//! template ──▶ codes ──▶ compose ──▶ encode / pdf
//! (decode)    (QR/128)   (overlay)   (PNG URI / multi-page PDF)
//! ```
//!
//! 1. [`template`] decodes an uploaded image, or the first page of a PDF via
//!    pdfium, into an RGB raster.
//! 2. [`codes`] renders one value as a QR code or a Code128 barcode of an
//!    exact pixel size. Barcodes fall back to an outlined text box.
//! 3. [`compose`] copies the template and pastes codes and labels onto it.
//!    [`text`] supplies the bitmap font for the labels.
//! 4. [`encode`] turns a page into a PNG data URI for previews; [`pdf`]
//!    concatenates pages into the export document.

pub mod codes;
pub mod compose;
pub mod encode;
pub mod pdf;
pub mod template;
pub mod text;
