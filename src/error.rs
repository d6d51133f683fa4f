//! Error types for the codeplate library.
//!
//! A single fatal error type, [`CodeplateError`], covers every stage of the
//! pipeline: template decoding, request validation, code rendering, page
//! composition and PDF assembly. Any of them aborts the current request;
//! nothing is retried and no partial output is produced.
//!
//! Barcode encoding failures are deliberately absent: the renderer recovers
//! from them locally with a fallback image (see
//! [`crate::pipeline::codes::BarcodeRendering`]), so they never surface here.

use thiserror::Error;

/// All fatal errors returned by the codeplate library.
#[derive(Debug, Error)]
pub enum CodeplateError {
    // ── Template errors ───────────────────────────────────────────────────
    /// Uploaded bytes (or a base64 data URI) could not be decoded as an image.
    #[error("cannot decode template image: {0}")]
    Decode(String),

    /// pdfium could not open the uploaded PDF or render its first page.
    #[error("PDF template is corrupt: {0}")]
    CorruptPdf(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Validation errors ─────────────────────────────────────────────────
    /// The requested range would produce more pages than allowed.
    #[error("Range exceeds maximum of {max} pages (requested {requested})")]
    RangeTooLarge { requested: i128, max: usize },

    /// `end_value` is smaller than `start_value`.
    #[error("end_value ({end}) must not be smaller than start_value ({start})")]
    InvertedRange { start: i64, end: i64 },

    /// Neither QR codes nor barcodes were requested.
    #[error("At least one code type must be selected")]
    NoCodeSelected,

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The QR encoder rejected the payload (usually: too long for any version).
    #[error("cannot encode '{value}' as QR code: {detail}")]
    QrEncode { value: String, detail: String },

    /// PNG encoding of a composed page failed.
    #[error("image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),

    /// Page composition or batch assembly failed.
    #[error("composition failed: {0}")]
    Composition(String),

    // ── Request / config errors ───────────────────────────────────────────
    /// The JSON generation config could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required multipart form field was not sent.
    #[error("missing form field '{0}'")]
    MissingField(&'static str),

    /// The request body was not valid multipart form data.
    #[error("malformed form data: {0}")]
    Form(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CodeplateError {
    /// True for errors raised by request validation, before any rendering.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CodeplateError::RangeTooLarge { .. }
                | CodeplateError::InvertedRange { .. }
                | CodeplateError::NoCodeSelected
        )
    }
}

impl From<serde_json::Error> for CodeplateError {
    fn from(err: serde_json::Error) -> Self {
        CodeplateError::InvalidConfig(err.to_string())
    }
}
