//! # codeplate
//!
//! Stamp QR codes and Code128 barcodes onto an image or PDF template and
//! export a numbered batch as a multi-page PDF.
//!
//! A user uploads a template (a label, ticket or form), chooses a numeric
//! range, an optional prefix and where each code goes. Every value in the
//! range produces one page: a copy of the template carrying that value's
//! codes and, optionally, its human-readable text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! template bytes
//!  │
//!  ├─ 1. Template  decode PNG/JPEG, or rasterise page 1 of a PDF (pdfium)
//!  ├─ 2. Validate  range ceiling, code selection, range order
//!  ├─ 3. Codes     QR (EC level L) / Code128, resized to exact pixels
//!  ├─ 4. Compose   paste codes and labels onto a copy of the template
//!  └─ 5. Output    PNG data URI (preview) or one PDF page per value
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codeplate::{export_pdf, load_template, GenerationConfig, ServiceConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ServiceConfig::default();
//!     let bytes = std::fs::read("label.png")?;
//!     let template = load_template(&bytes, "image/png", &service)?;
//!
//!     let mut config = GenerationConfig::new(1, 50);
//!     config.prefix = "ID-".into();
//!     config.include_qr = true;
//!     config.show_qr_text = true;
//!
//!     let pdf = export_pdf(&template, &config, &service)?;
//!     std::fs::write("labels.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `codeplate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! PDF templates need a pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH`, or install pdfium system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{
    compose_range, export_pdf, export_pdf_async, export_pdf_with_progress, export_to_file, preview,
    preview_async, Page, Preview,
};
pub use config::{
    GenerationConfig, ServiceConfig, ServiceConfigBuilder, DEFAULT_FONT_SIZE, MAX_PAGES,
    SUPPORTED_FORMATS,
};
pub use error::CodeplateError;
pub use pipeline::codes::{render_barcode, render_qr, BarcodeRendering};
pub use pipeline::template::{load_template, load_template_async, Template};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{build_router, serve};
