//! Template loading: uploaded bytes → immutable RGB raster.
//!
//! Images are decoded with the `image` crate. PDFs are opened with pdfium
//! and only their first page is rasterised, upscaled by
//! [`ServiceConfig::pdf_render_scale`]. Either way the result is collapsed
//! to plain 8-bit RGB so every later stage deals with a single pixel format.
//!
//! ## Why spawn_blocking?
//!
//! pdfium uses thread-local state and is not safe to drive from async
//! contexts; image decoding is CPU-bound. [`load_template_async`] moves the
//! work onto tokio's blocking pool so request handlers never stall a
//! worker thread.

use crate::config::ServiceConfig;
use crate::error::CodeplateError;
use crate::pipeline::encode;
use image::{DynamicImage, RgbImage};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A decoded template: the RGB canvas every page is stamped onto.
///
/// There is no mutable access; composition works on a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    raster: RgbImage,
}

impl Template {
    /// Wrap an already-decoded image, normalising it to RGB.
    pub fn from_image(image: DynamicImage) -> Self {
        let raster = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
        Self { raster }
    }

    /// Decode a template sent back by the client as a base64 data URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, CodeplateError> {
        let bytes = encode::decode_data_uri(uri)?;
        decode_image(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    /// Re-encode the normalised template as a PNG data URI.
    pub fn to_data_uri(&self) -> Result<String, CodeplateError> {
        encode::to_data_uri(&self.raster)
    }
}

/// True when the declared content type names a PDF document.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|t| t.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Best-effort content type for a template file on disk.
///
/// Used by the CLI, where no multipart header declares one. The extension
/// wins; otherwise the `%PDF` magic bytes are checked.
pub fn content_type_for_path(path: &Path, bytes: &[u8]) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ if bytes.starts_with(b"%PDF") => PDF_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

/// Decode uploaded bytes into a [`Template`].
///
/// Blocking: call [`load_template_async`] from async code.
pub fn load_template(
    bytes: &[u8],
    content_type: &str,
    service: &ServiceConfig,
) -> Result<Template, CodeplateError> {
    let template = if is_pdf_content_type(content_type) {
        rasterise_first_page(bytes, service.pdf_render_scale)?
    } else {
        decode_image(bytes)?
    };
    info!(
        content_type,
        width = template.width(),
        height = template.height(),
        "Template loaded"
    );
    Ok(template)
}

/// Async wrapper around [`load_template`] running on the blocking pool.
pub async fn load_template_async(
    bytes: Vec<u8>,
    content_type: String,
    service: &ServiceConfig,
) -> Result<Template, CodeplateError> {
    let service = service.clone();
    tokio::task::spawn_blocking(move || load_template(&bytes, &content_type, &service))
        .await
        .map_err(|e| CodeplateError::Internal(format!("Template task panicked: {}", e)))?
}

fn decode_image(bytes: &[u8]) -> Result<Template, CodeplateError> {
    let image = image::load_from_memory(bytes).map_err(|e| CodeplateError::Decode(e.to_string()))?;
    debug!(color = ?image.color(), "Decoded raster template");
    Ok(Template::from_image(image))
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH`, then the system library,
/// then the working directory.
fn bind_pdfium() -> Result<Pdfium, CodeplateError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library().or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        }),
    }
    .map_err(|e| CodeplateError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn rasterise_first_page(bytes: &[u8], scale: f32) -> Result<Template, CodeplateError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| CodeplateError::CorruptPdf(format!("{:?}", e)))?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(CodeplateError::CorruptPdf("document has no pages".into()));
    }

    let page = pages
        .get(0)
        .map_err(|e| CodeplateError::CorruptPdf(format!("{:?}", e)))?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| CodeplateError::CorruptPdf(format!("rasterisation failed: {:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered PDF page 1 of {} → {}x{} px",
        pages.len(),
        image.width(),
        image.height()
    );

    Ok(Template::from_image(image))
}
