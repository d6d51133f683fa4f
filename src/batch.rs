//! Batch entry points: preview one page, or export a whole range as PDF.
//!
//! Both entry points validate the [`GenerationConfig`] against the
//! [`ServiceConfig`] before rendering anything, then share
//! [`compose_page`](crate::pipeline::compose::compose_page) for the per-page
//! work. Pages are composed strictly in ascending value order on the calling
//! thread. Any failure aborts the batch, so a partial PDF is never produced.
//!
//! The `*_async` variants move the CPU-bound work onto tokio's blocking
//! pool, as request handlers need.

use crate::config::{GenerationConfig, ServiceConfig};
use crate::error::CodeplateError;
use crate::pipeline::{compose, encode, pdf, template::Template};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Title embedded in exported PDFs.
pub const PDF_TITLE: &str = "Generated codes";

/// One composed page and the value stamped on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub value: String,
    pub image: RgbImage,
}

/// Result of a preview request.
#[derive(Debug, Clone)]
pub struct Preview {
    /// The page for `start_value`.
    pub image: RgbImage,
    /// Pages the full export would produce.
    pub total_pages: usize,
}

impl Preview {
    /// The preview page as a PNG data URI.
    pub fn to_data_uri(&self) -> Result<String, CodeplateError> {
        encode::to_data_uri(&self.image)
    }
}

/// Compose only the first page of the range.
///
/// Later values are not attempted, so a range whose tail would fail still
/// previews successfully.
pub fn preview(
    template: &Template,
    config: &GenerationConfig,
    service: &ServiceConfig,
) -> Result<Preview, CodeplateError> {
    let total_pages = config.validate(service)?;
    let value = config.encoded_value(config.start_value);
    let image = compose::compose_page(template, &value, config, service)?;
    debug!(value, total_pages, "Preview composed");
    Ok(Preview { image, total_pages })
}

/// Compose every page of `[start_value, end_value]` in ascending order.
pub fn compose_range(
    template: &Template,
    config: &GenerationConfig,
    service: &ServiceConfig,
) -> Result<Vec<Page>, CodeplateError> {
    let noop: ProgressCallback = Arc::new(NoopProgressCallback);
    compose_range_with_progress(template, config, service, &noop)
}

fn compose_range_with_progress(
    template: &Template,
    config: &GenerationConfig,
    service: &ServiceConfig,
    progress: &ProgressCallback,
) -> Result<Vec<Page>, CodeplateError> {
    let total = config.validate(service)?;
    progress.on_batch_start(total);

    let mut pages = Vec::with_capacity(total);
    for (idx, value) in config.values().enumerate() {
        let image = compose::compose_page(template, &value, config, service)?;
        progress.on_page_composed(idx + 1, total, &value);
        pages.push(Page { value, image });
    }
    Ok(pages)
}

/// Compose the whole range and return it as a multi-page PDF.
pub fn export_pdf(
    template: &Template,
    config: &GenerationConfig,
    service: &ServiceConfig,
) -> Result<Vec<u8>, CodeplateError> {
    export_pdf_with_progress(template, config, service, None)
}

/// [`export_pdf`] reporting each page to `progress`.
pub fn export_pdf_with_progress(
    template: &Template,
    config: &GenerationConfig,
    service: &ServiceConfig,
    progress: Option<ProgressCallback>,
) -> Result<Vec<u8>, CodeplateError> {
    let start = Instant::now();
    let progress = progress.unwrap_or_else(|| Arc::new(NoopProgressCallback));

    let pages = compose_range_with_progress(template, config, service, &progress)?;
    let rasters: Vec<&RgbImage> = pages.iter().map(|p| &p.image).collect();
    let bytes = pdf::write_pages(&rasters, PDF_TITLE)?;

    progress.on_batch_complete(pages.len(), bytes.len());
    info!(
        pages = pages.len(),
        first = %config.encoded_value(config.start_value),
        last = %config.encoded_value(config.end_value),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch exported"
    );
    Ok(bytes)
}

/// Export the batch and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn export_to_file(
    template: Template,
    config: GenerationConfig,
    service: &ServiceConfig,
    output_path: impl AsRef<Path>,
    progress: Option<ProgressCallback>,
) -> Result<usize, CodeplateError> {
    let path = output_path.as_ref();
    let pages = config.validate(service)?;
    let service = service.clone();

    let bytes = tokio::task::spawn_blocking(move || {
        export_pdf_with_progress(&template, &config, &service, progress)
    })
    .await
    .map_err(|e| CodeplateError::Internal(format!("Export task panicked: {}", e)))??;

    let write_err = |e: std::io::Error| {
        CodeplateError::Internal(format!("Failed to write '{}': {}", path.display(), e))
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} pages to {}", pages, path.display());
    Ok(pages)
}

/// Async wrapper around [`preview`] running on the blocking pool.
pub async fn preview_async(
    template: Template,
    config: GenerationConfig,
    service: Arc<ServiceConfig>,
) -> Result<Preview, CodeplateError> {
    tokio::task::spawn_blocking(move || preview(&template, &config, &service))
        .await
        .map_err(|e| CodeplateError::Internal(format!("Preview task panicked: {}", e)))?
}

/// Async wrapper around [`export_pdf`] running on the blocking pool.
pub async fn export_pdf_async(
    template: Template,
    config: GenerationConfig,
    service: Arc<ServiceConfig>,
) -> Result<Vec<u8>, CodeplateError> {
    tokio::task::spawn_blocking(move || export_pdf(&template, &config, &service))
        .await
        .map_err(|e| CodeplateError::Internal(format!("Export task panicked: {}", e)))?
}
