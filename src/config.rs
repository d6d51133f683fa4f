//! Configuration types for template stamping.
//!
//! Two configuration layers exist:
//!
//! * [`ServiceConfig`] is process-wide and read-only after startup: page
//!   ceiling, label font size, PDF upscaling factor, CORS origins and body
//!   size limit. Built
//!   once through [`ServiceConfigBuilder`] and shared behind an `Arc`.
//! * [`GenerationConfig`] is per request: the numeric range, prefix, which
//!   codes to draw and where. It is decoded from the client's JSON and never
//!   mutated afterwards.

use crate::error::CodeplateError;
use serde::{Deserialize, Serialize};

/// Default ceiling on pages per batch.
pub const MAX_PAGES: usize = 100;

/// Default label glyph cell size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Upscaling applied when rasterising a PDF template (1.0 = 72 DPI).
pub const DEFAULT_PDF_RENDER_SCALE: f32 = 2.0;

/// Content types accepted by the upload endpoint.
pub const SUPPORTED_FORMATS: &[&str] = &["image/png", "image/jpeg", "image/jpg", "application/pdf"];

/// Default request body ceiling: uploads and re-sent base64 templates.
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Origins the bundled web frontend is served from.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://qr-code-adder.vercel.app",
];

// ── ServiceConfig ────────────────────────────────────────────────────────

/// Process-wide, read-only settings.
///
/// Built via [`ServiceConfig::builder()`] or [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use codeplate::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .max_pages(250)
///     .font_size(16)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 250);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Maximum number of pages a single batch may produce. Default: 100.
    pub max_pages: usize,

    /// Label glyph cell size in pixels. Default: 12.
    ///
    /// Labels use a fixed 8×8 bitmap font scaled to this cell size.
    pub font_size: u32,

    /// Scale factor applied to a PDF template's first page. Default: 2.0.
    ///
    /// PDF pages are measured in points (1/72 in); a factor of 2 renders at
    /// 144 DPI so stamped codes are not placed on a blurry background.
    pub pdf_render_scale: f32,

    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<String>,

    /// Largest accepted request body in bytes. Default: 50 MiB.
    ///
    /// The template travels as base64 on every preview and export request,
    /// which inflates it by a third.
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            font_size: DEFAULT_FONT_SIZE,
            pdf_render_scale: DEFAULT_PDF_RENDER_SCALE,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Content types the upload endpoint accepts.
    pub fn supported_formats(&self) -> &'static [&'static str] {
        SUPPORTED_FORMATS
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn font_size(mut self, px: u32) -> Self {
        self.config.font_size = px;
        self
    }

    pub fn pdf_render_scale(mut self, scale: f32) -> Self {
        self.config.pdf_render_scale = scale;
        self
    }

    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, CodeplateError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(CodeplateError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if c.font_size == 0 {
            return Err(CodeplateError::InvalidConfig(
                "font_size must be ≥ 1".into(),
            ));
        }
        if c.max_body_bytes == 0 {
            return Err(CodeplateError::InvalidConfig(
                "max_body_bytes must be ≥ 1".into(),
            ));
        }
        if !(c.pdf_render_scale.is_finite() && c.pdf_render_scale > 0.0 && c.pdf_render_scale <= 8.0) {
            return Err(CodeplateError::InvalidConfig(format!(
                "pdf_render_scale must be in (0, 8], got {}",
                c.pdf_render_scale
            )));
        }
        Ok(self.config)
    }
}

// ── GenerationConfig ─────────────────────────────────────────────────────

/// One batch request: which values to encode and how to lay out the codes.
///
/// Decoded from the `config_data` JSON sent with every preview and export
/// request. Only `start_value` and `end_value` are required.
///
/// Placements are signed and never bounds-checked: a code placed partly or
/// entirely outside the template is clipped silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub start_value: i64,
    pub end_value: i64,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub include_qr: bool,
    #[serde(default)]
    pub include_barcode: bool,
    #[serde(default)]
    pub show_qr_text: bool,
    #[serde(default)]
    pub show_barcode_text: bool,
    #[serde(default = "default_qr_size")]
    pub qr_size: u32,
    #[serde(default = "default_barcode_width")]
    pub barcode_width: u32,
    #[serde(default = "default_barcode_height")]
    pub barcode_height: u32,
    #[serde(default = "default_qr_xy")]
    pub qr_x: i64,
    #[serde(default = "default_qr_xy")]
    pub qr_y: i64,
    #[serde(default = "default_barcode_x")]
    pub barcode_x: i64,
    #[serde(default = "default_barcode_y")]
    pub barcode_y: i64,
    #[serde(default = "default_text_offset_y")]
    pub text_offset_y: i64,
}

fn default_qr_size() -> u32 {
    100
}
fn default_barcode_width() -> u32 {
    200
}
fn default_barcode_height() -> u32 {
    50
}
fn default_qr_xy() -> i64 {
    100
}
fn default_barcode_x() -> i64 {
    100
}
fn default_barcode_y() -> i64 {
    200
}
fn default_text_offset_y() -> i64 {
    10
}

impl GenerationConfig {
    /// A config covering `start..=end` with every other field at its default.
    pub fn new(start_value: i64, end_value: i64) -> Self {
        Self {
            start_value,
            end_value,
            prefix: String::new(),
            include_qr: false,
            include_barcode: false,
            show_qr_text: false,
            show_barcode_text: false,
            qr_size: default_qr_size(),
            barcode_width: default_barcode_width(),
            barcode_height: default_barcode_height(),
            qr_x: default_qr_xy(),
            qr_y: default_qr_xy(),
            barcode_x: default_barcode_x(),
            barcode_y: default_barcode_y(),
            text_offset_y: default_text_offset_y(),
        }
    }

    /// Parse the JSON form field sent by the client.
    pub fn from_json(json: &str) -> Result<Self, CodeplateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of pages the range spans (may be ≤ 0 for an inverted range).
    ///
    /// Computed in `i128` so extreme `i64` bounds cannot overflow.
    pub fn page_count(&self) -> i128 {
        self.end_value as i128 - self.start_value as i128 + 1
    }

    /// The string encoded on the page for `n`: prefix followed by the number.
    pub fn encoded_value(&self, n: i64) -> String {
        format!("{}{}", self.prefix, n)
    }

    /// Iterate the encoded values of the whole range in ascending order.
    pub fn values(&self) -> impl Iterator<Item = String> + '_ {
        (self.start_value..=self.end_value).map(move |n| self.encoded_value(n))
    }

    /// Check the request against the service limits.
    ///
    /// Order matters for the reported error: the page ceiling is checked
    /// before the code-type selection.
    pub fn validate(&self, service: &ServiceConfig) -> Result<usize, CodeplateError> {
        let requested = self.page_count();
        if requested > service.max_pages as i128 {
            return Err(CodeplateError::RangeTooLarge {
                requested,
                max: service.max_pages,
            });
        }
        if !self.include_qr && !self.include_barcode {
            return Err(CodeplateError::NoCodeSelected);
        }
        if requested < 1 {
            return Err(CodeplateError::InvertedRange {
                start: self.start_value,
                end: self.end_value,
            });
        }
        Ok(requested as usize)
    }
}
