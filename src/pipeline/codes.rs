//! Code rendering: one value → one standalone QR or Code128 raster.
//!
//! Both renderers return an image of exactly the requested pixel size, so
//! the composer can place it without knowing anything about symbologies.
//!
//! The two paths fail differently:
//!
//! * [`render_qr`] propagates encoder errors. A payload too long for any QR
//!   version is a real request error.
//! * [`render_barcode`] never fails. Text Code128 cannot carry (non-ASCII,
//!   control characters, empty input) produces a
//!   [`BarcodeRendering::Fallback`]: an outlined box with the text inside.
//!
//! Resizing a linear barcode to an arbitrary width distorts module widths
//! and may make it unscannable. Callers choose the box; the renderer fills it.

use crate::error::CodeplateError;
use crate::pipeline::text;
use barcoders::sym::code128::Code128;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use tracing::{debug, warn};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Light modules around the QR symbol.
pub const QR_BORDER_MODULES: u32 = 1;

/// Blank modules on each side of the Code128 bars.
pub const BARCODE_QUIET_ZONE_MODULES: u32 = 10;

/// Code128 character-set B selector understood by `barcoders`.
const CODE128_SET_B: char = 'Ɓ';

/// Outline thickness of the fallback box.
const FALLBACK_OUTLINE_PX: u32 = 2;

/// Largest RGB raster a single code may occupy.
pub const MAX_CODE_BYTES: u64 = 512 * 1024 * 1024;

/// Reject code boxes whose RGB raster would exceed [`MAX_CODE_BYTES`].
///
/// Sizes come straight from the request, so this runs before any code
/// buffer is allocated.
pub fn check_code_area(width: u32, height: u32) -> Result<(), CodeplateError> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|area| area.checked_mul(3));
    match bytes {
        Some(b) if b <= MAX_CODE_BYTES => Ok(()),
        _ => Err(CodeplateError::Composition(format!(
            "{width}x{height} px code exceeds the {} MiB raster limit",
            MAX_CODE_BYTES / (1024 * 1024)
        ))),
    }
}

// ── QR ───────────────────────────────────────────────────────────────────

/// Render `data` as a black-on-white QR code of exactly `size × size` px.
///
/// Error correction is fixed at level L; the symbol version is the smallest
/// that fits the payload. Sizes over [`MAX_CODE_BYTES`] are a
/// [`CodeplateError::Composition`] error.
pub fn render_qr(data: &str, size: u32) -> Result<RgbImage, CodeplateError> {
    check_code_area(size, size)?;
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L).map_err(|e| {
        CodeplateError::QrEncode {
            value: data.to_string(),
            detail: e.to_string(),
        }
    })?;

    let modules = code.width() as u32;
    let total = modules + 2 * QR_BORDER_MODULES;
    let box_px = (size / total).max(1);
    let dim = total * box_px;

    let mut img = RgbImage::from_pixel(dim, dim, WHITE);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = i as u32 % modules + QR_BORDER_MODULES;
        let my = i as u32 / modules + QR_BORDER_MODULES;
        fill_rect(&mut img, mx * box_px, my * box_px, box_px, box_px, text::BLACK);
    }

    debug!(data, modules, box_px, size, "Rendered QR code");
    Ok(fit(img, size, size))
}

// ── Barcode ──────────────────────────────────────────────────────────────

/// Outcome of a barcode rendering: always an image, sometimes a substitute.
#[derive(Debug, Clone)]
pub enum BarcodeRendering {
    /// Code128 bars scaled to the requested box.
    Encoded(RgbImage),
    /// The value could not be encoded; an outlined box with the text.
    Fallback { image: RgbImage, reason: String },
}

impl BarcodeRendering {
    pub fn image(&self) -> &RgbImage {
        match self {
            BarcodeRendering::Encoded(image) => image,
            BarcodeRendering::Fallback { image, .. } => image,
        }
    }

    pub fn into_image(self) -> RgbImage {
        match self {
            BarcodeRendering::Encoded(image) => image,
            BarcodeRendering::Fallback { image, .. } => image,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BarcodeRendering::Fallback { .. })
    }
}

/// Render `data` as a Code128 barcode of exactly `width × height` px.
///
/// `font_size` is only used by the fallback box. The box is allocated as
/// requested: check it with [`check_code_area`] first when the size comes
/// from untrusted input.
pub fn render_barcode(data: &str, width: u32, height: u32, font_size: u32) -> BarcodeRendering {
    match encode_code128(data) {
        Ok(modules) => {
            let bars = draw_bars(&modules);
            debug!(data, modules = modules.len(), width, height, "Rendered Code128 barcode");
            BarcodeRendering::Encoded(fit(bars, width, height))
        }
        Err(reason) => {
            warn!(data, %reason, "Code128 encoding failed, using text fallback");
            BarcodeRendering::Fallback {
                image: fallback_box(data, width, height, font_size),
                reason,
            }
        }
    }
}

/// Encode to a module sequence (1 = bar, 0 = space).
fn encode_code128(data: &str) -> Result<Vec<u8>, String> {
    if data.is_empty() {
        return Err("empty value".to_string());
    }
    // barcoders reads À, Ɓ and Ć as set switches, so they must not reach it.
    if let Some(c) = data.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(format!("{c:?} is outside Code128 character set B"));
    }
    let payload = format!("{CODE128_SET_B}{data}");
    let barcode = Code128::new(payload).map_err(|e| e.to_string())?;
    Ok(barcode.encode())
}

/// One pixel per module, one pixel tall; [`fit`] stretches it to the box.
fn draw_bars(modules: &[u8]) -> RgbImage {
    let width = modules.len() as u32 + 2 * BARCODE_QUIET_ZONE_MODULES;
    let mut img = RgbImage::from_pixel(width, 1, WHITE);
    for (i, &m) in modules.iter().enumerate() {
        if m == 1 {
            img.put_pixel(i as u32 + BARCODE_QUIET_ZONE_MODULES, 0, text::BLACK);
        }
    }
    img
}

fn fallback_box(data: &str, width: u32, height: u32, font_size: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    if width == 0 || height == 0 {
        return img;
    }

    let t = FALLBACK_OUTLINE_PX.min(width).min(height);
    fill_rect(&mut img, 0, 0, width, t, text::BLACK);
    fill_rect(&mut img, 0, height.saturating_sub(t), width, t, text::BLACK);
    fill_rect(&mut img, 0, 0, t, height, text::BLACK);
    fill_rect(&mut img, width.saturating_sub(t), 0, t, height, text::BLACK);

    let text_x = (width as i64 - text::text_width(data, font_size) as i64) / 2;
    let text_y = (height as i64 - font_size as i64) / 2;
    text::draw_text(&mut img, text_x, text_y, data, font_size, text::BLACK);
    img
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Nearest-neighbour resize to an exact box, keeping pure black and white.
fn fit(img: RgbImage, width: u32, height: u32) -> RgbImage {
    if width == 0 || height == 0 {
        return RgbImage::new(width, height);
    }
    if img.dimensions() == (width, height) {
        return img;
    }
    imageops::resize(&img, width, height, FilterType::Nearest)
}
