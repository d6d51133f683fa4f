//! Page composition: template + one encoded value → one stamped page.

use crate::config::{GenerationConfig, ServiceConfig};
use crate::error::CodeplateError;
use crate::pipeline::codes::{self, BarcodeRendering};
use crate::pipeline::template::Template;
use crate::pipeline::text;
use image::imageops;
use image::RgbImage;
use tracing::debug;

/// Stamp `value` onto a copy of `template` according to `config`.
///
/// QR first, then barcode. Codes are pasted opaquely at their configured
/// top-left corner with no bounds check; anything outside the canvas is
/// clipped. When a code's `show_*_text` flag is set, `value` is drawn
/// `text_offset_y` pixels below the bottom edge of that code.
///
/// The template is never modified, so one instance serves a whole batch.
pub fn compose_page(
    template: &Template,
    value: &str,
    config: &GenerationConfig,
    service: &ServiceConfig,
) -> Result<RgbImage, CodeplateError> {
    let mut page = template.raster().clone();

    if config.include_qr {
        let qr = codes::render_qr(value, config.qr_size)?;
        paste(&mut page, &qr, config.qr_x, config.qr_y);

        if config.show_qr_text {
            let text_y = label_y(config.qr_y, config.qr_size, config.text_offset_y);
            text::draw_text(&mut page, config.qr_x, text_y, value, service.font_size, text::BLACK);
        }
    }

    if config.include_barcode {
        codes::check_code_area(config.barcode_width, config.barcode_height)?;
        let barcode = codes::render_barcode(
            value,
            config.barcode_width,
            config.barcode_height,
            service.font_size,
        );
        if let BarcodeRendering::Fallback { reason, .. } = &barcode {
            debug!(value, %reason, "Stamping barcode fallback");
        }
        paste(&mut page, barcode.image(), config.barcode_x, config.barcode_y);

        if config.show_barcode_text {
            let text_y = label_y(config.barcode_y, config.barcode_height, config.text_offset_y);
            text::draw_text(
                &mut page,
                config.barcode_x,
                text_y,
                value,
                service.font_size,
                text::BLACK,
            );
        }
    }

    Ok(page)
}

/// Top of a label drawn `offset` px below a code of height `size` at `y`.
fn label_y(y: i64, size: u32, offset: i64) -> i64 {
    y.saturating_add(i64::from(size)).saturating_add(offset)
}

/// Opaque paste with the corner pulled in to just outside the canvas, so
/// extreme placements clip without coordinate overflow.
fn paste(page: &mut RgbImage, code: &RgbImage, x: i64, y: i64) {
    let x = x.clamp(-i64::from(code.width()), i64::from(page.width()));
    let y = y.clamp(-i64::from(code.height()), i64::from(page.height()));
    imageops::replace(page, code, x, y);
}
