//! Label drawing with a fixed bitmap font.
//!
//! Labels are plain ASCII serials such as `ID-1001`, so an embedded 8×8
//! bitmap font (`font8x8`) is enough and keeps the service free of font
//! files. Each glyph is scaled with nearest-neighbour sampling to a square
//! cell of `size` pixels. Characters outside the font print as `?`.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

const GLYPH_PX: u32 = 8;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Width in pixels of `text` drawn with cell size `size`.
pub fn text_width(text: &str, size: u32) -> u32 {
    (text.chars().count() as u32).saturating_mul(size)
}

/// Draw `text` with its top-left corner at `(x, y)`.
///
/// No wrapping; pixels falling outside the canvas are dropped.
pub fn draw_text(canvas: &mut RgbImage, x: i64, y: i64, text: &str, size: u32, color: Rgb<u8>) {
    if size == 0 {
        return;
    }
    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x.saturating_add((i as i64).saturating_mul(i64::from(size)));
        draw_glyph(canvas, origin_x, y, &glyph, size, color);
    }
}

fn draw_glyph(canvas: &mut RgbImage, x: i64, y: i64, glyph: &[u8; 8], size: u32, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    for cy in 0..size {
        let py = y.saturating_add(i64::from(cy));
        if py < 0 || py >= h {
            continue;
        }
        let row = glyph[(u64::from(cy) * u64::from(GLYPH_PX) / u64::from(size)) as usize];
        for cx in 0..size {
            let px = x.saturating_add(i64::from(cx));
            if px < 0 || px >= w {
                continue;
            }
            let bit = u64::from(cx) * u64::from(GLYPH_PX) / u64::from(size);
            if row & (1 << bit) != 0 {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn dark_pixels(img: &RgbImage) -> usize {
        img.pixels().filter(|p| p.0 == [0, 0, 0]).count()
    }

    #[test]
    fn text_width_scales_with_cell() {
        assert_eq!(text_width("ID-1", 12), 48);
        assert_eq!(text_width("", 12), 0);
    }

    #[test]
    fn draws_inside_the_text_box_only() {
        let mut img = RgbImage::from_pixel(100, 40, WHITE);
        draw_text(&mut img, 10, 5, "AB", 12, BLACK);
        assert!(dark_pixels(&img) > 0);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0 == [0, 0, 0] {
                assert!((10..34).contains(&x) && (5..17).contains(&y), "stray pixel at {x},{y}");
            }
        }
    }

    #[test]
    fn clipping_outside_canvas_is_silent() {
        let mut img = RgbImage::from_pixel(20, 20, WHITE);
        draw_text(&mut img, -100, -100, "HELLO", 12, BLACK);
        draw_text(&mut img, 15, 15, "HELLO", 12, BLACK);
        draw_text(&mut img, 500, 500, "HELLO", 12, BLACK);
        assert!(dark_pixels(&img) > 0);
    }

    #[test]
    fn extreme_origins_do_not_overflow() {
        let mut img = RgbImage::from_pixel(20, 20, WHITE);
        draw_text(&mut img, i64::MAX, i64::MAX, "ID-1", 12, BLACK);
        draw_text(&mut img, i64::MIN, i64::MIN, "ID-1", 12, BLACK);
        draw_text(&mut img, i64::MAX - 5, 0, "ID-1", 12, BLACK);
        assert_eq!(dark_pixels(&img), 0);
    }

    #[test]
    fn space_draws_nothing() {
        let mut img = RgbImage::from_pixel(20, 20, WHITE);
        draw_text(&mut img, 0, 0, " ", 12, BLACK);
        assert_eq!(dark_pixels(&img), 0);
    }

    #[test]
    fn non_ascii_falls_back_to_question_mark() {
        let mut a = RgbImage::from_pixel(16, 16, WHITE);
        let mut b = RgbImage::from_pixel(16, 16, WHITE);
        draw_text(&mut a, 0, 0, "€", 8, BLACK);
        draw_text(&mut b, 0, 0, "?", 8, BLACK);
        assert_eq!(a, b);
    }
}
