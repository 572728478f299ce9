// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in 8x8 bitmap font, the last tier of font resolution. Always
// available, so text can be drawn even on systems without any TrueType
// fonts installed.

use font8x8::{BASIC_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Glyph cell edge in unscaled pixels.
pub const CELL: u32 = 8;

/// Integer magnification for a requested font size.
pub fn scale_for(size: u32) -> u32 {
    (size / CELL).max(1)
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
}

/// Advance width of `text` in pixels. Every character occupies one cell,
/// including characters the font has no glyph for.
/// Saturates at `u32::MAX`.
pub fn measure(text: &str, size: u32) -> u32 {
    let width = (text.chars().count() as u64)
        .saturating_mul(u64::from(CELL))
        .saturating_mul(u64::from(scale_for(size)));
    u32::try_from(width).unwrap_or(u32::MAX)
}

/// Draw `text` with its top-left corner at (`x`, `y`). Pixels falling
/// outside the canvas are clipped.
pub fn draw(canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: u32, color: Rgb<u8>) {
    let scale = scale_for(size);
    let step = i64::from(scale) * i64::from(CELL);
    let (width, height) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for (i, ch) in text.chars().enumerate() {
        let origin_x = i64::from(x).saturating_add((i as i64).saturating_mul(step));
        if origin_x >= width {
            break;
        }
        let Some(rows) = glyph(ch) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            let py = i64::from(y) + row as i64 * i64::from(scale);
            if py >= height {
                break;
            }
            for col in 0..CELL {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + i64::from(col) * i64::from(scale);
                if px >= width || px + i64::from(scale) <= 0 || py + i64::from(scale) <= 0 {
                    continue;
                }
                // Only the visible part of the module is drawn.
                let (left, top) = (px.max(0), py.max(0));
                let right = (px + i64::from(scale)).min(width);
                let bottom = (py + i64::from(scale)).min(height);
                draw_filled_rect_mut(
                    canvas,
                    Rect::at(left as i32, top as i32)
                        .of_size((right - left) as u32, (bottom - top) as u32),
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_scales_with_size() {
        assert_eq!(measure("abc", 8), 24);
        assert_eq!(measure("abc", 16), 48);
        assert_eq!(measure("abc", 4), 24);
        assert_eq!(measure("", 16), 0);
    }

    #[test]
    fn draw_marks_pixels_inside_the_cell() {
        let mut canvas = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        draw(&mut canvas, "H", 4, 4, 16, Rgb([0, 0, 0]));

        let inked = canvas.pixels().filter(|p| p.0 == [0, 0, 0]).count();
        assert!(inked > 0);
        // Nothing is drawn outside the 16x16 cell at (4, 4).
        for (x, y, p) in canvas.enumerate_pixels() {
            if p.0 == [0, 0, 0] {
                assert!((4..20).contains(&x) && (4..20).contains(&y), "ink at {x},{y}");
            }
        }
    }

    #[test]
    fn huge_sizes_saturate_instead_of_overflowing() {
        assert_eq!(measure("ab", 4_000_000_000), u32::MAX);

        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        draw(&mut canvas, "ab", 0, 0, 4_000_000_000, Rgb([0, 0, 0]));
        draw(&mut canvas, "ab", i32::MAX - 4, i32::MAX - 4, 64, Rgb([0, 0, 0]));
        assert_eq!(canvas.dimensions(), (20, 20));
    }

    #[test]
    fn draw_clips_at_canvas_edges() {
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        draw(&mut canvas, "WWWW", -6, 5, 16, Rgb([0, 0, 0]));
        assert_eq!(canvas.dimensions(), (10, 10));
    }
}
