// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR encoding service.
//
// Turns a text payload into a two-color bitmap. The layout engine only picks
// the parameters; everything about the symbol itself (version, masking) is
// left to the `qrcode` crate.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::Color;

/// Pixels per QR module before scaling.
pub const QR_BOX_SIZE: u32 = 5;
/// Quiet-zone width in modules.
pub const QR_BORDER: u32 = 2;

/// Rendering parameters for one QR bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrParams {
    pub box_size: u32,
    pub border: u32,
    pub foreground: Color,
    pub background: Color,
}

impl QrParams {
    /// The fixed module geometry used on labels, in the given colors.
    pub fn label(foreground: Color, background: Color) -> Self {
        Self {
            box_size: QR_BOX_SIZE,
            border: QR_BORDER,
            foreground,
            background,
        }
    }
}

/// Anything that can turn a payload into a QR bitmap.
pub trait QrEncoder: Send + Sync {
    /// Encode `payload` at `params.box_size` pixels per module. The result is
    /// square and includes the quiet zone.
    fn encode(&self, payload: &str, params: &QrParams) -> Result<RgbImage>;
}

/// Encoder backed by the `qrcode` crate: smallest version that fits, medium
/// error correction.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeEncoder {
    ec_level: EcLevel,
}

impl QrCodeEncoder {
    pub fn new() -> Self {
        Self {
            ec_level: EcLevel::M,
        }
    }

    pub fn with_ec_level(ec_level: EcLevel) -> Self {
        Self { ec_level }
    }
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, payload: &str, params: &QrParams) -> Result<RgbImage> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| LabelwerkError::QrEncoding(format!("{e} ({} bytes)", payload.len())))?;

        let modules = code.width() as u32;
        let box_size = params.box_size.max(1);
        let side = (modules + 2 * params.border) * box_size;
        let dark = to_rgb(params.foreground);
        let mut img = RgbImage::from_pixel(side, side, to_rgb(params.background));

        for (i, color) in code.to_colors().iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let x = (i as u32) % modules + params.border;
            let y = (i as u32) / modules + params.border;
            draw_filled_rect_mut(
                &mut img,
                Rect::at((x * box_size) as i32, (y * box_size) as i32).of_size(box_size, box_size),
                dark,
            );
        }

        debug!(modules, side, "QR code encoded");
        Ok(img)
    }
}

/// Scale a QR bitmap to `size` x `size`. Nearest-neighbour keeps module
/// edges sharp.
pub fn scale_to(qr: &RgbImage, size: u32) -> RgbImage {
    imageops::resize(qr, size, size, FilterType::Nearest)
}

pub(crate) fn to_rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> QrParams {
        QrParams::label(Color::BLACK, Color::WHITE)
    }

    #[test]
    fn encodes_square_bitmap_with_quiet_zone() {
        let img = QrCodeEncoder::new().encode("12345", &params()).unwrap();
        // Version 1 is 21 modules; 2-module border each side, 5 px per module.
        assert_eq!(img.dimensions(), (125, 125));
        // Quiet zone is background.
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
        // Top-left finder pattern starts right after the border.
        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn uses_requested_colors() {
        let p = QrParams::label(Color::rgb(0, 0, 200), Color::rgb(250, 250, 0));
        let img = QrCodeEncoder::new().encode("x", &p).unwrap();
        assert_eq!(*img.get_pixel(0, 0), Rgb([250, 250, 0]));
        assert_eq!(*img.get_pixel(12, 12), Rgb([0, 0, 200]));
    }

    #[test]
    fn oversized_payload_is_an_encoding_error() {
        let payload = "x".repeat(5000);
        let err = QrCodeEncoder::new().encode(&payload, &params()).unwrap_err();
        assert!(matches!(err, LabelwerkError::QrEncoding(_)));
    }

    #[test]
    fn empty_payload_still_encodes() {
        assert!(QrCodeEncoder::new().encode("", &params()).is_ok());
    }

    #[test]
    fn scale_to_is_exact() {
        let img = QrCodeEncoder::new().encode("abc", &params()).unwrap();
        assert_eq!(scale_to(&img, 150).dimensions(), (150, 150));
    }
}
