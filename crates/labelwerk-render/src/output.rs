// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label output — PNG encoding, saving and the framed preview.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage, imageops};
use tracing::debug;

use labelwerk_core::error::{LabelwerkError, Result};

/// Width of the grey frame drawn around a preview.
pub const PREVIEW_MARGIN: u32 = 10;
/// Frame color of the preview.
pub const PREVIEW_FRAME: Rgb<u8> = Rgb([0xF0, 0xF0, 0xF0]);

/// Encode a label as PNG bytes.
pub fn to_png_bytes(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| LabelwerkError::ImageError(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

/// Write a label to `path` as PNG, whatever the extension says.
pub fn save_png(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    image
        .save_with_format(path.as_ref(), ImageFormat::Png)
        .map_err(|err| {
            LabelwerkError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
    debug!(path = %path.as_ref().display(), "label written");
    Ok(())
}

/// The label pasted onto a light-grey frame, as shown in the preview pane.
pub fn framed_preview(label: &RgbImage) -> RgbImage {
    let (w, h) = label.dimensions();
    let mut framed = RgbImage::from_pixel(
        w + 2 * PREVIEW_MARGIN,
        h + 2 * PREVIEW_MARGIN,
        PREVIEW_FRAME,
    );
    imageops::replace(
        &mut framed,
        label,
        i64::from(PREVIEW_MARGIN),
        i64::from(PREVIEW_MARGIN),
    );
    framed
}
