// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-tier font resolution.
//
// Text fields prefer a TrueType/OpenType font. When none can be loaded the
// built-in bitmap font is substituted silently: an unavailable font is never
// an error, only a `debug!` line.

use std::fmt;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info, instrument};

use labelwerk_core::types::MAX_FONT_SIZE;

use super::bitmap;

/// Font files tried, in order, when no explicit font is configured.
const PREFERRED_FILES: &[&str] = &[
    "msyh.ttc",
    "DejaVuSans.ttf",
    "NotoSansCJK-Regular.ttc",
    "LiberationSans-Regular.ttf",
    "Arial.ttf",
];

/// The font used for every text field of a render.
#[derive(Default)]
pub enum FontBook {
    /// A scalable font loaded from disk.
    Preferred { font: FontVec, source: PathBuf },
    /// The built-in 8x8 bitmap font.
    #[default]
    Builtin,
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preferred { source, .. } => {
                f.debug_struct("Preferred").field("source", source).finish()
            }
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontBook {
    /// The built-in bitmap font. Output depends on nothing outside the binary.
    pub fn builtin() -> Self {
        Self::Builtin
    }

    /// Load `path`, falling back to the built-in font on any failure.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        match load(path.as_ref()) {
            Some(book) => book,
            None => {
                debug!("preferred font unavailable, using built-in font");
                Self::Builtin
            }
        }
    }

    /// Resolve the font for a session: `explicit` if it loads, otherwise the
    /// first well-known font found in the platform font directories,
    /// otherwise the built-in font.
    #[instrument(skip_all)]
    pub fn discover(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit
            && let Some(book) = load(path)
        {
            return book;
        }

        for dir in font_dirs() {
            for name in PREFERRED_FILES {
                let candidate = dir.join(name);
                if candidate.is_file()
                    && let Some(book) = load(&candidate)
                {
                    return book;
                }
            }
        }

        debug!("no preferred font found, using built-in font");
        Self::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Rendered width of `text` at `size` pixels. Sizes above
    /// [`MAX_FONT_SIZE`] are measured and drawn at that size.
    pub fn measure(&self, text: &str, size: u32) -> u32 {
        let size = size.min(MAX_FONT_SIZE);
        match self {
            Self::Preferred { font, .. } => text_size(PxScale::from(size as f32), font, text).0,
            Self::Builtin => bitmap::measure(text, size),
        }
    }

    /// Draw `text` with the top-left of its line box at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: u32, color: Rgb<u8>) {
        let size = size.min(MAX_FONT_SIZE);
        match self {
            Self::Preferred { font, .. } => {
                draw_text_mut(canvas, color, x, y, PxScale::from(size as f32), font, text)
            }
            Self::Builtin => bitmap::draw(canvas, text, x, y, size, color),
        }
    }
}

fn load(path: &Path) -> Option<FontBook> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "font file unreadable");
            return None;
        }
    };
    // Index 0 selects the first face of a collection (.ttc).
    match FontVec::try_from_vec_and_index(data, 0) {
        Ok(font) => {
            info!(path = %path.display(), "font loaded");
            Some(FontBook::Preferred {
                font,
                source: path.to_path_buf(),
            })
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "font file invalid");
            None
        }
    }
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join(".fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs.extend(
        [
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/TTF",
            "/usr/share/fonts/dejavu",
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/opentype/noto",
            "/usr/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
        ]
        .map(PathBuf::from),
    );
    dirs
}
