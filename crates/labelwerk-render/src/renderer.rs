// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label layout engine.
//
// Stacks fields top to bottom in field order, each horizontally centred.
// The same routine serves the live preview and every row of a batch run, and
// is a pure function of (fields, style, row): identical inputs give
// pixel-identical images.
//
// Fields are never shrunk or reflowed to fit. A stack taller than the label
// simply runs off the bottom edge.

use std::sync::Arc;

use image::{RgbImage, imageops};
use tracing::{debug, instrument};

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::{
    Color, DataRow, DisplayMode, FieldDefinition, LabelStyle, LabelTemplate,
};

use crate::qr::{QrCodeEncoder, QrEncoder, QrParams, scale_to, to_rgb};
use crate::text::FontBook;

/// Cursor position of the first field.
pub const TOP_MARGIN: i64 = 20;
/// Space added below a text field, on top of its font size.
pub const TEXT_SPACING: i64 = 10;
/// Space added below a QR code, on top of its size.
pub const QR_SPACING: i64 = 20;

/// What a placement draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Text { font_size: u32, color: Color },
    QrCode,
}

/// Where one field lands on the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub field: String,
    /// `prefix + value + suffix`.
    pub content: String,
    pub kind: PlacementKind,
    /// Left edge; negative when the content is wider than the label.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Composes label images. Cheap to clone and safe to share between the
/// preview and a running batch.
#[derive(Clone)]
pub struct LabelRenderer {
    fonts: Arc<FontBook>,
    qr: Arc<dyn QrEncoder>,
}

impl std::fmt::Debug for LabelRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRenderer")
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl Default for LabelRenderer {
    fn default() -> Self {
        Self::new(FontBook::builtin())
    }
}

impl LabelRenderer {
    pub fn new(fonts: FontBook) -> Self {
        Self::with_encoder(fonts, Arc::new(QrCodeEncoder::new()))
    }

    pub fn with_encoder(fonts: FontBook, qr: Arc<dyn QrEncoder>) -> Self {
        Self {
            fonts: Arc::new(fonts),
            qr,
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Compute where every field goes without drawing anything.
    ///
    /// The cursor starts at [`TOP_MARGIN`] and advances by
    /// `font_size + TEXT_SPACING` after a text field and by
    /// `qr_size + QR_SPACING` after a QR code, whatever the content length.
    pub fn layout(
        &self,
        fields: &[FieldDefinition],
        style: &LabelStyle,
        row: Option<&DataRow>,
    ) -> Vec<Placement> {
        let width = i64::from(style.width);
        let mut y = TOP_MARGIN;
        let mut placements = Vec::with_capacity(fields.len());

        for field in fields {
            let content = field.compose(row);
            let placement = match field.display_mode {
                DisplayMode::QrCode => {
                    let size = style.qr_size;
                    let placed = Placement {
                        field: field.name.clone(),
                        content,
                        kind: PlacementKind::QrCode,
                        x: (width - i64::from(size)).div_euclid(2),
                        y,
                        width: size,
                        height: size,
                    };
                    y += i64::from(size) + QR_SPACING;
                    placed
                }
                DisplayMode::Text => {
                    let size = field.font_size;
                    let measured = self.fonts.measure(&content, size);
                    let placed = Placement {
                        field: field.name.clone(),
                        kind: PlacementKind::Text {
                            font_size: size,
                            color: field.color.unwrap_or(style.text_color),
                        },
                        x: (width - i64::from(measured)).div_euclid(2),
                        y,
                        width: measured,
                        height: size,
                        content,
                    };
                    y += i64::from(size) + TEXT_SPACING;
                    placed
                }
            };
            placements.push(placement);
        }

        placements
    }

    /// Render one label. `row` is `None` for a preview without data; row
    /// fields then resolve to the empty string.
    #[instrument(skip_all, fields(fields = fields.len(), width = style.width, height = style.height))]
    pub fn render(
        &self,
        fields: &[FieldDefinition],
        style: &LabelStyle,
        row: Option<&DataRow>,
    ) -> Result<RgbImage> {
        let mut canvas = RgbImage::from_pixel(style.width, style.height, to_rgb(style.background));
        let placements = self.layout(fields, style, row);

        for placed in &placements {
            match placed.kind {
                PlacementKind::QrCode => {
                    let params = QrParams::label(style.qr_color, style.background);
                    let bitmap = self
                        .qr
                        .encode(&placed.content, &params)
                        .map_err(|e| with_field(&placed.field, e))?;
                    let scaled = scale_to(&bitmap, style.qr_size);
                    imageops::overlay(&mut canvas, &scaled, placed.x, placed.y);
                }
                PlacementKind::Text { font_size, color } => {
                    self.fonts.draw(
                        &mut canvas,
                        &placed.content,
                        saturate(placed.x),
                        saturate(placed.y),
                        font_size,
                        to_rgb(color),
                    );
                }
            }
        }

        if let Some(last) = placements.last()
            && last.y + i64::from(last.height) > i64::from(style.height)
        {
            debug!(
                bottom = last.y + i64::from(last.height),
                height = style.height,
                "fields overflow the label"
            );
        }
        Ok(canvas)
    }

    /// Render one label from a snapshot.
    pub fn render_template(&self, template: &LabelTemplate, row: Option<&DataRow>) -> Result<RgbImage> {
        self.render(&template.fields, &template.style, row)
    }
}

fn with_field(field: &str, err: LabelwerkError) -> LabelwerkError {
    match err {
        LabelwerkError::QrEncoding(msg) => LabelwerkError::QrEncoding(format!("field '{field}': {msg}")),
        other => other,
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use labelwerk_core::types::FieldSource;

    use crate::text::bitmap;

    fn text(name: &str, size: u32) -> FieldDefinition {
        let mut f = FieldDefinition::column(name);
        f.font_size = size;
        f
    }

    fn qr(name: &str) -> FieldDefinition {
        let mut f = FieldDefinition::column(name);
        f.display_mode = DisplayMode::QrCode;
        f
    }

    fn row(pairs: &[(&str, &str)]) -> DataRow {
        pairs.iter().copied().collect()
    }

    #[test]
    fn cursor_advance_is_independent_of_content() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let fields = [text("a", 16), qr("b"), text("c", 24), text("d", 8)];

        let short = renderer.layout(&fields, &style, Some(&row(&[("a", "x"), ("b", "1")])));
        let long = renderer.layout(
            &fields,
            &style,
            Some(&row(&[("a", "a much longer value"), ("b", "9".repeat(300).as_str())])),
        );

        let ys: Vec<i64> = short.iter().map(|p| p.y).collect();
        assert_eq!(ys, [20, 20 + 16 + 10, 46 + 150 + 20, 216 + 24 + 10]);
        assert_eq!(ys, long.iter().map(|p| p.y).collect::<Vec<_>>());
    }

    #[test]
    fn content_is_centred_horizontally() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let mut name = text("name", 16);
        name.prefix = "Name: ".into();

        let placed = renderer.layout(&[qr("id"), name], &style, Some(&row(&[("name", "Ada")])));

        assert_eq!(placed[0].x, (300 - 150) / 2);
        let measured = bitmap::measure("Name: Ada", 16) as i64;
        assert_eq!(placed[1].content, "Name: Ada");
        assert_eq!(placed[1].x, (300 - measured) / 2);
    }

    #[test]
    fn wide_text_starts_left_of_the_label() {
        let renderer = LabelRenderer::default();
        let mut style = LabelStyle::default();
        style.width = 40;
        let placed = renderer.layout(&[text("t", 16)], &style, Some(&row(&[("t", "abcdef")])));
        // 6 cells * 16 px = 96 px; floor((40 - 96) / 2) = -28
        assert_eq!(placed[0].x, -28);
        assert!(renderer.render(&[text("t", 16)], &style, Some(&row(&[("t", "abcdef")]))).is_ok());
    }

    #[test]
    fn render_is_deterministic() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let fields = [qr("id"), text("name", 16)];
        let data = row(&[("id", "A-1"), ("name", "Widget")]);

        let first = renderer.render(&fields, &style, Some(&data)).unwrap();
        let second = renderer.render(&fields, &style, Some(&data)).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn canvas_has_style_size_and_background() {
        let renderer = LabelRenderer::default();
        let mut style = LabelStyle::default();
        style.width = 120;
        style.height = 60;
        style.background = Color::rgb(10, 20, 30);

        let img = renderer.render(&[], &style, None).unwrap();
        assert_eq!(img.dimensions(), (120, 60));
        assert!(img.pixels().all(|p| *p == Rgb([10, 20, 30])));
    }

    #[test]
    fn qr_uses_style_colors_at_cursor() {
        let renderer = LabelRenderer::default();
        let mut style = LabelStyle::default();
        style.qr_color = Color::rgb(0, 0, 255);

        let img = renderer.render(&[qr("id")], &style, Some(&row(&[("id", "42")]))).unwrap();

        // Above the QR: untouched background.
        assert_eq!(*img.get_pixel(150, 10), Rgb([255, 255, 255]));
        // Inside the top-left finder pattern of the QR pasted at (75, 20).
        let scale = 150.0 / 125.0;
        let px = 75 + (12.0 * scale) as u32;
        let py = 20 + (12.0 * scale) as u32;
        assert_eq!(*img.get_pixel(px, py), Rgb([0, 0, 255]));
    }

    #[test]
    fn text_color_falls_back_to_style_default() {
        let renderer = LabelRenderer::default();
        let mut style = LabelStyle::default();
        style.text_color = Color::rgb(0, 128, 0);
        let mut red = text("b", 16);
        red.color = Some(Color::rgb(255, 0, 0));

        let placed = renderer.layout(&[text("a", 16), red], &style, None);
        assert_eq!(
            placed[0].kind,
            PlacementKind::Text { font_size: 16, color: Color::rgb(0, 128, 0) }
        );
        assert_eq!(
            placed[1].kind,
            PlacementKind::Text { font_size: 16, color: Color::rgb(255, 0, 0) }
        );
    }

    #[test]
    fn text_pixels_use_field_color() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let mut field = text("t", 16);
        field.color = Some(Color::rgb(200, 0, 0));

        let img = renderer.render(&[field], &style, Some(&row(&[("t", "HELLO")]))).unwrap();
        assert!(img.pixels().any(|p| *p == Rgb([200, 0, 0])));
    }

    #[test]
    fn preview_without_row_renders_literals_and_decorations() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let mut lit = FieldDefinition::literal("lot");
        lit.source = FieldSource::Literal("L-9".into());
        let mut col = text("name", 16);
        col.prefix = "N:".into();

        let placed = renderer.layout(&[lit, col], &style, None);
        assert_eq!(placed[0].content, "L-9");
        assert_eq!(placed[1].content, "N:");
    }

    #[test]
    fn overflow_is_not_an_error() {
        let renderer = LabelRenderer::default();
        let mut style = LabelStyle::default();
        style.height = 50;
        let fields = [qr("a"), qr("b"), text("c", 32)];

        let img = renderer.render(&fields, &style, None).unwrap();
        assert_eq!(img.dimensions(), (300, 50));
    }

    #[test]
    fn oversized_font_renders_without_panicking() {
        let renderer = LabelRenderer::default();
        let style = LabelStyle::default();
        let fields = [text("name", 4_000_000_000), text("next", 16)];
        let data = row(&[("name", "ab")]);

        let placed = renderer.layout(&fields, &style, Some(&data));
        assert_eq!(placed[1].y, 20 + 4_000_000_000 + 10);

        let img = renderer.render(&fields, &style, Some(&data)).unwrap();
        assert_eq!(img.dimensions(), (300, 400));
    }

    #[test]
    fn unencodable_qr_reports_the_field() {
        let renderer = LabelRenderer::default();
        let huge = "x".repeat(5000);
        let err = renderer
            .render(&[qr("code")], &LabelStyle::default(), Some(&row(&[("code", huge.as_str())])))
            .unwrap_err();
        match err {
            LabelwerkError::QrEncoding(msg) => assert!(msg.contains("field 'code'")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
