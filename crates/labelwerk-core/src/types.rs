// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Labelwerk label composer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LabelwerkError, Result};

/// Font size given to every newly created field.
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Largest font size a field accepts.
pub const MAX_FONT_SIZE: u32 = 1000;

/// Unique identifier for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An opaque RGB color. Serialised as a `#RRGGBB` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or the short form `#RGB`. The leading `#` is optional.
    pub fn from_hex(text: &str) -> Result<Self> {
        let invalid = || LabelwerkError::InvalidColor(text.to_string());
        let digits = text.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                // #abc == #aabbcc
                let expand = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = LabelwerkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = LabelwerkError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// How a field is drawn on the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Styled text, horizontally centred.
    #[default]
    Text,
    /// A QR code encoding the composed content.
    #[serde(rename = "qrcode")]
    QrCode,
}

/// Where a field's raw value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Read the column of the same name from the current data row.
    FromRow,
    /// A fixed value set by configuration (a "custom field").
    Literal(String),
}

impl FieldSource {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// One field to render, together with its per-field settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub source: FieldSource,
    pub display_mode: DisplayMode,
    pub prefix: String,
    pub suffix: String,
    /// Point size for text fields. Has no effect on QR fields.
    pub font_size: u32,
    /// Text color; `None` uses the style's default text color.
    pub color: Option<Color>,
}

impl FieldDefinition {
    /// A text field reading the column `name` from each row.
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FieldSource::FromRow,
            display_mode: DisplayMode::Text,
            prefix: String::new(),
            suffix: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: None,
        }
    }

    /// A custom field with an empty literal value.
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            source: FieldSource::Literal(String::new()),
            ..Self::column(name)
        }
    }

    /// Resolve the raw value for `row`. A missing row or missing column
    /// yields the empty string.
    pub fn resolve<'a>(&'a self, row: Option<&'a DataRow>) -> &'a str {
        match &self.source {
            FieldSource::Literal(value) => value,
            FieldSource::FromRow => row.and_then(|r| r.get(&self.name)).unwrap_or(""),
        }
    }

    /// `prefix + value + suffix` for the given row.
    pub fn compose(&self, row: Option<&DataRow>) -> String {
        format!("{}{}{}", self.prefix, self.resolve(row), self.suffix)
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Global label settings shared by every field unless overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub width: u32,
    pub height: u32,
    /// Edge length in pixels of every QR code on the label.
    pub qr_size: u32,
    pub background: Color,
    pub text_color: Color,
    pub qr_color: Color,
}

impl LabelStyle {
    /// Build a style, rejecting non-positive dimensions.
    pub fn with_dimensions(width: i64, height: i64, qr_size: i64) -> Result<Self> {
        Ok(Self {
            width: positive("label width", width)?,
            height: positive("label height", height)?,
            qr_size: positive("QR size", qr_size)?,
            ..Self::default()
        })
    }

    /// Replace the dimensions in place. On error `self` is left unchanged.
    pub fn resize(&mut self, width: i64, height: i64, qr_size: i64) -> Result<()> {
        let sized = Self::with_dimensions(width, height, qr_size)?;
        self.width = sized.width;
        self.height = sized.height;
        self.qr_size = sized.qr_size;
        Ok(())
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            width: 300,
            height: 400,
            qr_size: 150,
            background: Color::WHITE,
            text_color: Color::BLACK,
            qr_color: Color::BLACK,
        }
    }
}

fn positive(what: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(LabelwerkError::InvalidDimension { what, value })
}

/// An immutable snapshot of everything needed to render labels: the ordered
/// field definitions and the style. Taken once per batch run so concurrent
/// edits never reach an in-flight run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTemplate {
    pub fields: Vec<FieldDefinition>,
    pub style: LabelStyle,
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// One record of the dataset: column name -> textual value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRow {
    values: HashMap<String, String>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DataRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered table of rows with named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<DataRow>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row given as cell values in column order. Missing trailing
    /// cells become empty strings; extra cells are ignored.
    pub fn push_cells<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cells = cells.into_iter();
        let row = self
            .columns
            .iter()
            .map(|column| {
                let value = cells.next().map(Into::into).unwrap_or_default();
                (column.clone(), value)
            })
            .collect();
        self.rows.push(row);
    }

    pub fn push_row(&mut self, row: DataRow) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    /// The row shown by a preview for a 1-based row number. Out-of-range
    /// numbers fall back to the first row.
    pub fn preview_row(&self, number: usize) -> Option<(usize, &DataRow)> {
        match number.checked_sub(1).and_then(|i| self.rows.get(i).map(|r| (i, r))) {
            Some(found) => Some(found),
            None => self.rows.first().map(|r| (0, r)),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#FF8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("#f80").unwrap(), Color::rgb(255, 136, 0));
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102FF");
    }

    #[test]
    fn color_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("red").is_err());
        assert!(Color::from_hex("#+1+2+3").is_err());
    }

    #[test]
    fn compose_wraps_value_in_prefix_and_suffix() {
        let mut field = FieldDefinition::column("name");
        field.prefix = "Name: ".into();
        field.suffix = "!".into();
        let row: DataRow = [("name", "Ada")].into_iter().collect();

        assert_eq!(field.compose(Some(&row)), "Name: Ada!");
        // Preview without data renders the decorations around an empty value.
        assert_eq!(field.compose(None), "Name: !");
    }

    #[test]
    fn literal_ignores_row() {
        let mut field = FieldDefinition::literal("batch");
        field.source = FieldSource::Literal("B-7".into());
        let row: DataRow = [("batch", "from-row")].into_iter().collect();
        assert_eq!(field.resolve(Some(&row)), "B-7");
    }

    #[test]
    fn style_rejects_non_positive_dimensions() {
        let mut style = LabelStyle::default();
        assert!(style.resize(0, 400, 150).is_err());
        assert!(style.resize(300, -1, 150).is_err());
        assert_eq!(style, LabelStyle::default());

        style.resize(200, 100, 80).unwrap();
        assert_eq!((style.width, style.height, style.qr_size), (200, 100, 80));
    }

    #[test]
    fn push_cells_pads_missing_values() {
        let mut ds = Dataset::new(vec!["id".into(), "name".into()]);
        ds.push_cells(["1"]);
        assert_eq!(ds.row(0).unwrap().get("id"), Some("1"));
        assert_eq!(ds.row(0).unwrap().get("name"), Some(""));
    }

    #[test]
    fn preview_row_falls_back_to_first() {
        let mut ds = Dataset::new(vec!["id".into()]);
        ds.push_cells(["a"]);
        ds.push_cells(["b"]);

        assert_eq!(ds.preview_row(2).map(|(i, _)| i), Some(1));
        assert_eq!(ds.preview_row(0).map(|(i, _)| i), Some(0));
        assert_eq!(ds.preview_row(9).map(|(i, _)| i), Some(0));
        assert!(Dataset::default().preview_row(1).is_none());
    }
}
