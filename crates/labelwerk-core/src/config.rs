// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted label configuration.
//
// The JSON document exported by "save config" and read back by "load config".
// Every key is optional so documents written by older (or newer) versions
// still load; unknown keys are ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{LabelwerkError, Result};
use crate::types::{Color, DisplayMode, LabelStyle, MAX_FONT_SIZE};

/// A font size as it may appear in a stored document: either a JSON number
/// or a numeric string (older exports wrote the combo-box text verbatim).
/// Anything else is kept as-is and read as "no size".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSizeValue {
    Number(u32),
    Text(String),
    Other(serde_json::Value),
}

impl FontSizeValue {
    /// The size, if it is an integer in `1..=MAX_FONT_SIZE`.
    pub fn get(&self) -> Option<u32> {
        let size = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
            Self::Other(_) => return None,
        };
        (1..=MAX_FONT_SIZE).contains(&size).then_some(size)
    }
}

impl From<u32> for FontSizeValue {
    fn from(size: u32) -> Self {
        Self::Number(size)
    }
}

/// Persistent label settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub label_width: i64,
    pub label_height: i64,
    pub qr_size: i64,
    /// Directory under which each batch run creates its own subdirectory.
    pub output_dir: PathBuf,
    pub bg_color: Color,
    pub text_color: Color,
    pub qr_color: Color,
    /// Optional TrueType/OpenType file preferred for text fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_file: Option<PathBuf>,
    pub field_order: Vec<String>,
    pub field_display_types: BTreeMap<String, DisplayMode>,
    pub field_prefixes: BTreeMap<String, String>,
    pub field_suffixes: BTreeMap<String, String>,
    pub field_font_sizes: BTreeMap<String, FontSizeValue>,
    pub field_colors: BTreeMap<String, Color>,
    /// Literal values of custom fields.
    pub custom_fields: BTreeMap<String, String>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let style = LabelStyle::default();
        Self::from_style(
            &style,
            &std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        )
    }
}

impl ConfigDocument {
    /// A document carrying `style` and `output_dir` with no field settings.
    pub fn from_style(style: &LabelStyle, output_dir: &Path) -> Self {
        Self {
            label_width: i64::from(style.width),
            label_height: i64::from(style.height),
            qr_size: i64::from(style.qr_size),
            output_dir: output_dir.to_path_buf(),
            bg_color: style.background,
            text_color: style.text_color,
            qr_color: style.qr_color,
            font_file: None,
            field_order: Vec::new(),
            field_display_types: BTreeMap::new(),
            field_prefixes: BTreeMap::new(),
            field_suffixes: BTreeMap::new(),
            field_font_sizes: BTreeMap::new(),
            field_colors: BTreeMap::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    /// The label style described by this document. Non-positive dimensions
    /// are a configuration error.
    pub fn style(&self) -> Result<LabelStyle> {
        let mut style =
            LabelStyle::with_dimensions(self.label_width, self.label_height, self.qr_size)?;
        style.background = self.bg_color;
        style.text_color = self.text_color;
        style.qr_color = self.qr_color;
        Ok(style)
    }

    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LabelwerkError::ConfigParse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and parse a document from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let doc = Self::from_json(&text)?;
        debug!(fields = doc.field_order.len(), "configuration loaded");
        Ok(doc)
    }

    /// Write the document to disk as pretty-printed JSON.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!("configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let doc = ConfigDocument::from_json("{}").unwrap();
        assert_eq!(doc.style().unwrap(), LabelStyle::default());
        assert!(doc.field_order.is_empty());
    }

    #[test]
    fn reads_legacy_document() {
        let doc = ConfigDocument::from_json(
            r##"{
                "label_width": 320,
                "label_height": 200,
                "qr_size": 120,
                "bg_color": "#ffffee",
                "field_order": ["id", "name"],
                "field_display_types": {"id": "qrcode", "name": "text"},
                "field_font_sizes": {"name": "20", "id": 12},
                "custom_fields": {},
                "some_future_key": true
            }"##,
        )
        .unwrap();

        let style = doc.style().unwrap();
        assert_eq!((style.width, style.height, style.qr_size), (320, 200, 120));
        assert_eq!(style.background, Color::rgb(0xFF, 0xFF, 0xEE));
        assert_eq!(doc.field_display_types["id"], DisplayMode::QrCode);
        assert_eq!(doc.field_font_sizes["name"].get(), Some(20));
        assert_eq!(doc.field_font_sizes["id"].get(), Some(12));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ConfigDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, LabelwerkError::ConfigParse(_)));

        let err = ConfigDocument::from_json(r##"{"bg_color": "#zzzzzz"}"##).unwrap_err();
        assert!(matches!(err, LabelwerkError::ConfigParse(_)));
    }

    #[test]
    fn bad_font_size_text_is_ignored() {
        assert_eq!(FontSizeValue::Text("big".into()).get(), None);
        assert_eq!(FontSizeValue::Number(0).get(), None);
    }

    #[test]
    fn odd_font_sizes_load_as_no_size() {
        let doc = ConfigDocument::from_json(
            r#"{"field_font_sizes": {"a": -5, "b": 16.0, "c": [12], "d": 4000000000, "e": "24"}}"#,
        )
        .unwrap();
        let size = |name: &str| doc.field_font_sizes[name].get();

        assert_eq!(size("a"), None);
        assert_eq!(size("b"), None);
        assert_eq!(size("c"), None);
        assert_eq!(size("d"), None);
        assert_eq!(size("e"), Some(24));
    }

    #[test]
    fn invalid_dimensions_surface_from_style() {
        let doc = ConfigDocument::from_json(r#"{"label_width": 0}"#).unwrap();
        assert!(matches!(
            doc.style(),
            Err(LabelwerkError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label_config.json");

        let mut doc = ConfigDocument::from_style(&LabelStyle::default(), dir.path());
        doc.field_order = vec!["id".into()];
        doc.field_display_types.insert("id".into(), DisplayMode::QrCode);
        doc.field_colors.insert("id".into(), Color::rgb(1, 2, 3));
        doc.save(&path).unwrap();

        let loaded = ConfigDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"qrcode\""));
        assert!(raw.contains("\"#010203\""));
    }
}
