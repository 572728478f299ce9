// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field configuration store.
//
// Owns the ordered list of field names (the field order) and one definition
// per name. Every mutation keeps the two in sync: each name in the order has
// exactly one definition and no definition exists outside the order.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::config::ConfigDocument;
use crate::error::{LabelwerkError, Result};
use crate::types::{
    Color, DEFAULT_FONT_SIZE, DisplayMode, FieldDefinition, FieldSource, LabelStyle, LabelTemplate,
    MAX_FONT_SIZE,
};

/// Ordered field definitions driving label layout.
#[derive(Debug, Clone, Default)]
pub struct FieldConfigStore {
    order: Vec<String>,
    definitions: HashMap<String, FieldDefinition>,
}

impl FieldConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Queries --------------------------------------------------------------

    /// Field names in render order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Field definitions in render order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }

    /// Take an owned snapshot of the fields together with `style`.
    pub fn template(&self, style: &LabelStyle) -> LabelTemplate {
        LabelTemplate {
            fields: self.fields().cloned().collect(),
            style: style.clone(),
        }
    }

    // -- Dataset binding ------------------------------------------------------

    /// Reset the store for a freshly loaded dataset: every column becomes a
    /// default text field, in column order. Custom fields survive and keep
    /// their settings, after the columns; everything else is dropped.
    #[instrument(skip_all, fields(columns = columns.len()))]
    pub fn set_from_columns<S: AsRef<str>>(&mut self, columns: &[S]) {
        let customs: Vec<FieldDefinition> = self
            .fields()
            .filter(|f| f.source.is_literal())
            .cloned()
            .collect();

        self.order.clear();
        self.definitions.clear();

        for column in columns {
            let column = column.as_ref();
            if self.definitions.contains_key(column) {
                continue;
            }
            self.push(FieldDefinition::column(column));
        }

        for custom in customs {
            if let Some(existing) = self.definitions.get_mut(&custom.name) {
                // A custom field shadows the column of the same name.
                *existing = custom;
            } else {
                self.push(custom);
            }
        }

        info!(fields = self.order.len(), "field configuration reset from columns");
    }

    // -- Add / remove ---------------------------------------------------------

    /// Append a custom field with an empty literal value.
    pub fn add_custom_field(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(LabelwerkError::DuplicateField(name.to_string()));
        }
        self.push(FieldDefinition::literal(name));
        debug!(field = name, "custom field added");
        Ok(())
    }

    /// Remove a field and everything stored for it. No-op if absent.
    pub fn remove_field(&mut self, name: &str) {
        if self.definitions.remove(name).is_some() {
            self.order.retain(|n| n != name);
            debug!(field = name, "field removed");
        }
    }

    // -- Reordering -----------------------------------------------------------

    pub fn move_up(&mut self, name: &str) {
        if let Some(i) = self.position(name)
            && i > 0
        {
            self.order.swap(i, i - 1);
        }
    }

    pub fn move_down(&mut self, name: &str) {
        if let Some(i) = self.position(name)
            && i + 1 < self.order.len()
        {
            self.order.swap(i, i + 1);
        }
    }

    pub fn move_to_top(&mut self, name: &str) {
        if let Some(i) = self.position(name)
            && i > 0
        {
            let item = self.order.remove(i);
            self.order.insert(0, item);
        }
    }

    pub fn move_to_bottom(&mut self, name: &str) {
        if let Some(i) = self.position(name)
            && i + 1 < self.order.len()
        {
            let item = self.order.remove(i);
            self.order.push(item);
        }
    }

    // -- Per-field settings ---------------------------------------------------

    pub fn set_display_mode(&mut self, name: &str, mode: DisplayMode) -> Result<()> {
        self.field_mut(name)?.display_mode = mode;
        Ok(())
    }

    pub fn set_prefix(&mut self, name: &str, prefix: impl Into<String>) -> Result<()> {
        self.field_mut(name)?.prefix = prefix.into();
        Ok(())
    }

    pub fn set_suffix(&mut self, name: &str, suffix: impl Into<String>) -> Result<()> {
        self.field_mut(name)?.suffix = suffix.into();
        Ok(())
    }

    pub fn set_font_size(&mut self, name: &str, size: u32) -> Result<()> {
        if size == 0 || size > MAX_FONT_SIZE {
            return Err(LabelwerkError::InvalidDimension {
                what: "font size",
                value: i64::from(size),
            });
        }
        self.field_mut(name)?.font_size = size;
        Ok(())
    }

    pub fn set_color(&mut self, name: &str, color: Color) -> Result<()> {
        self.field_mut(name)?.color = Some(color);
        Ok(())
    }

    /// Revert a field to the style's default text color.
    pub fn clear_color(&mut self, name: &str) -> Result<()> {
        self.field_mut(name)?.color = None;
        Ok(())
    }

    /// Set the fixed value of a custom field.
    pub fn set_literal_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field = self.field_mut(name)?;
        match &mut field.source {
            FieldSource::Literal(current) => {
                *current = value.into();
                Ok(())
            }
            FieldSource::FromRow => Err(LabelwerkError::UnknownField(format!(
                "{name} (not a custom field)"
            ))),
        }
    }

    // -- Persistence ----------------------------------------------------------

    /// Merge a previously exported configuration into the store.
    ///
    /// `columns` are the current dataset's columns. Persisted names that are
    /// neither a column nor a custom field (current or persisted) are
    /// dropped; columns missing from the persisted order are appended, then
    /// custom fields missing from it. Settings are restored for every field
    /// that survives.
    #[instrument(skip_all, fields(columns = columns.len(), persisted = cfg.field_order.len()))]
    pub fn apply_persisted_config<S: AsRef<str>>(&mut self, cfg: &ConfigDocument, columns: &[S]) {
        let is_column = |name: &str| columns.iter().any(|c| c.as_ref() == name);

        // Persisted literal values win over the current ones.
        let mut customs: Vec<(String, String)> = self
            .fields()
            .filter_map(|f| match &f.source {
                FieldSource::Literal(v) if !cfg.custom_fields.contains_key(&f.name) => {
                    Some((f.name.clone(), v.clone()))
                }
                _ => None,
            })
            .collect();
        customs.extend(
            cfg.custom_fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        let is_custom = |name: &str| customs.iter().any(|(n, _)| n == name);

        let mut order: Vec<String> = Vec::new();
        for name in &cfg.field_order {
            if (is_column(name) || is_custom(name)) && !order.contains(name) {
                order.push(name.clone());
            }
        }
        for column in columns {
            let column = column.as_ref();
            if !order.iter().any(|n| n == column) {
                order.push(column.to_string());
            }
        }
        for (name, _) in &customs {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }

        let mut definitions = HashMap::with_capacity(order.len());
        for name in &order {
            let mut def = self
                .definitions
                .remove(name)
                .unwrap_or_else(|| FieldDefinition::column(name.as_str()));

            def.source = match customs.iter().find(|(n, _)| n == name) {
                Some((_, value)) => FieldSource::Literal(value.clone()),
                None => FieldSource::FromRow,
            };
            if let Some(mode) = cfg.field_display_types.get(name) {
                def.display_mode = *mode;
            }
            if let Some(prefix) = cfg.field_prefixes.get(name) {
                def.prefix = prefix.clone();
            }
            if let Some(suffix) = cfg.field_suffixes.get(name) {
                def.suffix = suffix.clone();
            }
            if let Some(size) = cfg.field_font_sizes.get(name) {
                def.font_size = size.get().unwrap_or(DEFAULT_FONT_SIZE);
            }
            if let Some(color) = cfg.field_colors.get(name) {
                def.color = Some(*color);
            }
            definitions.insert(name.clone(), def);
        }

        let dropped = cfg
            .field_order
            .iter()
            .filter(|n| !definitions.contains_key(n.as_str()))
            .count();
        self.order = order;
        self.definitions = definitions;
        info!(
            fields = self.order.len(),
            dropped, "persisted field configuration applied"
        );
    }

    /// Export the current fields, `style` and `output_dir` as a config document.
    pub fn export(&self, style: &LabelStyle, output_dir: &Path) -> ConfigDocument {
        let mut doc = ConfigDocument::from_style(style, output_dir);
        doc.field_order = self.order.clone();
        for field in self.fields() {
            let name = field.name.clone();
            doc.field_display_types.insert(name.clone(), field.display_mode);
            doc.field_prefixes.insert(name.clone(), field.prefix.clone());
            doc.field_suffixes.insert(name.clone(), field.suffix.clone());
            doc.field_font_sizes
                .insert(name.clone(), field.font_size.into());
            if let Some(color) = field.color {
                doc.field_colors.insert(name.clone(), color);
            }
            if let FieldSource::Literal(value) = &field.source {
                doc.custom_fields.insert(name, value.clone());
            }
        }
        doc
    }

    // -- Internals ------------------------------------------------------------

    fn push(&mut self, def: FieldDefinition) {
        self.order.push(def.name.clone());
        self.definitions.insert(def.name.clone(), def);
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut FieldDefinition> {
        self.definitions
            .get_mut(name)
            .ok_or_else(|| LabelwerkError::UnknownField(name.to_string()))
    }
}
