// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session: the state a user works on between loading a dataset and
// generating labels.
//
// The session owns the field store, the label style and the loaded dataset.
// Batch runs receive a snapshot of these, so edits made while a run is in
// flight only affect later runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use labelwerk_batch::{BatchHandle, BatchJob, BatchPipeline};
use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::human_errors::humanize_error;
use labelwerk_core::types::{Dataset, LabelStyle};
use labelwerk_core::{ConfigDocument, FieldConfigStore};
use labelwerk_render::output::framed_preview;
use labelwerk_render::{FontBook, LabelRenderer};

/// Result of a preview request. Exactly one of a framed image or an error
/// message is produced; `status` is always set.
#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    pub image: Option<RgbImage>,
    pub status: String,
}

pub struct LabelSession {
    store: FieldConfigStore,
    style: LabelStyle,
    output_dir: PathBuf,
    font_file: Option<PathBuf>,
    dataset: Option<Arc<Dataset>>,
    renderer: LabelRenderer,
    pipeline: BatchPipeline,
    /// Last imported configuration, re-applied whenever a dataset is loaded.
    persisted: Option<ConfigDocument>,
    /// Where exports also record the "last used" configuration.
    last_config: Option<PathBuf>,
}

// Editing API for interactive front ends; the CLI drives a subset of it.
#[allow(dead_code)]
impl LabelSession {
    pub fn new(renderer: LabelRenderer) -> Self {
        let defaults = ConfigDocument::default();
        Self {
            store: FieldConfigStore::new(),
            style: LabelStyle::default(),
            output_dir: defaults.output_dir,
            font_file: None,
            dataset: None,
            pipeline: BatchPipeline::new(renderer.clone()),
            renderer,
            persisted: None,
            last_config: None,
        }
    }

    /// A session using the best font found on this machine, with the
    /// configuration at `last_config` applied if it exists and parses.
    #[instrument(skip_all, fields(path = %last_config.display()))]
    pub fn autoload(last_config: &Path) -> Self {
        let mut session = Self::new(LabelRenderer::new(FontBook::discover(None)));
        session.last_config = Some(last_config.to_path_buf());

        if last_config.is_file() {
            match ConfigDocument::load(last_config).and_then(|doc| session.apply_config(doc)) {
                Ok(()) => info!("last used configuration restored"),
                Err(e) => debug!(error = %e, "last used configuration ignored"),
            }
        }
        session
    }

    // -- Accessors -----------------------------------------------------------

    pub fn store(&self) -> &FieldConfigStore {
        &self.store
    }

    /// Field edits go straight to the store.
    pub fn store_mut(&mut self) -> &mut FieldConfigStore {
        &mut self.store
    }

    pub fn style(&self) -> &LabelStyle {
        &self.style
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_deref()
    }

    // -- Settings ------------------------------------------------------------

    /// Change the label dimensions. Invalid values leave the style unchanged.
    pub fn resize_label(&mut self, width: i64, height: i64, qr_size: i64) -> Result<()> {
        self.style.resize(width, height, qr_size)
    }

    pub fn set_style(&mut self, style: LabelStyle) {
        self.style = style;
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
    }

    // -- Dataset -------------------------------------------------------------

    /// Replace the dataset. Fields are rebuilt from its columns, keeping
    /// custom fields, and the last imported configuration is re-applied.
    #[instrument(skip_all, fields(rows = dataset.len()))]
    pub fn load_dataset(&mut self, dataset: Dataset) {
        let columns = dataset.columns().to_vec();
        self.store.set_from_columns(&columns);
        if let Some(doc) = &self.persisted {
            self.store.apply_persisted_config(doc, &columns);
        }
        info!(columns = columns.len(), fields = self.store.len(), "dataset in use");
        self.dataset = Some(Arc::new(dataset));
    }

    // -- Configuration -------------------------------------------------------

    /// Apply a configuration document. If its style is invalid nothing is
    /// changed.
    pub fn apply_config(&mut self, doc: ConfigDocument) -> Result<()> {
        let style = doc.style()?;

        if doc.font_file != self.font_file {
            self.renderer = LabelRenderer::new(FontBook::discover(doc.font_file.as_deref()));
            self.pipeline = BatchPipeline::new(self.renderer.clone());
            self.font_file = doc.font_file.clone();
        }
        self.style = style;
        self.output_dir = doc.output_dir.clone();

        let columns: Vec<String> = self
            .dataset
            .as_ref()
            .map(|d| d.columns().to_vec())
            .unwrap_or_default();
        self.store.apply_persisted_config(&doc, &columns);
        self.persisted = Some(doc);
        Ok(())
    }

    /// Import a configuration file. On any error the session is unchanged.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn import_config(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let doc = ConfigDocument::load(path)?;
        self.apply_config(doc)
    }

    /// The current settings as a configuration document.
    pub fn export_config(&self) -> ConfigDocument {
        let mut doc = self.store.export(&self.style, &self.output_dir);
        doc.font_file = self.font_file.clone();
        doc
    }

    /// Write the current settings to `path` and record them as the last
    /// used configuration.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<()> {
        let doc = self.export_config();
        doc.save(path.as_ref())?;
        if let Some(last) = &self.last_config
            && last.as_path() != path.as_ref()
            && let Err(e) = doc.save(last)
        {
            warn!(error = %e, "could not record last used configuration");
        }
        Ok(())
    }

    // -- Rendering -----------------------------------------------------------

    /// Render the 1-based row `row_number` framed for display. Out-of-range
    /// rows show row 1; without a dataset the label is rendered with no row.
    pub fn preview(&self, row_number: usize) -> PreviewOutcome {
        let selected = self.dataset.as_ref().and_then(|d| d.preview_row(row_number));
        let template = self.store.template(&self.style);

        match self.renderer.render_template(&template, selected.map(|(_, row)| row)) {
            Ok(label) => PreviewOutcome {
                image: Some(framed_preview(&label)),
                status: match selected {
                    Some((index, _)) => format!("Previewing row {}", index + 1),
                    None => "Previewing without data".into(),
                },
            },
            Err(e) => {
                debug!(error = %e, "preview failed");
                PreviewOutcome {
                    image: None,
                    status: humanize_error(&e).status_line(),
                }
            }
        }
    }

    /// Start a batch run over the loaded dataset with the current settings.
    /// Must be called from within a Tokio runtime.
    pub fn start_batch(&self) -> Result<BatchHandle> {
        let dataset = self.dataset.as_ref().ok_or(LabelwerkError::NoDataset)?;
        let job = BatchJob::new(
            self.store.template(&self.style),
            Arc::clone(dataset),
            self.output_dir.clone(),
        );
        info!(batch_id = %job.id, rows = dataset.len(), "batch requested");
        Ok(self.pipeline.spawn(job))
    }
}
