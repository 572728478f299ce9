// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch generation pipeline.
//
// Rows are processed strictly in order on a single blocking worker. Each row
// is rendered from an immutable template snapshot and written as
// `label_<n>.png` (1-based). Rendering or write failures are recorded per row
// and the run moves on. Events are pushed through an unbounded channel, so
// the worker never waits on the caller.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::{BatchId, DataRow, Dataset, LabelTemplate};
use labelwerk_render::LabelRenderer;
use labelwerk_render::output::save_png;

use crate::events::{BatchEvent, BatchReport, RowFailure};
use crate::output_dir::create_run_dir;

/// Everything one run needs, owned. Edits made by the caller after the job
/// is built never reach the run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: BatchId,
    pub template: LabelTemplate,
    pub dataset: Arc<Dataset>,
    /// Directory under which the run's own `labels_<timestamp>` is created.
    pub output_root: PathBuf,
}

impl BatchJob {
    pub fn new(
        template: LabelTemplate,
        dataset: impl Into<Arc<Dataset>>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: BatchId::new(),
            template,
            dataset: dataset.into(),
            output_root: output_root.into(),
        }
    }
}

/// Runs batch jobs with a shared renderer.
#[derive(Debug, Clone, Default)]
pub struct BatchPipeline {
    renderer: LabelRenderer,
}

impl BatchPipeline {
    pub fn new(renderer: LabelRenderer) -> Self {
        Self { renderer }
    }

    /// Run `job` to completion on the current thread.
    ///
    /// Returns `Err` only when the output directory cannot be created; an
    /// `Aborted` event is sent in that case. Otherwise a `Completed` event
    /// carrying the returned report is always the last event.
    #[instrument(skip_all, fields(batch_id = %job.id, rows = job.dataset.len()))]
    pub fn run(
        &self,
        job: &BatchJob,
        events: &mpsc::UnboundedSender<BatchEvent>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<BatchReport> {
        // A closed receiver only means nobody is listening any more.
        let emit = |event: BatchEvent| {
            let _ = events.send(event);
        };

        let total = job.dataset.len();
        let output_dir = match create_run_dir(&job.output_root, &Local::now()) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "batch run aborted");
                emit(BatchEvent::Aborted {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(total, output_dir = %output_dir.display(), "batch run started");
        emit(BatchEvent::Started {
            batch_id: job.id,
            total,
            output_dir: output_dir.clone(),
        });

        let mut succeeded = 0;
        let mut failures = Vec::new();
        let mut cancelled = false;

        for (index, row) in job.dataset.rows().iter().enumerate() {
            if *cancel.borrow() {
                info!(processed = index, "batch run cancelled");
                cancelled = true;
                break;
            }

            let number = index + 1;
            let path = output_dir.join(format!("label_{number}.png"));
            match self.write_label(&job.template, row, &path) {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(row = number, error = %e, "label generation failed");
                    let message = e.to_string();
                    emit(BatchEvent::RowFailed {
                        row: number,
                        message: message.clone(),
                    });
                    failures.push(RowFailure { index, message });
                }
            }

            emit(BatchEvent::Progress {
                row: number,
                total,
                percent: number as f64 / total as f64 * 100.0,
            });
        }

        let report = BatchReport {
            batch_id: job.id,
            total,
            succeeded,
            failures,
            output_dir,
            cancelled,
        };
        info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            cancelled,
            "batch run finished"
        );
        emit(BatchEvent::Completed(report.clone()));
        Ok(report)
    }

    /// Render one row and write it to `path`. A panic while doing so is
    /// turned into a row error.
    fn write_label(&self, template: &LabelTemplate, row: &DataRow, path: &Path) -> Result<()> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.renderer
                .render_template(template, Some(row))
                .and_then(|img| save_png(&img, path))
        }))
        .unwrap_or_else(|payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            Err(LabelwerkError::Render(format!("renderer panicked: {detail}")))
        })
    }

    /// Start `job` on the blocking worker pool and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self, job: BatchJob) -> BatchHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let id = job.id;
        let pipeline = self.clone();

        let task = tokio::task::spawn_blocking(move || pipeline.run(&job, &events_tx, &cancel_rx));

        BatchHandle {
            id,
            events: events_rx,
            cancel: cancel_tx,
            task,
        }
    }
}

/// Caller's side of a spawned run.
#[derive(Debug)]
pub struct BatchHandle {
    id: BatchId,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<BatchReport>>,
}

impl BatchHandle {
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Next event, or `None` once the run has ended and all events were read.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Ask the run to stop before its next row. Labels already written stay.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the run to end. Unread events are discarded.
    pub async fn wait(self) -> Result<BatchReport> {
        self.task
            .await
            .map_err(|e| LabelwerkError::BatchAborted(e.to_string()))?
    }
}
