// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labelwerk-batch — Batch label generation for Labelwerk.
//
// Drives the label renderer over every row of a dataset on a background
// worker, writes one PNG per row into a fresh output directory and streams
// progress back to the caller. A failing row is recorded and skipped; only
// an unusable output directory stops a run.

pub mod events;
pub mod output_dir;
pub mod pipeline;

pub use events::{BatchEvent, BatchReport, RowFailure};
pub use pipeline::{BatchHandle, BatchJob, BatchPipeline};
