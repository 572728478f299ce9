// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress and status events emitted by a batch run.

use std::path::PathBuf;

use serde::Serialize;

use labelwerk_core::types::BatchId;

/// A row that could not be rendered or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 0-based row index in the dataset.
    pub index: usize,
    pub message: String,
}

impl RowFailure {
    /// 1-based row number, as used in file names and status lines.
    pub fn row_number(&self) -> usize {
        self.index + 1
    }
}

/// Outcome of a finished (or cancelled) batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    /// Rows in the dataset.
    pub total: usize,
    /// Labels written successfully.
    pub succeeded: usize,
    pub failures: Vec<RowFailure>,
    pub output_dir: PathBuf,
    /// Stopped early by a cancel request.
    pub cancelled: bool,
}

impl BatchReport {
    /// Rows visited before the run ended.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Completion line for the status bar.
    pub fn status_line(&self) -> String {
        let dir = self.output_dir.display();
        if self.cancelled {
            format!(
                "cancelled after {} of {} rows; {} labels in {dir}",
                self.processed(),
                self.total,
                self.succeeded
            )
        } else if self.failures.is_empty() {
            format!("generated {} labels to {dir}", self.total)
        } else {
            format!(
                "generated {} of {} labels to {dir} ({} failed)",
                self.succeeded,
                self.total,
                self.failures.len()
            )
        }
    }
}

/// Notifications sent from the worker to the caller. Delivered in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// The output directory exists and rendering begins.
    Started {
        batch_id: BatchId,
        total: usize,
        output_dir: PathBuf,
    },
    /// Emitted after every row, whether it succeeded or failed.
    Progress {
        /// 1-based number of the row just processed.
        row: usize,
        total: usize,
        percent: f64,
    },
    RowFailed {
        /// 1-based row number.
        row: usize,
        message: String,
    },
    Completed(BatchReport),
    /// The run could not start or continue. No further events follow.
    Aborted { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(failures: Vec<RowFailure>, cancelled: bool) -> BatchReport {
        BatchReport {
            batch_id: BatchId::new(),
            total: 3,
            succeeded: 3 - failures.len(),
            failures,
            output_dir: PathBuf::from("/out/labels_20260101_120000"),
            cancelled,
        }
    }

    #[test]
    fn status_line_for_clean_run() {
        assert_eq!(
            report(vec![], false).status_line(),
            "generated 3 labels to /out/labels_20260101_120000"
        );
    }

    #[test]
    fn status_line_counts_failures() {
        let failure = RowFailure {
            index: 1,
            message: "QR encoding failed".into(),
        };
        assert_eq!(failure.row_number(), 2);
        let line = report(vec![failure], false).status_line();
        assert!(line.starts_with("generated 2 of 3 labels"), "{line}");
        assert!(line.ends_with("(1 failed)"), "{line}");
    }

    #[test]
    fn events_serialise_with_tag() {
        let json = serde_json::to_string(&BatchEvent::RowFailed {
            row: 2,
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"row_failed","row":2,"message":"boom"}"#);
    }
}
