// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Labelwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Labelwerk operations.
#[derive(Debug, Error)]
pub enum LabelwerkError {
    // -- Configuration errors --
    #[error("field '{0}' already exists")]
    DuplicateField(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{what} must be a positive integer, got {value}")]
    InvalidDimension { what: &'static str, value: i64 },

    #[error("invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),

    // -- Render errors --
    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    #[error("label rendering failed: {0}")]
    Render(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Batch errors --
    #[error("no dataset loaded")]
    NoDataset,

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("batch run aborted: {0}")]
    BatchAborted(String),

    // -- Parsing / persistence --
    #[error("malformed configuration: {0}")]
    ConfigParse(String),

    #[error("malformed dataset: {0}")]
    DatasetParse(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabelwerkError>;
