// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for status lines and notifications.
//
// Every technical error is mapped to a short message with a suggestion. The
// severity tells the caller whether to show a status line or stop the run.

use crate::error::LabelwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only the current label (or preview) is affected.
    Recoverable,
    /// The user must change something before trying again.
    ActionRequired,
    /// The operation as a whole cannot continue.
    Fatal,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown in the status line).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    /// One-line form for status bars: `"<message> <suggestion>"`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.message, self.suggestion)
    }
}

/// Convert a `LabelwerkError` into a `HumanError`.
pub fn humanize_error(err: &LabelwerkError) -> HumanError {
    match err {
        // -- Configuration --
        LabelwerkError::DuplicateField(name) => HumanError {
            message: format!("A field called '{name}' already exists."),
            suggestion: "Pick a different name for the new field.".into(),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::UnknownField(name) => HumanError {
            message: format!("There is no field '{name}'."),
            suggestion: "Reload the data file or re-add the field.".into(),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::InvalidDimension { what, value } => HumanError {
            message: format!("The {what} {value} is not valid."),
            suggestion: "Enter a whole number greater than zero.".into(),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::InvalidColor(text) => HumanError {
            message: format!("'{text}' is not a color."),
            suggestion: "Use a hex color such as #000000.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Rendering --
        LabelwerkError::QrEncoding(detail) => HumanError {
            message: "This value can't be turned into a QR code.".into(),
            suggestion: format!("Shorten the value or show the field as text. ({detail})"),
            severity: Severity::Recoverable,
        },

        LabelwerkError::Render(detail) | LabelwerkError::ImageError(detail) => HumanError {
            message: "The label could not be drawn.".into(),
            suggestion: format!("Check the field settings and try again. ({detail})"),
            severity: Severity::Recoverable,
        },

        // -- Batch --
        LabelwerkError::NoDataset => HumanError {
            message: "No data file is loaded.".into(),
            suggestion: "Import a data file before generating labels.".into(),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::OutputDirectory { path, .. } => HumanError {
            message: format!("The output folder {} could not be created.", path.display()),
            suggestion: "Choose a folder you are allowed to write to.".into(),
            severity: Severity::Fatal,
        },

        LabelwerkError::BatchAborted(detail) => HumanError {
            message: "Label generation stopped.".into(),
            suggestion: format!("Labels written so far are kept. ({detail})"),
            severity: Severity::Fatal,
        },

        // -- Parsing / persistence --
        LabelwerkError::ConfigParse(detail) => HumanError {
            message: "The configuration file could not be read.".into(),
            suggestion: format!("Your current settings were kept. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::DatasetParse(detail) => HumanError {
            message: "The data file could not be read.".into(),
            suggestion: format!("Check that the file is a valid table. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::Serialization(e) => HumanError {
            message: "Settings could not be converted.".into(),
            suggestion: format!("({e})"),
            severity: Severity::ActionRequired,
        },

        LabelwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Choose the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Check the file permissions or choose another location.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file operation failed.".into(),
                suggestion: format!("({io_err})"),
                severity: Severity::ActionRequired,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_failures_are_recoverable() {
        let human = humanize_error(&LabelwerkError::QrEncoding("data too long".into()));
        assert_eq!(human.severity, Severity::Recoverable);
        assert!(human.status_line().contains("data too long"));
    }

    #[test]
    fn output_directory_failure_is_fatal() {
        let err = LabelwerkError::OutputDirectory {
            path: "/nope".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Fatal);
        assert!(human.message.contains("/nope"));
    }

    #[test]
    fn config_parse_mentions_kept_settings() {
        let human = humanize_error(&LabelwerkError::ConfigParse("eof".into()));
        assert!(human.suggestion.contains("kept"));
    }
}
