// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-run output directory: `<root>/labels_<YYYYmmdd_HHMMSS>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

use labelwerk_core::error::{LabelwerkError, Result};

/// Upper bound on `_N` suffixes tried for one timestamp.
const MAX_SUFFIX: u32 = 1000;

/// Directory name for a run started at `at`.
pub fn dir_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("labels_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Create a fresh directory for one run under `root`.
///
/// `root` is created if missing. If the timestamped name is already taken,
/// `_2`, `_3`, ... are appended, so a run never writes into another run's
/// directory. On failure, every directory this call created is removed
/// again.
pub fn create_run_dir<Tz: TimeZone>(root: &Path, at: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let fail = |path: &Path, source: std::io::Error| LabelwerkError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    };

    // Topmost ancestor of `root` that does not exist yet.
    let first_created = root
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .last()
        .map(Path::to_path_buf);

    if let Err(e) = std::fs::create_dir_all(root) {
        remove_created(first_created.as_deref());
        return Err(fail(root, e));
    }

    let base = dir_name(at);
    for n in 1..=MAX_SUFFIX {
        let name = if n == 1 {
            base.clone()
        } else {
            format!("{base}_{n}")
        };
        let path = root.join(name);
        match std::fs::create_dir(&path) {
            Ok(()) => {
                info!(path = %path.display(), "output directory created");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "output directory name taken");
            }
            Err(e) => {
                remove_created(first_created.as_deref());
                return Err(fail(&path, e));
            }
        }
    }

    Err(fail(
        &root.join(&base),
        std::io::Error::new(ErrorKind::AlreadyExists, "no free directory name"),
    ))
}

fn remove_created(top: Option<&Path>) {
    if let Some(top) = top
        && let Err(e) = std::fs::remove_dir_all(top)
    {
        debug!(path = %top.display(), error = %e, "could not remove partial output directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn name_is_timestamp_qualified() {
        assert_eq!(dir_name(&at()), "labels_20260304_050607");
    }

    #[test]
    fn same_second_gets_suffix() {
        let root = tempfile::tempdir().unwrap();
        let first = create_run_dir(root.path(), &at()).unwrap();
        let second = create_run_dir(root.path(), &at()).unwrap();

        assert!(first.ends_with("labels_20260304_050607"));
        assert!(second.ends_with("labels_20260304_050607_2"));
        assert!(first.is_dir() && second.is_dir());
    }

    #[test]
    fn missing_root_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("a").join("b");
        let dir = create_run_dir(&root, &at()).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn failed_creation_removes_created_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let fresh = tmp.path().join("fresh");
        // Longer than any file-name limit, so creation fails below `fresh`.
        let root = fresh.join("nested").join("x".repeat(300)).join("leaf");

        let err = create_run_dir(&root, &at()).unwrap_err();

        assert!(matches!(err, LabelwerkError::OutputDirectory { .. }));
        assert!(!fresh.exists());
        assert!(tmp.path().is_dir());
    }

    #[test]
    fn failure_keeps_existing_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("x".repeat(300));

        assert!(create_run_dir(&root, &at()).is_err());
        assert!(tmp.path().is_dir());
    }

    #[test]
    fn root_that_is_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("not-a-dir");
        std::fs::write(&root, b"x").unwrap();

        let err = create_run_dir(&root, &at()).unwrap_err();
        assert!(matches!(err, LabelwerkError::OutputDirectory { .. }));
    }
}
