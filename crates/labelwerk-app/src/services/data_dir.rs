// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution.

use std::path::PathBuf;

/// File holding the most recently exported configuration.
pub const LAST_CONFIG_FILE: &str = "label_config.json";

/// Return the application config directory, creating it if needed.
pub fn config_dir() -> PathBuf {
    let dir = base_dir().join("labelwerk");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Path of the "last used" configuration, autoloaded at startup.
pub fn last_config_path() -> PathBuf {
    config_dir().join(LAST_CONFIG_FILE)
}

fn base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    std::env::temp_dir()
}
