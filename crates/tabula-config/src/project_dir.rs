//! Discovery and creation of the `.tabula/` project directory.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// The name of the project metadata directory.
pub const PROJECT_DIR_NAME: &str = ".tabula";

/// Environment variable that overrides discovery.
pub const PROJECT_DIR_ENV: &str = "TABULA_DIR";

/// Walk up the directory tree from `start` looking for a `.tabula/`
/// directory.
///
/// The `TABULA_DIR` environment variable is checked first and wins when it
/// names an existing directory.
pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(PROJECT_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_project_dir`], but a missing directory is an error.
pub fn find_project_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_project_dir(start).ok_or(ConfigError::ProjectDirNotFound)
}

/// Ensure a `.tabula/` directory exists at `path` (or is `path` itself when
/// it is already named `.tabula`). Returns the directory.
pub fn ensure_project_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.ends_with(PROJECT_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(PROJECT_DIR_NAME)
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
