//! Reading edit scripts: single files, directories of scripts, or strings.
//!
//! Parsing and validation errors carry the script path once one is known, so
//! a directory run can point at the file that needs fixing.

use crate::config::schema::{EditScript, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read edit script {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to scan {} for edit scripts: {source}", path.display())]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("no .toml edit scripts found in {}", path.display())]
    NoScripts { path: PathBuf },

    #[error("failed to parse edit script TOML{}: {source}", located(path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid edit script{} ({} issue(s)):\n{source}", located(path), source.issues.len())]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

impl ConfigError {
    /// Script the error belongs to, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Scan { path, .. }
            | ConfigError::NoScripts { path } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    fn at(mut self, script: &Path) -> Self {
        if let ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } = &mut self {
            path.get_or_insert_with(|| script.to_path_buf());
        }
        self
    }
}

pub fn load_from_str(input: &str) -> Result<EditScript, ConfigError> {
    let script: EditScript = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    script
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(script)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditScript, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}

/// A single script file, or every `*.toml` directly under a directory,
/// sorted by file name so numbered scripts run in order.
pub fn discover_scripts(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Scan {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = entry.path().extension().and_then(|s| s.to_str()) == Some("toml");
        if entry.file_type().is_file() && is_toml {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(ConfigError::NoScripts {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(dir = %path.display(), scripts = files.len(), "discovered edit scripts");
    Ok(files)
}
