//! Settings registry errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::setting::SettingType;

/// Errors raised by the settings registry.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A setting with this name was already registered.
    #[error("setting `{0}` is already registered")]
    Duplicate(String),

    /// The setting was never registered.
    #[error("unknown setting `{0}`")]
    Unknown(String),

    /// A strict setting was read before any value was bound.
    #[error("setting `{0}` is required but has no value")]
    MissingRequired(String),

    /// The value does not satisfy the declared type.
    #[error("setting `{name}` expects {expected}, got {actual}")]
    Type {
        name: String,
        expected: SettingType,
        actual: String,
    },

    /// A file-path setting names a path that does not exist.
    #[error("setting `{name}` points to a path that does not exist: {}", .path.display())]
    InvalidPath { name: String, path: PathBuf },
}

/// Result type for registry operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
