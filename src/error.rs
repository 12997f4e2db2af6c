use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Every way a patch run can fail.
///
/// The two idempotence outcomes (block already inserted, value already set)
/// are successes and never show up here.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("marker not found: {marker}")]
    MarkerMissing { marker: String },

    #[error("marker appears {count} times (expected exactly 1): {marker}")]
    MarkerDuplicated { marker: String, count: usize },

    #[error("end marker '{end}' (offset {end_offset}) does not follow begin marker '{begin}' (offset {begin_offset})")]
    MarkerOrderInvalid {
        begin: String,
        end: String,
        begin_offset: usize,
        end_offset: usize,
    },

    #[error("no live declaration for selector: {selector}")]
    SelectorNotFound { selector: String },

    #[error("malformed value for {selector}: '{value}'")]
    MalformedValue { selector: String, value: String },

    #[error("logo asset not found: {}", path.display())]
    AssetMissing { path: PathBuf },

    #[error("configuration check failed ({command}): {detail}")]
    ValidationFailed { command: String, detail: String },

    #[error("service reload failed ({command}): {detail}")]
    ReloadFailed { command: String, detail: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PatchError {
    /// Stable short name for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchError::NotFound { .. } => "not_found",
            PatchError::ReadFailure { .. } => "read_failure",
            PatchError::WriteFailure { .. } => "write_failure",
            PatchError::MarkerMissing { .. } => "marker_missing",
            PatchError::MarkerDuplicated { .. } => "marker_duplicated",
            PatchError::MarkerOrderInvalid { .. } => "marker_order_invalid",
            PatchError::SelectorNotFound { .. } => "selector_not_found",
            PatchError::MalformedValue { .. } => "malformed_value",
            PatchError::AssetMissing { .. } => "asset_missing",
            PatchError::ValidationFailed { .. } => "validation_failed",
            PatchError::ReloadFailed { .. } => "reload_failed",
            PatchError::Config(_) => "config",
        }
    }
}
