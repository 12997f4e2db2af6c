//! TB Override: marker-anchored patching of a dashboard's theme and logo
//!
//! Two text artifacts are patched in place: a stylesheet whose theme
//! variables live between a BEGIN/END marker pair, and a reverse-proxy
//! configuration that receives a logo `location` block after a single-line
//! marker. The consuming service is then validated and reloaded.
//!
//! # Architecture
//!
//! - [`document`] reads and atomically writes whole files
//! - [`marker`] locates marker pairs and splices blocks back
//! - [`insert`] inserts a fixed block after a marker, at most once
//! - [`theme`] rewrites named declarations inside a block
//! - [`patcher`] sequences the above and drives [`service`]
//!
//! # Guarantees
//!
//! - Edits touch only the targeted value tokens; comments, whitespace and
//!   unit conventions (`#`, `px`) are preserved
//! - Re-running the same request is a no-op
//! - Nothing is written when any step of an artifact fails
//! - The service is never reloaded after a failed configuration check
//!
//! # Example
//!
//! ```no_run
//! use tb_override::{patch_theme, MarkerPair, OverrideRequest, Strictness};
//! use std::path::Path;
//!
//! let markers = MarkerPair::new(">>> TB_CUSTOM_THEME_VARS_BEGIN", "<<< TB_CUSTOM_THEME_VARS_END");
//! let request: OverrideRequest = [("--tb-logo-w", "200")].into_iter().collect();
//!
//! match patch_theme(Path::new("custom-theme.css"), &markers, &request, Strictness::Strict, false) {
//!     Ok(patch) => println!("{} value(s) changed", patch.report.changed_count()),
//!     Err(e) => eprintln!("Patch failed: {}", e),
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod insert;
pub mod logo;
pub mod marker;
pub mod patcher;
pub mod service;
pub mod theme;

// Re-exports
pub use catalog::{Catalog, CatalogIssue, ValueKind, VariableSpec};
pub use config::{load_from_path, load_from_str, ConfigError, JobConfig};
pub use document::{read_document, write_document, TextDocument};
pub use error::PatchError;
pub use insert::{insert_after_marker, Insertion};
pub use logo::LogoAsset;
pub use marker::{locate, Block, MarkerPair, MarkerSpan};
pub use patcher::{
    patch_logo, patch_theme, plan_logo, plan_theme, LogoPatch, PatchOptions, Patcher, RunReport,
    ServiceStep, SkipReason, ThemePatch,
};
pub use service::{validate_and_reload, CommandService, ServiceControl};
pub use theme::{
    extract_assignments, override_values, OverrideReport, OverrideRequest, Strictness,
    VariableAssignment,
};
