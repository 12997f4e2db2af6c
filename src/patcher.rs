//! Patch orchestration: stylesheet overrides, logo insertion, then
//! validate-and-reload of the consuming service.
//!
//! Each artifact is read once, edited in memory and written once (or not at
//! all when nothing changed). No artifact is written unless every requested
//! one planned cleanly, and the service commands run after every successful
//! non-dry run, even one that found both files already up to date.

use crate::config::JobConfig;
use crate::document::TextDocument;
use crate::error::PatchError;
use crate::insert::insert_after_marker;
use crate::logo::LogoAsset;
use crate::marker::MarkerPair;
use crate::service::{validate_and_reload, ServiceControl};
use crate::theme::{override_values, OverrideReport, OverrideRequest, Strictness};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stylesheet step result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ThemePatch reports which selectors changed"]
pub struct ThemePatch {
    pub path: PathBuf,
    pub report: OverrideReport,
    pub written: bool,
    pub before: String,
    pub after: String,
}

/// Proxy config step result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "LogoPatch reports whether the block was inserted"]
pub struct LogoPatch {
    pub path: PathBuf,
    pub asset: PathBuf,
    pub inserted: bool,
    pub written: bool,
    pub before: String,
    pub after: String,
}

impl ThemePatch {
    /// Write the patched stylesheet if it differs from what was read.
    pub fn commit(&mut self) -> Result<(), PatchError> {
        self.written = commit_content(&self.path, &self.before, &self.after)?;
        Ok(())
    }
}

impl LogoPatch {
    pub fn commit(&mut self) -> Result<(), PatchError> {
        self.written = commit_content(&self.path, &self.before, &self.after)?;
        Ok(())
    }
}

fn commit_content(path: &Path, before: &str, after: &str) -> Result<bool, PatchError> {
    if before == after {
        return Ok(false);
    }
    TextDocument::new(path, after).write()?;
    Ok(true)
}

/// Compute the stylesheet edit for `request` without touching the file.
pub fn plan_theme(
    path: &Path,
    markers: &MarkerPair,
    request: &OverrideRequest,
    strictness: Strictness,
) -> Result<ThemePatch, PatchError> {
    let doc = TextDocument::read(path)?;
    let content = doc.content();

    let span = markers.locate(content)?;
    let block = span.block(content);
    let outcome = override_values(block.text, request, strictness)?;
    let after = block.splice(content, &outcome.block);

    tracing::info!(
        path = %path.display(),
        changed = outcome.report.changed_count(),
        unchanged = outcome.report.unchanged.len(),
        missing = outcome.report.missing.len(),
        "theme overrides computed"
    );

    Ok(ThemePatch {
        path: path.to_path_buf(),
        report: outcome.report,
        written: false,
        before: content.to_string(),
        after,
    })
}

/// Compute the proxy config edit that adds the logo block after `marker`.
///
/// The asset must exist first; the block goes in at most once.
pub fn plan_logo(path: &Path, marker: &str, asset: &LogoAsset) -> Result<LogoPatch, PatchError> {
    asset.ensure_exists()?;

    let doc = TextDocument::read(path)?;
    let insertion = insert_after_marker(doc.content(), marker, &asset.location_block())?;

    if insertion.inserted {
        tracing::info!(path = %path.display(), "logo location block planned");
    } else {
        tracing::info!(path = %path.display(), "logo location block already present");
    }

    Ok(LogoPatch {
        path: path.to_path_buf(),
        asset: asset.path.clone(),
        inserted: insertion.inserted,
        written: false,
        before: doc.content().to_string(),
        after: insertion.content,
    })
}

/// Rewrite the declarations of `request` inside the marker block of the
/// stylesheet at `path`.
///
/// Any error leaves the file untouched.
pub fn patch_theme(
    path: &Path,
    markers: &MarkerPair,
    request: &OverrideRequest,
    strictness: Strictness,
    dry_run: bool,
) -> Result<ThemePatch, PatchError> {
    let mut patch = plan_theme(path, markers, request, strictness)?;
    if !dry_run {
        patch.commit()?;
    }
    Ok(patch)
}

/// Insert the logo `location` block after `marker` in the proxy config.
pub fn patch_logo(
    path: &Path,
    marker: &str,
    asset: &LogoAsset,
    dry_run: bool,
) -> Result<LogoPatch, PatchError> {
    let mut patch = plan_logo(path, marker, asset)?;
    if !dry_run {
        patch.commit()?;
    }
    Ok(patch)
}

/// Why the service commands did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DryRun,
    Disabled,
    NothingRequested,
    ArtifactFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::DryRun => "dry run",
            SkipReason::Disabled => "service commands disabled",
            SkipReason::NothingRequested => "nothing to patch",
            SkipReason::ArtifactFailed => "an artifact failed to patch",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum ServiceStep {
    Skipped(SkipReason),
    Reloaded,
    Failed(PatchError),
}

/// Everything one run did, per artifact.
#[derive(Debug)]
pub struct RunReport {
    pub theme: Option<Result<ThemePatch, PatchError>>,
    pub logo: Option<Result<LogoPatch, PatchError>>,
    pub service: ServiceStep,
}

impl RunReport {
    pub fn errors(&self) -> Vec<&PatchError> {
        let mut out = Vec::new();
        if let Some(Err(e)) = &self.theme {
            out.push(e);
        }
        if let Some(Err(e)) = &self.logo {
            out.push(e);
        }
        if let ServiceStep::Failed(e) = &self.service {
            out.push(e);
        }
        out
    }

    pub fn is_success(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn any_written(&self) -> bool {
        matches!(&self.theme, Some(Ok(t)) if t.written)
            || matches!(&self.logo, Some(Ok(l)) if l.written)
    }

    /// Machine-readable form of the report.
    pub fn to_json(&self) -> Value {
        let theme = match &self.theme {
            None => Value::Null,
            Some(Ok(t)) => json!({
                "path": t.path,
                "written": t.written,
                "changed": t.report.changed,
                "unchanged": t.report.unchanged,
                "missing": t.report.missing,
            }),
            Some(Err(e)) => error_json(e),
        };
        let logo = match &self.logo {
            None => Value::Null,
            Some(Ok(l)) => json!({
                "path": l.path,
                "asset": l.asset,
                "inserted": l.inserted,
                "written": l.written,
            }),
            Some(Err(e)) => error_json(e),
        };
        let service = match &self.service {
            ServiceStep::Skipped(reason) => json!({ "status": "skipped", "reason": reason.to_string() }),
            ServiceStep::Reloaded => json!({ "status": "reloaded" }),
            ServiceStep::Failed(e) => error_json(e),
        };
        json!({
            "success": self.is_success(),
            "theme": theme,
            "logo": logo,
            "service": service,
        })
    }
}

fn error_json(e: &PatchError) -> Value {
    json!({ "status": "failed", "error": e.kind(), "message": e.to_string() })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Compute everything, write nothing, run no commands.
    pub dry_run: bool,
    /// Never run the service commands, even after a write.
    pub skip_service: bool,
}

/// Runs a [`JobConfig`] end to end.
#[derive(Debug, Clone, Default)]
pub struct Patcher {
    options: PatchOptions,
}

impl Patcher {
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    /// Plan every enabled artifact, write them only if all planned cleanly,
    /// then validate and reload.
    ///
    /// The service step runs even when both artifacts were already up to
    /// date, so a retry after a failed reload still reloads.
    pub fn run(&self, job: &JobConfig, service: &dyn ServiceControl) -> RunReport {
        let request = job.override_request();

        let theme = (!request.is_empty()).then(|| {
            plan_theme(
                &job.paths.stylesheet,
                &job.vars_markers(),
                &request,
                job.theme.strictness,
            )
        });

        let logo = job.logo.enabled.then(|| {
            plan_logo(&job.paths.proxy_conf, &job.markers.logo, &job.logo_asset())
        });

        let mut report = RunReport {
            theme,
            logo,
            service: ServiceStep::Skipped(SkipReason::Disabled),
        };

        if report.is_success() && !self.options.dry_run {
            commit_step(&mut report.theme, ThemePatch::commit);
            if report.is_success() {
                commit_step(&mut report.logo, LogoPatch::commit);
            }
        }

        report.service = match self.skip_reason(job, &report) {
            Some(reason) => {
                tracing::debug!(%reason, "not running service commands");
                ServiceStep::Skipped(reason)
            }
            None => match validate_and_reload(service) {
                Ok(()) => ServiceStep::Reloaded,
                Err(e) => ServiceStep::Failed(e),
            },
        };

        report
    }

    fn skip_reason(&self, job: &JobConfig, report: &RunReport) -> Option<SkipReason> {
        if !report.is_success() {
            Some(SkipReason::ArtifactFailed)
        } else if self.options.dry_run {
            Some(SkipReason::DryRun)
        } else if self.options.skip_service || !job.service.enabled {
            Some(SkipReason::Disabled)
        } else if report.theme.is_none() && report.logo.is_none() {
            Some(SkipReason::NothingRequested)
        } else {
            None
        }
    }
}

/// Write a planned artifact, turning the step into an error if the write fails.
fn commit_step<T>(
    step: &mut Option<Result<T, PatchError>>,
    commit: impl FnOnce(&mut T) -> Result<(), PatchError>,
) {
    let failed = match step {
        Some(Ok(patch)) => commit(patch).err(),
        _ => None,
    };
    if let Some(e) = failed {
        *step = Some(Err(e));
    }
}
