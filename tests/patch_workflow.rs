//! End-to-end patch workflow
//!
//! Runs full jobs against a mock deployment:
//! 1. Theme overrides inside the vars block
//! 2. Logo block insertion into the proxy config
//! 3. Validate-then-reload ordering
//! 4. Idempotency of repeated runs

use std::cell::RefCell;
use std::fs;
use tb_override::{
    JobConfig, PatchError, PatchOptions, Patcher, ServiceControl, ServiceStep, SkipReason,
    Strictness,
};
use tempfile::TempDir;

const THEME_CSS: &str = r#"/* Dashboard overrides */
body { font-family: sans-serif; }

/* >>> TB_CUSTOM_THEME_VARS_BEGIN */
:root {
  --tb-topbar-bg: #181818;
  /* --tb-logo-w: 90px; */
  --tb-logo-w: 156px;
  --tb-logo-h: 50px;
  --tb-logo-align: flex-start;
  --tb-link: var(--tb-brand);
  --tb-shadow: 0 8px 24px rgba(0,0,0,.35);
}
/* <<< TB_CUSTOM_THEME_VARS_END */

.sidebar-logo { width: var(--tb-logo-w); height: 156px; }
"#;

const PROXY_CONF: &str = r#"server {
    listen 80;
    server_name tb.local;

    # $MAIN_LOGO$

    location / {
        proxy_pass http://127.0.0.1:8080;
    }
}
"#;

/// Records every call so ordering can be asserted.
#[derive(Default)]
struct RecordingService {
    calls: RefCell<Vec<&'static str>>,
    fail_validate: bool,
    fail_reload: bool,
}

impl ServiceControl for RecordingService {
    fn validate(&self) -> Result<(), PatchError> {
        self.calls.borrow_mut().push("validate");
        if self.fail_validate {
            return Err(PatchError::ValidationFailed {
                command: "nginx -t".into(),
                detail: "emerg: unexpected \"}\"".into(),
            });
        }
        Ok(())
    }

    fn reload(&self) -> Result<(), PatchError> {
        self.calls.borrow_mut().push("reload");
        if self.fail_reload {
            return Err(PatchError::ReloadFailed {
                command: "systemctl reload nginx".into(),
                detail: "unit not found".into(),
            });
        }
        Ok(())
    }
}

fn setup_deployment() -> (TempDir, JobConfig) {
    let dir = TempDir::new().unwrap();
    let assets = dir.path().join("custom_assets");
    fs::create_dir_all(&assets).unwrap();

    fs::write(assets.join("custom-theme.css"), THEME_CSS).unwrap();
    fs::write(assets.join("logo_title_white.svg"), "<svg/>").unwrap();
    fs::write(dir.path().join("tb-proxy"), PROXY_CONF).unwrap();

    let mut job = JobConfig::default();
    job.paths.stylesheet = assets.join("custom-theme.css");
    job.paths.assets_dir = assets;
    job.paths.proxy_conf = dir.path().join("tb-proxy");
    job.markers.vars_begin = ">>> TB_CUSTOM_THEME_VARS_BEGIN".into();
    job.markers.vars_end = "<<< TB_CUSTOM_THEME_VARS_END".into();

    (dir, job)
}

fn css(job: &JobConfig) -> String {
    fs::read_to_string(&job.paths.stylesheet).unwrap()
}

fn conf(job: &JobConfig) -> String {
    fs::read_to_string(&job.paths.proxy_conf).unwrap()
}

#[test]
fn test_full_run_patches_both_and_reloads() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "200".into());
    job.theme
        .overrides
        .insert("--tb-topbar-bg".into(), "ffd900".into());
    job.logo.enabled = true;

    let service = RecordingService::default();
    let report = Patcher::default().run(&job, &service);

    assert!(report.is_success(), "{:?}", report.errors());
    assert!(matches!(report.service, ServiceStep::Reloaded));
    assert_eq!(*service.calls.borrow(), vec!["validate", "reload"]);

    let theme = css(&job);
    assert!(theme.contains("  --tb-logo-w: 200px;\n"));
    assert!(theme.contains("  --tb-topbar-bg: #ffd900;\n"));
    // Commented-out declaration and rules outside the block are untouched.
    assert!(theme.contains("/* --tb-logo-w: 90px; */"));
    assert!(theme.contains("height: 156px;"));

    let proxy = conf(&job);
    assert!(proxy.contains("# $MAIN_LOGO$\n    location = /assets/logo_title_white.svg {\n"));
    assert!(proxy.contains("add_header Cache-Control \"no-store\";"));
}

#[test]
fn test_second_run_leaves_files_and_still_reloads() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-h".into(), "64px".into());
    job.logo.enabled = true;

    let first_service = RecordingService::default();
    let first = Patcher::default().run(&job, &first_service);
    assert!(first.any_written());
    let css_after_first = css(&job);
    let conf_after_first = conf(&job);

    let second_service = RecordingService::default();
    let second = Patcher::default().run(&job, &second_service);

    assert!(second.is_success());
    assert!(!second.any_written());
    assert!(matches!(second.service, ServiceStep::Reloaded));
    assert_eq!(*second_service.calls.borrow(), vec!["validate", "reload"]);
    assert_eq!(css(&job), css_after_first);
    assert_eq!(conf(&job), conf_after_first);

    match &second.theme {
        Some(Ok(patch)) => assert_eq!(patch.report.unchanged, vec!["--tb-logo-h".to_string()]),
        other => panic!("unexpected theme result: {other:?}"),
    }
    match &second.logo {
        Some(Ok(patch)) => assert!(!patch.inserted),
        other => panic!("unexpected logo result: {other:?}"),
    }
}

#[test]
fn test_validation_failure_never_reloads() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "10".into());

    let service = RecordingService {
        fail_validate: true,
        ..Default::default()
    };
    let report = Patcher::default().run(&job, &service);

    assert!(!report.is_success());
    assert!(matches!(
        report.service,
        ServiceStep::Failed(PatchError::ValidationFailed { .. })
    ));
    assert_eq!(*service.calls.borrow(), vec!["validate"]);
}

#[test]
fn test_reload_failure_keeps_written_files() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "10".into());

    let service = RecordingService {
        fail_reload: true,
        ..Default::default()
    };
    let report = Patcher::default().run(&job, &service);

    assert!(matches!(
        report.service,
        ServiceStep::Failed(PatchError::ReloadFailed { .. })
    ));
    assert!(css(&job).contains("--tb-logo-w: 10px;"));
}

#[test]
fn test_retry_after_reload_failure_reloads() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "180".into());
    job.logo.enabled = true;

    let broken = RecordingService {
        fail_reload: true,
        ..Default::default()
    };
    let first = Patcher::default().run(&job, &broken);
    assert!(first.any_written());
    assert!(matches!(
        first.service,
        ServiceStep::Failed(PatchError::ReloadFailed { .. })
    ));

    let service = RecordingService::default();
    let retry = Patcher::default().run(&job, &service);

    assert!(retry.is_success());
    assert!(!retry.any_written());
    assert!(matches!(retry.service, ServiceStep::Reloaded));
    assert_eq!(*service.calls.borrow(), vec!["validate", "reload"]);
}

#[test]
fn test_theme_failure_leaves_proxy_config_untouched() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-not-in-block".into(), "1".into());
    job.logo.enabled = true;

    let service = RecordingService::default();
    let report = Patcher::default().run(&job, &service);

    assert!(matches!(
        report.theme,
        Some(Err(PatchError::SelectorNotFound { .. }))
    ));
    match &report.logo {
        Some(Ok(patch)) => assert!(patch.inserted && !patch.written),
        other => panic!("unexpected logo result: {other:?}"),
    }
    assert!(!report.any_written());
    assert!(matches!(
        report.service,
        ServiceStep::Skipped(SkipReason::ArtifactFailed)
    ));
    assert!(service.calls.borrow().is_empty());
    assert_eq!(conf(&job), PROXY_CONF);
    assert_eq!(css(&job), THEME_CSS);
}

#[test]
fn test_logo_failure_leaves_stylesheet_untouched() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "99".into());
    job.logo.enabled = true;
    job.logo.file = "missing.svg".into();

    let report = Patcher::default().run(&job, &RecordingService::default());

    assert!(matches!(report.theme, Some(Ok(ref t)) if !t.written));
    assert_eq!(css(&job), THEME_CSS);
}

#[test]
fn test_nothing_requested_skips_service() {
    let (_dir, job) = setup_deployment();

    let service = RecordingService::default();
    let report = Patcher::default().run(&job, &service);

    assert!(report.theme.is_none() && report.logo.is_none());
    assert!(matches!(
        report.service,
        ServiceStep::Skipped(SkipReason::NothingRequested)
    ));
    assert!(service.calls.borrow().is_empty());
}

#[test]
fn test_marker_order_invalid_leaves_file_untouched() {
    let (_dir, mut job) = setup_deployment();
    let reversed = THEME_CSS
        .replace(">>> TB_CUSTOM_THEME_VARS_BEGIN", "@@BEGIN@@")
        .replace("<<< TB_CUSTOM_THEME_VARS_END", ">>> TB_CUSTOM_THEME_VARS_BEGIN")
        .replace("@@BEGIN@@", "<<< TB_CUSTOM_THEME_VARS_END");
    fs::write(&job.paths.stylesheet, &reversed).unwrap();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "10".into());

    let service = RecordingService::default();
    let report = Patcher::default().run(&job, &service);

    assert!(matches!(
        report.theme,
        Some(Err(PatchError::MarkerOrderInvalid { .. }))
    ));
    assert!(matches!(
        report.service,
        ServiceStep::Skipped(SkipReason::ArtifactFailed)
    ));
    assert!(service.calls.borrow().is_empty());
    assert_eq!(css(&job), reversed);
}

#[test]
fn test_missing_marker_leaves_file_untouched() {
    let (_dir, mut job) = setup_deployment();
    let without_end = THEME_CSS.replace("/* <<< TB_CUSTOM_THEME_VARS_END */\n", "");
    fs::write(&job.paths.stylesheet, &without_end).unwrap();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "10".into());

    let report = Patcher::default().run(&job, &RecordingService::default());

    assert!(matches!(
        report.theme,
        Some(Err(PatchError::MarkerMissing { .. }))
    ));
    assert_eq!(css(&job), without_end);
}

#[test]
fn test_lenient_mode_reports_missing_selector() {
    let (_dir, mut job) = setup_deployment();
    job.theme.strictness = Strictness::Lenient;
    job.theme
        .overrides
        .insert("--tb-card-radius".into(), "4".into());
    job.theme
        .overrides
        .insert("--tb-logo-align".into(), "center".into());

    let report = Patcher::default().run(&job, &RecordingService::default());

    assert!(report.is_success());
    match &report.theme {
        Some(Ok(patch)) => {
            assert_eq!(patch.report.missing, vec!["--tb-card-radius".to_string()]);
            assert_eq!(patch.report.changed_count(), 1);
        }
        other => panic!("unexpected theme result: {other:?}"),
    }
    assert!(css(&job).contains("--tb-logo-align: center;"));
}

#[test]
fn test_strict_mode_missing_selector_writes_nothing() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-card-radius".into(), "4".into());
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "1".into());

    let report = Patcher::default().run(&job, &RecordingService::default());

    assert!(matches!(
        report.theme,
        Some(Err(PatchError::SelectorNotFound { .. }))
    ));
    assert_eq!(css(&job), THEME_CSS);
}

#[test]
fn test_missing_logo_asset() {
    let (_dir, mut job) = setup_deployment();
    job.logo.enabled = true;
    job.logo.file = "missing.svg".into();

    let report = Patcher::default().run(&job, &RecordingService::default());

    assert!(matches!(
        report.logo,
        Some(Err(PatchError::AssetMissing { .. }))
    ));
    assert_eq!(conf(&job), PROXY_CONF);
}

#[test]
fn test_dry_run_writes_nothing_and_skips_service() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "300".into());
    job.logo.enabled = true;

    let service = RecordingService::default();
    let patcher = Patcher::new(PatchOptions {
        dry_run: true,
        skip_service: false,
    });
    let report = patcher.run(&job, &service);

    assert!(report.is_success());
    assert!(matches!(report.service, ServiceStep::Skipped(SkipReason::DryRun)));
    assert!(service.calls.borrow().is_empty());
    assert_eq!(css(&job), THEME_CSS);
    assert_eq!(conf(&job), PROXY_CONF);

    match &report.theme {
        Some(Ok(patch)) => assert!(patch.after.contains("--tb-logo-w: 300px;")),
        other => panic!("unexpected theme result: {other:?}"),
    }
}

#[test]
fn test_report_json_shape() {
    let (_dir, mut job) = setup_deployment();
    job.theme
        .overrides
        .insert("--tb-logo-w".into(), "200".into());
    job.service.enabled = false;

    let report = Patcher::default().run(&job, &RecordingService::default());
    let json = report.to_json();

    assert_eq!(json["success"], true);
    assert_eq!(json["theme"]["changed"][0]["selector"], "--tb-logo-w");
    assert_eq!(json["theme"]["changed"][0]["new"], "200px");
    assert_eq!(json["logo"], serde_json::Value::Null);
    assert_eq!(json["service"]["status"], "skipped");
}
