use crate::logo::{LogoAsset, DEFAULT_LOGO_FILE};
use crate::marker::MarkerPair;
use crate::service::CommandService;
use crate::theme::{OverrideRequest, Strictness};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PROXY_CONF: &str = "/etc/nginx/sites-available/tb-proxy";
pub const DEFAULT_STYLESHEET: &str = "/opt/custom_assets/custom-theme.css";
pub const DEFAULT_ASSETS_DIR: &str = "/opt/custom_assets";
pub const DEFAULT_VARS_BEGIN: &str = ">>> TB_CUSTOM_THEME_VARS_BEGIN";
pub const DEFAULT_VARS_END: &str = "<<< TB_CUSTOM_THEME_VARS_END";
pub const DEFAULT_LOGO_MARKER: &str = "$MAIN_LOGO$";

/// One patch job: which files, which anchors, what to change.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct JobConfig {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub theme: ThemeSection,
    #[serde(default)]
    pub logo: LogoSection,
    #[serde(default)]
    pub service: ServiceSection,
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let markers = [
            ("markers.vars_begin", &self.markers.vars_begin),
            ("markers.vars_end", &self.markers.vars_end),
            ("markers.logo", &self.markers.logo),
        ];
        for (field, value) in markers {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { field });
            }
        }

        if !self.markers.vars_begin.is_empty() && self.markers.vars_begin == self.markers.vars_end {
            issues.push(ValidationIssue::InvalidCombo {
                message: "vars_begin and vars_end must differ".to_string(),
            });
        }

        for selector in self.theme.overrides.keys() {
            if selector.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "theme.overrides.<selector>",
                });
            }
        }

        if self.service.enabled {
            if self.service.validate.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "service.validate",
                });
            }
            if self.service.reload.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "service.reload",
                });
            }
        }

        if self.logo.enabled && self.logo.file.as_os_str().is_empty() {
            issues.push(ValidationIssue::MissingField { field: "logo.file" });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn vars_markers(&self) -> MarkerPair {
        MarkerPair::new(&self.markers.vars_begin, &self.markers.vars_end)
    }

    pub fn override_request(&self) -> OverrideRequest {
        self.theme
            .overrides
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    pub fn logo_asset(&self) -> LogoAsset {
        LogoAsset::resolve(
            &self.paths.assets_dir,
            &self.logo.file,
            self.logo.route.as_deref(),
        )
    }

    pub fn command_service(&self) -> CommandService {
        CommandService {
            validate: self.service.validate.clone(),
            reload: self.service.reload.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Paths {
    #[serde(default = "default_proxy_conf")]
    pub proxy_conf: PathBuf,
    #[serde(default = "default_stylesheet")]
    pub stylesheet: PathBuf,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            proxy_conf: default_proxy_conf(),
            stylesheet: default_stylesheet(),
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_proxy_conf() -> PathBuf {
    PathBuf::from(DEFAULT_PROXY_CONF)
}

fn default_stylesheet() -> PathBuf {
    PathBuf::from(DEFAULT_STYLESHEET)
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ASSETS_DIR)
}

#[derive(Debug, Deserialize, Clone)]
pub struct Markers {
    #[serde(default = "default_vars_begin")]
    pub vars_begin: String,
    #[serde(default = "default_vars_end")]
    pub vars_end: String,
    #[serde(default = "default_logo_marker")]
    pub logo: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            vars_begin: default_vars_begin(),
            vars_end: default_vars_end(),
            logo: default_logo_marker(),
        }
    }
}

fn default_vars_begin() -> String {
    DEFAULT_VARS_BEGIN.to_string()
}

fn default_vars_end() -> String {
    DEFAULT_VARS_END.to_string()
}

fn default_logo_marker() -> String {
    DEFAULT_LOGO_MARKER.to_string()
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ThemeSection {
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogoSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_logo_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub route: Option<String>,
}

impl Default for LogoSection {
    fn default() -> Self {
        Self {
            enabled: false,
            file: default_logo_file(),
            route: None,
        }
    }
}

fn default_logo_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOGO_FILE)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_validate_cmd")]
    pub validate: Vec<String>,
    #[serde(default = "default_reload_cmd")]
    pub reload: Vec<String>,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            enabled: true,
            validate: default_validate_cmd(),
            reload: default_reload_cmd(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_validate_cmd() -> Vec<String> {
    CommandService::default().validate
}

fn default_reload_cmd() -> Vec<String> {
    CommandService::default().reload
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing or empty required field '{field}'")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}
