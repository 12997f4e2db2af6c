//! Known theme variables, grouped by category.
//!
//! The catalog is an explicitly constructed, immutable table. Callers use it to
//! list variables, fetch defaults and sanity-check values before building an
//! override request. The override engine never consults it.

use crate::theme::decoration::is_number;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Hex,
    Px,
    Enum,
    Css,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Hex => "hex",
            ValueKind::Px => "px",
            ValueKind::Enum => "enum",
            ValueKind::Css => "css",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSpec {
    pub name: &'static str,
    pub category: &'static str,
    pub default: &'static str,
    pub kind: ValueKind,
    /// Allowed values for [`ValueKind::Enum`].
    pub options: &'static [&'static str],
    pub description: &'static str,
}

/// A value the catalog would not accept for a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    UnknownVariable {
        name: String,
        suggestion: Option<&'static str>,
    },
    InvalidValue {
        name: String,
        kind: ValueKind,
        value: String,
        expected: String,
    },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::UnknownVariable { name, suggestion } => match suggestion {
                Some(s) => write!(f, "unknown variable '{name}' (did you mean '{s}'?)"),
                None => write!(f, "unknown variable '{name}'"),
            },
            CatalogIssue::InvalidValue {
                name,
                kind,
                value,
                expected,
            } => write!(
                f,
                "invalid {kind} value for {name}: '{value}' (expected {expected})"
            ),
        }
    }
}

impl std::error::Error for CatalogIssue {}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<VariableSpec>,
}

const ALIGN_OPTIONS: &[&str] = &["flex-start", "center", "flex-end"];

macro_rules! var {
    ($cat:expr, $name:expr, $default:expr, $kind:ident, $desc:expr) => {
        VariableSpec {
            name: $name,
            category: $cat,
            default: $default,
            kind: ValueKind::$kind,
            options: &[],
            description: $desc,
        }
    };
}

impl Catalog {
    pub fn new(entries: Vec<VariableSpec>) -> Self {
        Self { entries }
    }

    /// The dashboard's theme variables.
    pub fn builtin() -> Self {
        let entries = vec![
            var!("surfaces", "--tb-topbar-bg", "#181818", Hex, "Top toolbar / header background."),
            var!("surfaces", "--tb-sidebar-bg", "#121212", Hex, "Sidebar background color."),
            var!("surfaces", "--tb-main-bg", "#0f1115", Hex, "Main content background (page body)."),
            var!("logo", "--tb-logo-w", "156px", Px, "Sidebar logo width."),
            var!("logo", "--tb-logo-h", "50px", Px, "Sidebar logo height."),
            var!("logo", "--tb-logo-pad-x", "12px", Px, "Horizontal padding around sidebar logo container."),
            var!("logo", "--tb-logo-pad-y", "10px", Px, "Vertical padding around sidebar logo container."),
            VariableSpec {
                name: "--tb-logo-align",
                category: "logo",
                default: "flex-start",
                kind: ValueKind::Enum,
                options: ALIGN_OPTIONS,
                description: "Logo container alignment: flex-start | center | flex-end.",
            },
            var!("text", "--tb-text", "#e5e7eb", Hex, "Primary text color across UI."),
            var!("text", "--tb-text-muted", "#9ca3af", Hex, "Muted/secondary text (subtitles, hints)."),
            var!("text", "--tb-text-invert", "#0b0f16", Hex, "Text color used on bright brand-colored surfaces (buttons)."),
            var!("brand", "--tb-brand", "#ff7a00", Hex, "Primary brand color used for buttons, links, accents."),
            var!("brand", "--tb-brand-2", "#ffd900", Hex, "Secondary accent color (optional highlight color)."),
            var!("brand", "--tb-accent", "#22c55e", Hex, "Accent color for success-ish highlights."),
            var!("brand", "--tb-link", "var(--tb-brand)", Css, "Link color. Can be hex or another CSS var reference."),
            var!("buttons", "--tb-btn-bg", "var(--tb-brand)", Css, "Primary button background."),
            var!("buttons", "--tb-btn-text", "var(--tb-text-invert)", Css, "Primary button text color."),
            var!("buttons", "--tb-btn-radius", "10px", Px, "Button corner radius."),
            var!("buttons", "--tb-btn-padding-y", "8px", Px, "Button vertical padding (best-effort)."),
            var!("buttons", "--tb-btn-padding-x", "14px", Px, "Button horizontal padding (best-effort)."),
            var!("inputs", "--tb-input-bg", "#0e1117", Hex, "Input background color."),
            var!("inputs", "--tb-input-text", "var(--tb-text)", Css, "Input text color."),
            var!("inputs", "--tb-input-border", "var(--tb-border)", Css, "Input border color."),
            var!("inputs", "--tb-input-radius", "10px", Px, "Input corner radius."),
            var!("inputs", "--tb-input-focus", "var(--tb-brand)", Css, "Focus outline/accent for inputs (best-effort)."),
            var!("cards", "--tb-card-bg", "#151821", Hex, "Card/widget background color."),
            var!("cards", "--tb-card-bg-hover", "#1a1f2b", Hex, "Card/widget hover background color."),
            var!("cards", "--tb-card-radius", "12px", Px, "Card corner radius."),
            var!("cards", "--tb-card-padding", "12px", Px, "Default padding for card-like components (best-effort)."),
            var!("interactions", "--tb-hover-bg", "rgba(255,122,0,.12)", Css, "Hover background for sidebar rows, table rows, etc."),
            var!("interactions", "--tb-selected-bg", "rgba(255,122,0,.18)", Css, "Selected/active background for sidebar items (best-effort)."),
            var!("borders", "--tb-border", "#262b36", Hex, "Default border color for cards/inputs."),
            var!("borders", "--tb-border-strong", "#343b4a", Hex, "Stronger border color for emphasis/separation."),
            var!("borders", "--tb-divider", "rgba(229,231,235,.08)", Css, "Divider lines (toolbar bottom, sidebar right, table row separators)."),
            var!("status", "--tb-success", "#22c55e", Hex, "Success color (chips, highlights, etc.)."),
            var!("status", "--tb-warning", "#f59e0b", Hex, "Warning color."),
            var!("status", "--tb-danger", "#ef4444", Hex, "Danger/error color."),
            var!("status", "--tb-info", "#3b82f6", Hex, "Info color."),
            var!("shadows", "--tb-shadow", "0 8px 24px rgba(0,0,0,.35)", Css, "Stronger shadow preset for raised surfaces."),
            var!("shadows", "--tb-shadow-soft", "0 6px 18px rgba(0,0,0,.22)", Css, "Softer shadow preset for cards."),
        ];
        Self::new(entries)
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.category) {
                out.push(entry.category);
            }
        }
        out
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a VariableSpec> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableSpec> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest known name, if any is reasonably close.
    pub fn suggest(&self, name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .map(|e| (e.name, strsim::jaro_winkler(name, e.name)))
            .filter(|(_, score)| *score >= 0.85)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n)
    }

    /// Check a proposed value against the variable's kind.
    pub fn check(&self, name: &str, value: &str) -> Result<&VariableSpec, CatalogIssue> {
        let spec = self.get(name).ok_or_else(|| CatalogIssue::UnknownVariable {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })?;

        let value = value.trim();
        let ok = match spec.kind {
            ValueKind::Hex => {
                let hex = value.strip_prefix('#').unwrap_or(value);
                hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
            }
            ValueKind::Px => is_number(value.strip_suffix("px").unwrap_or(value)),
            ValueKind::Enum => spec.options.iter().any(|o| *o == value),
            ValueKind::Css => !value.is_empty() && !value.contains([';', '\n', '\r']),
        };

        if ok {
            Ok(spec)
        } else {
            Err(CatalogIssue::InvalidValue {
                name: name.to_string(),
                kind: spec.kind,
                value: value.to_string(),
                expected: expected_for(spec),
            })
        }
    }
}

fn expected_for(spec: &VariableSpec) -> String {
    match spec.kind {
        ValueKind::Hex => "6 hex digits, optional leading '#'".to_string(),
        ValueKind::Px => "a number, optional 'px' suffix".to_string(),
        ValueKind::Enum => format!("one of: {}", spec.options.join(" | ")),
        ValueKind::Css => "a CSS value without ';' or line breaks".to_string(),
    }
}
