//! Scoped value overrides inside a marker block.
//!
//! The engine only knows about text: a declaration is a single line of the
//! form `<name> : <value> ;`. It rewrites the value span of the first live
//! (non-comment) declaration of each requested name and leaves every other
//! byte of the block alone.

use crate::error::PatchError;
use crate::theme::decoration::{DecoratedValue, MixedDecoration};
use crate::theme::report::{OverrideReport, ValueChange};
use regex::Regex;
use serde::Deserialize;
use std::ops::Range;
use std::sync::OnceLock;

/// What to do when a requested selector has no live declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Abort the whole override; nothing is written.
    #[default]
    Strict,
    /// Skip the selector and record it in [`OverrideReport::missing`].
    Lenient,
}

/// Ordered selector → new value mapping. Setting a selector twice keeps the
/// position of the first insert and the value of the last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideRequest {
    entries: Vec<(String, String)>,
}

impl OverrideRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, selector: impl Into<String>, value: impl Into<String>) {
        let selector = selector.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(s, _)| *s == selector) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((selector, value)),
        }
    }

    pub fn get(&self, selector: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OverrideRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = OverrideRequest::new();
        request.extend(iter);
        request
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for OverrideRequest {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

/// A live declaration found in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableAssignment {
    pub selector: String,
    pub value: DecoratedValue,
    /// Byte range of the value token within the block.
    pub span: Range<usize>,
}

/// Result of [`override_values`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideOutcome {
    pub block: String,
    pub report: OverrideReport,
}

fn declaration_regex() -> &'static Regex {
    static DECLARATION: OnceLock<Regex> = OnceLock::new();
    DECLARATION.get_or_init(|| {
        Regex::new(r"^[ \t]*(?P<name>[^\s:;]+)[ \t]*:[ \t]*(?P<value>[^;\n]*?)[ \t]*;")
            .expect("declaration regex is valid")
    })
}

/// Raw declaration lines, before value decoration is applied.
struct RawDeclaration<'a> {
    name: &'a str,
    value: &'a str,
    span: Range<usize>,
}

/// Walk the live declarations of `block` in order.
///
/// Lines that start inside a `/* ... */` comment, or whose first non-blank
/// characters open one, never yield a declaration.
fn live_declarations(block: &str) -> impl Iterator<Item = RawDeclaration<'_>> {
    let mut offset = 0;
    let mut in_comment = false;

    block.split_inclusive('\n').filter_map(move |line| {
        let line_start = offset;
        offset += line.len();

        let skip = in_comment || line.trim_start().starts_with("/*");
        in_comment = comment_state_after(line, in_comment);
        if skip {
            return None;
        }

        let caps = declaration_regex().captures(line)?;
        let name = caps.name("name")?;
        let value = caps.name("value")?;
        Some(RawDeclaration {
            name: name.as_str(),
            value: value.as_str(),
            span: line_start + value.start()..line_start + value.end(),
        })
    })
}

/// Comment state at the end of `line`.
///
/// `/*` and `*/` inside a quoted string are plain text. Strings never span
/// lines in CSS, so quote state starts fresh on every line.
fn comment_state_after(line: &str, mut in_comment: bool) -> bool {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        if in_comment {
            if b == b'*' && next == Some(b'/') {
                in_comment = false;
                i += 1;
            }
        } else if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else if b == b'"' || b == b'\'' {
            quote = Some(b);
        } else if b == b'/' && next == Some(b'*') {
            in_comment = true;
            i += 1;
        }
        i += 1;
    }

    in_comment
}

fn decorate(selector: &str, raw: &str) -> Result<DecoratedValue, PatchError> {
    DecoratedValue::parse(raw).map_err(|MixedDecoration| PatchError::MalformedValue {
        selector: selector.to_string(),
        value: raw.to_string(),
    })
}

/// Find the first live declaration of `selector`.
///
/// The name is compared as a whole token, so `--tb-logo` never matches
/// `--tb-logo-w`.
pub fn find_assignment(
    block: &str,
    selector: &str,
) -> Result<Option<VariableAssignment>, PatchError> {
    let Some(decl) = live_declarations(block).find(|d| d.name == selector) else {
        return Ok(None);
    };
    Ok(Some(VariableAssignment {
        selector: decl.name.to_string(),
        value: decorate(decl.name, decl.value)?,
        span: decl.span,
    }))
}

/// Every live declaration in `block`, in document order.
pub fn extract_assignments(block: &str) -> Result<Vec<VariableAssignment>, PatchError> {
    live_declarations(block)
        .map(|d| {
            Ok(VariableAssignment {
                selector: d.name.to_string(),
                value: decorate(d.name, d.value)?,
                span: d.span,
            })
        })
        .collect()
}

/// Rewrite the requested declarations in `block`.
///
/// Selectors are applied one after another against the current block text.
/// A selector whose normalized new value equals the current one is left
/// untouched and reported as unchanged, so re-running the same request is a
/// no-op.
pub fn override_values(
    block: &str,
    request: &OverrideRequest,
    strictness: Strictness,
) -> Result<OverrideOutcome, PatchError> {
    let mut current = block.to_string();
    let mut report = OverrideReport::default();

    for (selector, new_value) in request.iter() {
        let Some(assignment) = find_assignment(&current, selector)? else {
            match strictness {
                Strictness::Strict => {
                    return Err(PatchError::SelectorNotFound {
                        selector: selector.to_string(),
                    })
                }
                Strictness::Lenient => {
                    tracing::warn!(selector, "no live declaration, skipping");
                    report.missing.push(selector.to_string());
                    continue;
                }
            }
        };

        // `;` or a line break would split the declaration and break idempotence.
        if new_value.trim().is_empty() || new_value.contains([';', '\n', '\r']) {
            return Err(PatchError::MalformedValue {
                selector: selector.to_string(),
                value: new_value.to_string(),
            });
        }

        let old = assignment.value.to_string();
        let new = assignment.value.normalize(new_value);

        if old == new {
            tracing::debug!(selector, value = %old, "value unchanged");
            report.unchanged.push(selector.to_string());
            continue;
        }

        tracing::debug!(selector, %old, %new, "overriding value");
        current.replace_range(assignment.span, &new);
        report.changed.push(ValueChange {
            selector: selector.to_string(),
            old,
            new,
        });
    }

    Ok(OverrideOutcome {
        block: current,
        report,
    })
}
