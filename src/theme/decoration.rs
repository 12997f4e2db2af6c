//! Value-decoration model for declaration values.
//!
//! A value token such as `#181818` or `156px` is split once into a bare
//! value plus the conventions it carries. Normalizing a caller's new value
//! reuses that split instead of re-sniffing strings at every step.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixKind {
    None,
    /// Hex color: `#rrggbb`
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixKind {
    None,
    /// Length in pixels: `<number>px`
    Px,
}

/// A value token with its detected prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratedValue {
    pub raw: String,
    pub prefix: PrefixKind,
    pub suffix: SuffixKind,
}

/// The token carries both a `#` prefix and a `px` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedDecoration;

impl DecoratedValue {
    /// Split a value token into its decoration and bare value.
    ///
    /// `px` is only recognized when what precedes it is a plain number, so
    /// compound values like `8px 12px` or `0 8px 24px rgba(0,0,0,.35)` stay
    /// undecorated and are substituted verbatim.
    pub fn parse(token: &str) -> Result<Self, MixedDecoration> {
        let token = token.trim();
        let hashed = token.strip_prefix('#');
        let px_body = token.strip_suffix("px").filter(|body| is_number(body));

        match (hashed, px_body) {
            (Some(_), _) if token.ends_with("px") => Err(MixedDecoration),
            (Some(raw), None) => Ok(Self {
                raw: raw.to_string(),
                prefix: PrefixKind::Hash,
                suffix: SuffixKind::None,
            }),
            (None, Some(raw)) => Ok(Self {
                raw: raw.to_string(),
                prefix: PrefixKind::None,
                suffix: SuffixKind::Px,
            }),
            _ => Ok(Self {
                raw: token.to_string(),
                prefix: PrefixKind::None,
                suffix: SuffixKind::None,
            }),
        }
    }

    /// Apply this value's conventions to a caller-supplied value.
    ///
    /// Exactly one `#` / `px` ends up on the result, whether or not the caller
    /// already included it.
    pub fn normalize(&self, new_value: &str) -> String {
        let mut value = new_value.trim();

        if self.prefix == PrefixKind::Hash {
            value = value.trim_start_matches('#');
        }
        if self.suffix == SuffixKind::Px {
            value = value.trim_end_matches("px");
        }

        let mut out = String::with_capacity(value.len() + 2);
        if self.prefix == PrefixKind::Hash {
            out.push('#');
        }
        out.push_str(value);
        if self.suffix == SuffixKind::Px {
            out.push_str("px");
        }
        out
    }
}

impl fmt::Display for DecoratedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix == PrefixKind::Hash {
            f.write_str("#")?;
        }
        f.write_str(&self.raw)?;
        if self.suffix == SuffixKind::Px {
            f.write_str("px")?;
        }
        Ok(())
    }
}

/// `-1`, `12`, `0.5`, `.5`
pub(crate) fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}
