//! Locating marker-delimited regions in free-form text.

use crate::error::PatchError;

/// A BEGIN/END pair of literal anchor tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    pub begin: String,
    pub end: String,
}

impl MarkerPair {
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Locate this pair in `content`.
    pub fn locate(&self, content: &str) -> Result<MarkerSpan, PatchError> {
        locate(content, &self.begin, &self.end)
    }
}

/// Byte offsets of the BEGIN and END marker occurrences.
///
/// `start` points at the first byte of the BEGIN marker and `end` at the first
/// byte of the END marker. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSpan {
    pub start: usize,
    pub end: usize,
}

impl MarkerSpan {
    /// The region from the BEGIN marker up to (not including) the END marker.
    pub fn block<'a>(&self, content: &'a str) -> Block<'a> {
        Block {
            text: &content[self.start..self.end],
            start: self.start,
            end: self.end,
        }
    }
}

/// A borrowed region of a document, with its offsets in the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Block<'_> {
    /// Rebuild the owning document with `replacement` in place of this block.
    pub fn splice(&self, content: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(content.len() - self.text.len() + replacement.len());
        out.push_str(&content[..self.start]);
        out.push_str(replacement);
        out.push_str(&content[self.end..]);
        out
    }
}

/// Find the unique occurrence of `marker`.
pub fn find_unique(content: &str, marker: &str) -> Result<usize, PatchError> {
    if marker.is_empty() {
        return Err(PatchError::MarkerMissing {
            marker: String::new(),
        });
    }

    let mut hits = content.match_indices(marker).map(|(idx, _)| idx);
    let first = hits.next().ok_or_else(|| PatchError::MarkerMissing {
        marker: marker.to_string(),
    })?;

    let extra = hits.count();
    if extra > 0 {
        return Err(PatchError::MarkerDuplicated {
            marker: marker.to_string(),
            count: extra + 1,
        });
    }

    Ok(first)
}

/// Locate a BEGIN/END marker pair.
///
/// Pure and deterministic. Each marker must occur exactly once and BEGIN must
/// come strictly before END.
pub fn locate(content: &str, begin: &str, end: &str) -> Result<MarkerSpan, PatchError> {
    let start = find_unique(content, begin)?;
    let stop = find_unique(content, end)?;

    if stop <= start {
        return Err(PatchError::MarkerOrderInvalid {
            begin: begin.to_string(),
            end: end.to_string(),
            begin_offset: start,
            end_offset: stop,
        });
    }

    tracing::debug!(start, end = stop, "located marker block");
    Ok(MarkerSpan { start, end: stop })
}
