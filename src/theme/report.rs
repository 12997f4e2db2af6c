use serde::Serialize;

/// One declaration whose value was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub selector: String,
    pub old: String,
    pub new: String,
}

/// Per-selector outcome of one override pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideReport {
    pub changed: Vec<ValueChange>,
    /// Requested value already in place.
    pub unchanged: Vec<String>,
    /// No live declaration found (lenient mode only).
    pub missing: Vec<String>,
}

impl OverrideReport {
    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}
