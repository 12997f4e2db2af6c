pub mod decoration;
pub mod engine;
pub mod report;

pub use decoration::{DecoratedValue, PrefixKind, SuffixKind};
pub use engine::{
    extract_assignments, find_assignment, override_values, OverrideOutcome, OverrideRequest,
    Strictness, VariableAssignment,
};
pub use report::{OverrideReport, ValueChange};
