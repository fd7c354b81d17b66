// Copyright 2025 Oxide Computer Company

use crate::ElementKind;

/// Errors that abort a comparison run.
///
/// Data-level divergence is never an error; it is reported as a
/// [`crate::Difference`]. These variants cover setup defects and documents
/// whose references cannot be followed.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// No comparer is registered for a kind the walk encountered.
    #[error("no comparer registered for {kind}")]
    MissingComparer { kind: ElementKind },

    /// A comparer was handed a node of a different kind than it handles.
    #[error("comparer for {expected} received a {found} node")]
    UnexpectedNode {
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("invalid reference {reference:?}: expected #/components/<kind>/<id> or #/paths/<path>")]
    InvalidReference { reference: String },

    #[error("reference {reference:?} does not resolve to a {expected}")]
    UnresolvedReference {
        reference: String,
        expected: ElementKind,
    },

    #[error("reference {reference:?} is part of a cycle of aliases")]
    CyclicReference { reference: String },

    /// The run visited more distinct schema pairs than the configured limit.
    #[error("comparison visited more than {limit} distinct schema pairs")]
    BudgetExceeded { limit: usize },
}
