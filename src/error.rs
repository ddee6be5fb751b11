use thiserror::Error;

/// Everything that can stop a solve before it produces an answer.
///
/// Not finding a route is not an error; see [`crate::crucible::Outcome::Unreachable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("grid has no rows")]
    EmptyGrid,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid cost {found:?} at row {row}, column {col}")]
    InvalidCost { row: usize, col: usize, found: char },

    #[error("grid has a single cell, start and target coincide")]
    SingleCell,

    #[error("invalid run limits {min}..={max}, need 1 <= min <= max")]
    InvalidRunLimits { min: usize, max: usize },

    #[error("failed to read input: {0}")]
    Io(String),

    /// A generated state broke the heading/run invariant. This is a bug in
    /// the state generator, never a property of the input.
    #[error("generated invalid state: {0}")]
    InvalidState(String),
}

impl From<std::io::Error> for SolveError {
    fn from(err: std::io::Error) -> Self {
        SolveError::Io(err.to_string())
    }
}
