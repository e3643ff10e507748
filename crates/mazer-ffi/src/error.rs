//! Bridge-level failures.
//!
//! These are failures of the bridge itself, distinct from engine failures,
//! which are reported as sentinel values.

use thiserror::Error;

/// A native cell record that could not be copied into a host [`Cell`](mazer_core::Cell).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CellError {
    /// A text field (or a neighbor entry) was a null pointer.
    #[error("null text pointer in field `{field}`")]
    NullText {
        /// Name of the record field.
        field: &'static str,
    },
    /// A text field was not valid UTF-8.
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 {
        /// Name of the record field.
        field: &'static str,
    },
    /// A native `size_t` coordinate does not fit the host's `i64`.
    #[error("coordinate {value} does not fit in i64")]
    CoordinateOverflow {
        /// The native value.
        value: usize,
    },
    /// The host could not allocate the neighbor list.
    #[error("could not allocate {len} neighbor entries")]
    Allocation {
        /// Requested entries.
        len: usize,
    },
}

/// A native cell array that could not be converted.
///
/// The native buffer has always been released by the time this is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// One element failed to convert.
    #[error("cell {index}: {source}")]
    Element {
        /// Position of the failing record in the native array.
        index: usize,
        /// Why it failed.
        source: CellError,
    },
    /// The host could not allocate the output sequence.
    #[error("could not allocate {len} host cells")]
    Allocation {
        /// Requested cells.
        len: usize,
    },
}

/// The engine refused a move; the grid is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("move '{direction}' rejected")]
pub struct MoveRejected {
    /// The direction token that was forwarded.
    pub direction: String,
}
