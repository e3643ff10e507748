//! Host-facing status codes.
//!
//! [`MazerStatus`] is a `repr(i32)` enum so host bindings can carry it as a
//! plain integer. `Ok` = 0, all errors are negative. Values are ABI-stable.

use crate::error::{CellError, MarshalError, MoveRejected};

/// Outcome of a bridge call, as reported to hosts.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazerStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// The engine could not build a grid from the request.
    ConstructionFailed = -2,
    /// The engine rejected a move.
    InvalidMove = -3,
    /// A native cell record could not be copied.
    MarshalFailed = -4,
    /// The host could not allocate memory for a copy.
    AllocationFailed = -5,
}

impl MazerStatus {
    /// Status for a raw code, if it is one of ours.
    pub fn from_code(code: i32) -> Option<Self> {
        [
            Self::Ok,
            Self::InvalidHandle,
            Self::ConstructionFailed,
            Self::InvalidMove,
            Self::MarshalFailed,
            Self::AllocationFailed,
        ]
        .into_iter()
        .find(|s| *s as i32 == code)
    }
}

impl From<&CellError> for MazerStatus {
    fn from(e: &CellError) -> Self {
        match e {
            CellError::Allocation { .. } => MazerStatus::AllocationFailed,
            CellError::NullText { .. }
            | CellError::InvalidUtf8 { .. }
            | CellError::CoordinateOverflow { .. } => MazerStatus::MarshalFailed,
        }
    }
}

impl From<&MarshalError> for MazerStatus {
    fn from(e: &MarshalError) -> Self {
        match e {
            MarshalError::Element { source, .. } => MazerStatus::from(source),
            MarshalError::Allocation { .. } => MazerStatus::AllocationFailed,
        }
    }
}

impl From<&MoveRejected> for MazerStatus {
    fn from(_e: &MoveRejected) -> Self {
        MazerStatus::InvalidMove
    }
}
