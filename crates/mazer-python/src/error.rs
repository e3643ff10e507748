//! MazerStatus -> Python exception mapping with recovery hints.

use mazer_ffi::{MarshalError, MazerStatus};
use pyo3::exceptions::{PyMemoryError, PyRuntimeError, PyValueError};
use pyo3::{PyErr, PyResult};

/// Check a bridge status. Returns `Ok(())` on success, raises a typed
/// Python exception with a recovery hint on error.
pub(crate) fn check_status(status: MazerStatus) -> PyResult<()> {
    match status {
        MazerStatus::Ok => Ok(()),
        _ => Err(code_error(status as i32, None)),
    }
}

/// Exception for a snapshot that could not be copied out of the engine.
pub(crate) fn marshal_error(err: &MarshalError) -> PyErr {
    code_error(MazerStatus::from(err) as i32, Some(&err.to_string()))
}

fn code_error(code: i32, detail: Option<&str>) -> PyErr {
    let (msg, hint) = error_detail(code);
    let full = match detail {
        Some(detail) => format!("mazer error {code}: {msg} ({detail})\n  Hint: {hint}"),
        None => format!("mazer error {code}: {msg}\n  Hint: {hint}"),
    };
    match MazerStatus::from_code(code) {
        // Caller's fault -> ValueError
        Some(MazerStatus::ConstructionFailed | MazerStatus::InvalidMove) => {
            PyValueError::new_err(full)
        }
        Some(MazerStatus::AllocationFailed) => PyMemoryError::new_err(full),
        _ => PyRuntimeError::new_err(full),
    }
}

/// Returns `(message, recovery_hint)` for each status code.
fn error_detail(code: i32) -> (&'static str, &'static str) {
    match MazerStatus::from_code(code) {
        Some(MazerStatus::Ok) => ("ok", "No action needed."),
        Some(MazerStatus::InvalidHandle) => (
            "invalid handle (already destroyed?)",
            "The maze has been destroyed. Don't call destroy() and then keep \
             using the object. If using a context manager, access is only \
             valid inside the `with` block.",
        ),
        Some(MazerStatus::ConstructionFailed) => (
            "the engine rejected the maze request",
            "Check the request with build_request() first: dimensions must be \
             positive, capture_steps needs width and height <= 100, and the \
             algorithm must support the maze type (see algorithms_for()).",
        ),
        Some(MazerStatus::InvalidMove) => (
            "the engine rejected the move",
            "The active cell has no link in that direction. Check the active \
             cell's `linked` list before moving.",
        ),
        Some(MazerStatus::MarshalFailed) => (
            "a cell record from the engine could not be copied",
            "The engine returned a cell with a null or non-UTF-8 text field, \
             or a coordinate that does not fit in 64 bits. This points at a \
             bug or version mismatch in the native library.",
        ),
        Some(MazerStatus::AllocationFailed) => (
            "out of memory while copying cells",
            "Use a smaller maze, or release references to earlier snapshots.",
        ),
        None => (
            "unknown mazer error",
            "An unrecognized status code was returned from the bridge. This \
             may indicate a version mismatch between the Python bindings and \
             the native library.",
        ),
    }
}
