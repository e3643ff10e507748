//! Deep copy of one native cell record into an owned [`Cell`].
//!
//! Every text field is copied out of engine memory, so the result stays
//! valid after the buffer it came from is freed. Coordinates widen from
//! `size_t` to `i64`; flags and distance copy bit-for-bit.

use std::ffi::{c_char, CStr};

use mazer_core::Cell;
use mazer_sys::FfiCell;

use crate::error::CellError;

/// Copy one native record into an owned [`Cell`].
///
/// # Safety
///
/// Every non-null text pointer in `raw` must point to a NUL-terminated
/// string, and a non-null `linked` must point to `linked_len` readable
/// pointers; all of it must stay valid for the duration of the call.
#[allow(unsafe_code)]
pub unsafe fn decode_cell(raw: &FfiCell) -> Result<Cell, CellError> {
    Ok(Cell {
        x: widen(raw.x)?,
        y: widen(raw.y)?,
        // SAFETY: forwarded from this function's contract.
        maze_type: unsafe { copy_text(raw.maze_type, "maze_type")? },
        // SAFETY: forwarded from this function's contract.
        linked: unsafe { copy_text_array(raw.linked, raw.linked_len, "linked")? },
        distance: raw.distance,
        is_start: raw.is_start,
        is_goal: raw.is_goal,
        is_active: raw.is_active,
        is_visited: raw.is_visited,
        has_been_visited: raw.has_been_visited,
        on_solution_path: raw.on_solution_path,
        // SAFETY: forwarded from this function's contract.
        orientation: unsafe { copy_text(raw.orientation, "orientation")? },
        is_square: raw.is_square,
    })
}

fn widen(value: usize) -> Result<i64, CellError> {
    i64::try_from(value).map_err(|_| CellError::CoordinateOverflow { value })
}

#[allow(unsafe_code)]
unsafe fn copy_text(ptr: *const c_char, field: &'static str) -> Result<String, CellError> {
    if ptr.is_null() {
        return Err(CellError::NullText { field });
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str()
        .map(str::to_owned)
        .map_err(|_| CellError::InvalidUtf8 { field })
}

#[allow(unsafe_code)]
unsafe fn copy_text_array(
    ptr: *const *const c_char,
    len: usize,
    field: &'static str,
) -> Result<Vec<String>, CellError> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(CellError::NullText { field });
    }
    // SAFETY: non-null with `len` readable entries per the caller's contract.
    let entries = unsafe { std::slice::from_raw_parts(ptr, len) };
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| CellError::Allocation { len })?;
    for &entry in entries {
        // SAFETY: each entry is a text pointer under the same contract.
        out.push(unsafe { copy_text(entry, field)? });
    }
    Ok(out)
}
