//! Flat handle-level functions, one per bridge operation.
//!
//! Handles are plain integers; `0` is the null handle. Engine failures come
//! back as sentinels (`0`, `None`) exactly as the bridge reports them. A
//! snapshot that cannot be copied raises, and so does destroying a handle
//! that is not live.

use mazer_ffi::{Bridge, GridHandle};
use pyo3::prelude::*;

use crate::cell::{into_py_cells, FfiCell};
use crate::engine::bridge;
use crate::error::check_status;

/// Run the engine's boundary self-test. Returns 42 when wired correctly.
#[pyfunction]
pub(crate) fn mazer_ffi_integration_test(py: Python<'_>) -> PyResult<i32> {
    let bridge = bridge()?;
    Ok(py.detach(|| bridge.integration_test()))
}

/// Build a maze from a JSON request. Returns its handle, or 0 if the engine
/// rejected the request.
#[pyfunction]
pub(crate) fn generate_maze(py: Python<'_>, request_json: &str) -> PyResult<u64> {
    let bridge = bridge()?;
    Ok(py.detach(|| bridge.create_grid(request_json)).into_raw())
}

/// Destroy a maze.
///
/// Raises:
///     RuntimeError: if the handle is 0, unknown, or already destroyed.
#[pyfunction]
pub(crate) fn destroy_maze(py: Python<'_>, handle: u64) -> PyResult<()> {
    let bridge = bridge()?;
    py.detach(|| destroy(bridge, GridHandle::from_raw(handle)))
}

fn destroy(bridge: &Bridge, handle: GridHandle) -> PyResult<()> {
    check_status(bridge.destroy_grid(handle))
}

/// Current cells of a maze, or `None`.
#[pyfunction]
pub(crate) fn get_cells(py: Python<'_>, handle: u64) -> PyResult<Option<Vec<FfiCell>>> {
    let bridge = bridge()?;
    into_py_cells(py.detach(|| bridge.cells(GridHandle::from_raw(handle))))
}

/// Number of recorded generation steps (0 for an unknown handle).
#[pyfunction]
pub(crate) fn get_generation_steps_count(py: Python<'_>, handle: u64) -> PyResult<i64> {
    let bridge = bridge()?;
    Ok(py.detach(|| bridge.step_count(GridHandle::from_raw(handle))))
}

/// Cells at generation step `step_index`, or `None` when out of range.
#[pyfunction]
pub(crate) fn get_generation_step_cells(
    py: Python<'_>,
    handle: u64,
    step_index: i64,
) -> PyResult<Option<Vec<FfiCell>>> {
    let bridge = bridge()?;
    into_py_cells(py.detach(|| bridge.step_cells(GridHandle::from_raw(handle), step_index)))
}

/// Move the player. Returns the same handle on success, 0 if rejected; the
/// maze is unchanged and still valid after a rejection.
#[pyfunction]
pub(crate) fn make_move(py: Python<'_>, handle: u64, direction: &str) -> PyResult<u64> {
    let bridge = bridge()?;
    Ok(py
        .detach(|| bridge.make_move(GridHandle::from_raw(handle), direction))
        .into_raw())
}
