//! PyMaze: an owned maze handle.
//!
//! All bridge calls release the GIL via `py.detach()`, so other Python
//! threads keep running while the engine generates or copies cells.

use mazer_core::Direction;
use mazer_ffi::{Bridge, GridHandle};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::cell::{into_py_cells, FfiCell};
use crate::engine::bridge;
use crate::error::check_status;

/// A generated maze.
///
/// Destroyed by `destroy()`, at the end of a `with` block, or when
/// collected, whichever comes first.
#[pyclass]
pub(crate) struct Maze {
    handle: Option<GridHandle>,
}

#[pymethods]
impl Maze {
    /// Generate a maze from a JSON request (see `build_request`).
    ///
    /// Raises:
    ///     ValueError: if the engine rejects the request.
    #[new]
    fn new(py: Python<'_>, request_json: &str) -> PyResult<Self> {
        let bridge = bridge()?;
        let handle = py.detach(|| bridge.create_grid(request_json));
        if handle.is_null() {
            return Err(PyValueError::new_err("the engine rejected the maze request"));
        }
        Ok(Maze {
            handle: Some(handle),
        })
    }

    /// The raw integer handle, for use with the module-level functions.
    #[getter]
    fn handle(&self) -> PyResult<u64> {
        Ok(self.require_handle()?.into_raw())
    }

    /// Current cells, or `None` if the engine produced no snapshot.
    fn cells(&self, py: Python<'_>) -> PyResult<Option<Vec<FfiCell>>> {
        let h = self.require_handle()?;
        let bridge = bridge()?;
        into_py_cells(py.detach(|| bridge.cells(h)))
    }

    /// Number of recorded generation steps.
    #[getter]
    fn step_count(&self, py: Python<'_>) -> PyResult<i64> {
        let h = self.require_handle()?;
        let bridge = bridge()?;
        Ok(py.detach(|| bridge.step_count(h)))
    }

    /// Cells at generation step `index`, or `None` when out of range.
    fn step_cells(&self, py: Python<'_>, index: i64) -> PyResult<Option<Vec<FfiCell>>> {
        let h = self.require_handle()?;
        let bridge = bridge()?;
        into_py_cells(py.detach(|| bridge.step_cells(h, index)))
    }

    /// Forward a direction token. Returns whether the engine accepted it;
    /// a rejected move leaves the maze unchanged.
    fn make_move(&self, py: Python<'_>, direction: &str) -> PyResult<bool> {
        let h = self.require_handle()?;
        let bridge = bridge()?;
        Ok(!py.detach(|| bridge.make_move(h, direction)).is_null())
    }

    /// Move toward `direction`, trying the maze type's alternatives for
    /// diagonal moves. Returns the direction that was taken.
    ///
    /// Raises:
    ///     ValueError: unknown direction, or no alternative was accepted.
    ///     RuntimeError: the maze's cells could not be read.
    fn move_toward(&self, py: Python<'_>, direction: &str) -> PyResult<String> {
        let h = self.require_handle()?;
        let bridge = bridge()?;
        py.detach(|| step_toward(bridge, h, direction))
    }

    /// Explicitly destroy the maze.
    fn destroy(&mut self, py: Python<'_>) {
        self.do_destroy_with_gil(py);
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc_val=None, _exc_tb=None))]
    fn __exit__(
        &mut self,
        py: Python<'_>,
        _exc_type: Option<&Bound<'_, PyAny>>,
        _exc_val: Option<&Bound<'_, PyAny>>,
        _exc_tb: Option<&Bound<'_, PyAny>>,
    ) {
        self.do_destroy_with_gil(py);
    }

    fn __repr__(&self) -> String {
        match self.handle {
            Some(h) => format!("Maze(handle={h})"),
            None => "Maze(destroyed)".to_owned(),
        }
    }
}

impl Maze {
    fn require_handle(&self) -> PyResult<GridHandle> {
        self.handle
            .ok_or_else(|| PyRuntimeError::new_err("Maze already destroyed"))
    }

    fn do_destroy_with_gil(&mut self, py: Python<'_>) {
        if let (Some(h), Ok(bridge)) = (self.handle.take(), bridge()) {
            py.detach(|| bridge.destroy_grid(h));
        }
    }
}

fn step_toward(bridge: &Bridge, handle: GridHandle, direction: &str) -> PyResult<String> {
    let direction: Direction = direction
        .parse()
        .map_err(|e: mazer_core::UnknownDirection| PyValueError::new_err(e.to_string()))?;
    match bridge.move_toward(handle, direction) {
        Ok(taken) => Ok(taken.token().to_owned()),
        Err(status) => {
            check_status(status)?;
            Err(PyRuntimeError::new_err("move failed"))
        }
    }
}

impl Drop for Maze {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            // PyO3 drops #[pyclass] values with the GIL held.
            Python::attach(|py| {
                if let Ok(bridge) = bridge() {
                    py.detach(|| bridge.destroy_grid(h));
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazer_test_utils::fake;

    const REQUEST: &str = r#"{"maze_type":"Orthogonal","width":3,"height":3}"#;

    #[test]
    fn step_toward_reports_taken_direction() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        assert_eq!(step_toward(&bridge, h, "Right").ok().as_deref(), Some("Right"));
        assert!(step_toward(&bridge, h, "sideways").is_err());
        assert!(step_toward(&bridge, h, "Up").is_err());
    }

    #[test]
    fn step_toward_raises_when_cells_are_unreadable() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        fake::inject_invalid_utf8(0);
        assert!(step_toward(&bridge, h, "Right").is_err());
        let cells = bridge.cells(h).unwrap().unwrap();
        assert_eq!(cells.active().map(|c| (c.x, c.y)), Some((0, 0)));
    }
}
