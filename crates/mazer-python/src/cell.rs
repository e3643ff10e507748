//! PyFFICell: an owned cell snapshot.

use mazer_core::{Cell, Cells};
use mazer_ffi::MarshalError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::marshal_error;

/// One maze cell, copied out of the engine.
///
/// Attributes follow the engine's record layout. Instances are independent
/// of the maze they came from and stay valid after it is destroyed.
#[pyclass(name = "FFICell", frozen, skip_from_py_object)]
#[derive(Clone)]
pub(crate) struct FfiCell {
    /// Column.
    #[pyo3(get)]
    x: i64,
    /// Row.
    #[pyo3(get)]
    y: i64,
    /// Maze family, e.g. `"Orthogonal"`.
    #[pyo3(get)]
    maze_type: String,
    /// Directions this cell has an open passage to.
    #[pyo3(get)]
    linked: Vec<String>,
    /// Distance from the start cell.
    #[pyo3(get)]
    distance: i32,
    /// Start cell.
    #[pyo3(get)]
    is_start: bool,
    /// Goal cell.
    #[pyo3(get)]
    is_goal: bool,
    /// Current player position.
    #[pyo3(get)]
    is_active: bool,
    /// Reached by the generator.
    #[pyo3(get)]
    is_visited: bool,
    /// Reached by the player.
    #[pyo3(get)]
    has_been_visited: bool,
    /// On the start-to-goal path.
    #[pyo3(get)]
    on_solution_path: bool,
    /// Orientation label, e.g. `"Normal"`.
    #[pyo3(get)]
    orientation: String,
    /// Square cell (orthogonal grids, upsilon squares).
    #[pyo3(get)]
    is_square: bool,
}

impl From<Cell> for FfiCell {
    fn from(c: Cell) -> Self {
        Self {
            x: c.x,
            y: c.y,
            maze_type: c.maze_type,
            linked: c.linked,
            distance: c.distance,
            is_start: c.is_start,
            is_goal: c.is_goal,
            is_active: c.is_active,
            is_visited: c.is_visited,
            has_been_visited: c.has_been_visited,
            on_solution_path: c.on_solution_path,
            orientation: c.orientation,
            is_square: c.is_square,
        }
    }
}

#[pymethods]
impl FfiCell {
    /// Whether this cell links toward `direction`.
    fn is_linked(&self, direction: &str) -> bool {
        self.linked.iter().any(|l| l == direction)
    }

    /// Convert to a plain Python dict.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let d = PyDict::new(py);
        d.set_item("x", self.x)?;
        d.set_item("y", self.y)?;
        d.set_item("maze_type", &self.maze_type)?;
        d.set_item("linked", self.linked.clone())?;
        d.set_item("distance", self.distance)?;
        d.set_item("is_start", self.is_start)?;
        d.set_item("is_goal", self.is_goal)?;
        d.set_item("is_active", self.is_active)?;
        d.set_item("is_visited", self.is_visited)?;
        d.set_item("has_been_visited", self.has_been_visited)?;
        d.set_item("on_solution_path", self.on_solution_path)?;
        d.set_item("orientation", &self.orientation)?;
        d.set_item("is_square", self.is_square)?;
        Ok(d)
    }

    fn __repr__(&self) -> String {
        format!(
            "FFICell(x={}, y={}, maze_type='{}', linked={:?}, distance={})",
            self.x, self.y, self.maze_type, self.linked, self.distance
        )
    }
}

/// Turn a bridge snapshot into Python cells.
///
/// `None` (engine produced nothing) passes through; a copy failure raises.
pub(crate) fn into_py_cells(
    snapshot: Result<Option<Cells>, MarshalError>,
) -> PyResult<Option<Vec<FfiCell>>> {
    match snapshot {
        Ok(cells) => Ok(cells.map(|c| c.into_iter().map(FfiCell::from).collect())),
        Err(e) => Err(marshal_error(&e)),
    }
}
