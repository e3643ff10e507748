//! Request building with the same checks the engine applies.

use mazer_core::{MazeAlgorithm, MazeRequest, MazeType};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn maze_type(name: &str) -> PyResult<MazeType> {
    MazeType::parse_loose(name)
        .ok_or_else(|| PyValueError::new_err(format!("unknown maze type '{name}'")))
}

/// Build and validate a maze request, returning the JSON the engine expects.
///
/// Raises:
///     ValueError: unknown maze type or algorithm, or a request the engine
///         would reject (bad dimensions, capture_steps on a large maze,
///         unsupported algorithm, bad or equal start/goal).
#[pyfunction]
#[pyo3(signature = (maze_type, width, height, algorithm=None, capture_steps=false, start=None, goal=None))]
pub(crate) fn build_request(
    maze_type: &str,
    width: i32,
    height: i32,
    algorithm: Option<&str>,
    capture_steps: bool,
    start: Option<(i32, i32)>,
    goal: Option<(i32, i32)>,
) -> PyResult<String> {
    let mut builder = MazeRequest::builder(self::maze_type(maze_type)?, width, height)
        .capture_steps(capture_steps);
    if let Some(name) = algorithm {
        let algorithm = MazeAlgorithm::from_name(name)
            .ok_or_else(|| PyValueError::new_err(format!("unknown algorithm '{name}'")))?;
        builder = builder.algorithm(algorithm);
    }
    if let Some((x, y)) = start {
        builder = builder.start(x, y);
    }
    if let Some((x, y)) = goal {
        builder = builder.goal(x, y);
    }
    let request = builder
        .build()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    request
        .to_json()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Names of the algorithms the engine supports for `maze_type`.
#[pyfunction]
pub(crate) fn algorithms_for(maze_type: &str) -> PyResult<Vec<&'static str>> {
    Ok(MazeAlgorithm::available_for(self::maze_type(maze_type)?)
        .into_iter()
        .map(MazeAlgorithm::name)
        .collect())
}
