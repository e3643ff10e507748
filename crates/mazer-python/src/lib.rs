//! Python bindings for the mazer bridge.
//!
//! The native extension is named `_mazer`. It exposes the bridge twice: as
//! flat functions over integer handles (the shape of the original host
//! interface) and as a `Maze` class that owns its handle and destroys it
//! when closed or collected.
//!
//! Every bridge call releases the GIL.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use pyo3::prelude::*;

mod cell;
mod engine;
mod error;
mod functions;
mod maze;
mod request;

/// The native `_mazer` extension module.
#[pymodule]
fn _mazer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<cell::FfiCell>()?;
    m.add_class::<maze::Maze>()?;

    // Handle-level functions
    m.add_function(wrap_pyfunction!(functions::mazer_ffi_integration_test, m)?)?;
    m.add_function(wrap_pyfunction!(functions::generate_maze, m)?)?;
    m.add_function(wrap_pyfunction!(functions::destroy_maze, m)?)?;
    m.add_function(wrap_pyfunction!(functions::get_cells, m)?)?;
    m.add_function(wrap_pyfunction!(functions::get_generation_steps_count, m)?)?;
    m.add_function(wrap_pyfunction!(functions::get_generation_step_cells, m)?)?;
    m.add_function(wrap_pyfunction!(functions::make_move, m)?)?;

    // Requests
    m.add_function(wrap_pyfunction!(request::build_request, m)?)?;
    m.add_function(wrap_pyfunction!(request::algorithms_for, m)?)?;

    m.add("INTEGRATION_OK", mazer_ffi::MAZER_INTEGRATION_OK)?;
    Ok(())
}
