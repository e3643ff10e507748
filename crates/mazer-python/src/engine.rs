//! The process-wide bridge behind the module.

use mazer_ffi::Bridge;
use pyo3::PyResult;

/// The bridge over the linked engine, created on first use.
#[cfg(feature = "native")]
pub(crate) fn bridge() -> PyResult<&'static Bridge> {
    use std::sync::OnceLock;

    static BRIDGE: OnceLock<Bridge> = OnceLock::new();
    Ok(BRIDGE.get_or_init(Bridge::linked))
}

/// Without the native engine there is nothing to bridge to.
#[cfg(not(feature = "native"))]
pub(crate) fn bridge() -> PyResult<&'static Bridge> {
    Err(pyo3::exceptions::PyRuntimeError::new_err(
        "built without the native engine",
    ))
}
