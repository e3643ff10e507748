//! Bridge between the native mazer engine and host runtimes.
//!
//! The engine owns every grid and every cell buffer it hands out. This crate
//! is the only place those allocations are touched:
//!
//! - [`codec`] deep-copies one native cell record into an owned [`Cell`].
//! - [`marshal`] walks a native cell array and releases it exactly once.
//! - [`Grid`] owns one native grid and destroys it on drop.
//! - [`Bridge`] hands out `u64` [`GridHandle`]s for hosts that cannot hold a
//!   Rust value, backed by a generational handle table so stale handles are
//!   rejected instead of dereferenced.
//!
//! Engine failures surface as sentinels (`None`, [`GridHandle::NULL`], `0`);
//! bridge failures (a cell that cannot be copied) surface as
//! [`MarshalError`].
//!
//! [`Cell`]: mazer_core::Cell

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod bridge;
pub mod codec;
pub mod error;
pub mod grid;
mod handle;
pub mod marshal;
pub mod status;

pub use bridge::{Bridge, GridHandle};
pub use error::{CellError, MarshalError, MoveRejected};
pub use grid::Grid;
pub use status::MazerStatus;

pub use mazer_sys::{FfiCell, MazerApi, MAZER_INTEGRATION_OK};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("recovering poisoned bridge lock");
        PoisonError::into_inner(poisoned)
    })
}
