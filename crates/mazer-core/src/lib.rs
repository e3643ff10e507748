//! Core value types for the mazer bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! host-side shapes that cross the native boundary: owned [`Cell`]
//! snapshots, the [`MazeRequest`] serialized into the engine's construction
//! call, and the [`Direction`] tokens forwarded to its move operator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod direction;
pub mod error;
pub mod request;

pub use cell::{Cell, Cells};
pub use direction::{Direction, UnknownDirection};
pub use error::RequestError;
pub use request::{Coordinates, MazeAlgorithm, MazeRequest, MazeRequestBuilder, MazeType};
