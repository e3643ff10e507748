//! Test utilities for mazer bridge development.
//!
//! Provides a [`fake`] native engine implementing the C contract in Rust,
//! with an allocation ledger and grid poisoning so leaks and handle misuse
//! are detected deterministically, plus [`fixtures`] for building native
//! cell records by hand.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fake;
pub mod fixtures;

pub use fake::{ledger, Ledger, Misuse};
pub use fixtures::{cell, NativeCell};
