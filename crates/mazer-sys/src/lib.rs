//! Raw C contract of the native mazer engine.
//!
//! The engine is an external library reached only through the entry points
//! described here. Nothing in this crate interprets the data; it only fixes
//! the memory layout ([`FfiCell`]) and the call signatures ([`MazerApi`]).
//!
//! [`MazerApi`] is a table of function pointers rather than a bare
//! `extern` block so that the bridge can run against the linked library
//! (feature `native`, see [`MazerApi::linked`]) or any other implementation
//! of the same contract, such as the fake engine used in tests.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ffi::{c_char, c_int, c_void};
use std::marker::{PhantomData, PhantomPinned};

/// Value returned by `mazer_ffi_integration_test` when the boundary is wired
/// correctly.
pub const MAZER_INTEGRATION_OK: c_int = 42;

/// Opaque native grid state. Only ever handled by pointer.
#[repr(C)]
pub struct RawGrid {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Flat native cell record (`FFICell` in `mazer.h`).
///
/// Text fields are NUL-terminated strings owned by the buffer returned from
/// `mazer_get_cells` / `mazer_get_generation_step_cells`; they are released
/// together with that buffer by `mazer_free_cells`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FfiCell {
    /// Column (`size_t`).
    pub x: usize,
    /// Row (`size_t`).
    pub y: usize,
    /// Maze family label.
    pub maze_type: *const c_char,
    /// Array of `linked_len` direction labels.
    pub linked: *const *const c_char,
    /// Number of entries in `linked`.
    pub linked_len: usize,
    /// Distance from the start cell.
    pub distance: i32,
    /// Start cell flag.
    pub is_start: bool,
    /// Goal cell flag.
    pub is_goal: bool,
    /// Player position flag.
    pub is_active: bool,
    /// Generator visited flag.
    pub is_visited: bool,
    /// Player has been here.
    pub has_been_visited: bool,
    /// On the solution path.
    pub on_solution_path: bool,
    /// Orientation label.
    pub orientation: *const c_char,
    /// Square cell flag.
    pub is_square: bool,
}

/// `int mazer_ffi_integration_test(void)`
pub type IntegrationTestFn = unsafe extern "C" fn() -> c_int;
/// `Grid *mazer_generate_maze(const char *request_json)`; null on failure.
pub type GenerateMazeFn = unsafe extern "C" fn(*const c_char) -> *mut RawGrid;
/// `void mazer_destroy(Grid *grid)`
pub type DestroyFn = unsafe extern "C" fn(*mut RawGrid);
/// `FFICell *mazer_get_cells(Grid *grid, size_t *length)`; null on failure.
pub type GetCellsFn = unsafe extern "C" fn(*mut RawGrid, *mut usize) -> *mut FfiCell;
/// `void mazer_free_cells(FFICell *cells, size_t length)`
pub type FreeCellsFn = unsafe extern "C" fn(*mut FfiCell, usize);
/// `size_t mazer_get_generation_steps_count(Grid *grid)`
pub type StepsCountFn = unsafe extern "C" fn(*mut RawGrid) -> usize;
/// `FFICell *mazer_get_generation_step_cells(Grid *grid, size_t step, size_t *length)`
pub type StepCellsFn = unsafe extern "C" fn(*mut RawGrid, usize, *mut usize) -> *mut FfiCell;
/// `void *mazer_make_move(void *grid, const char *direction)`; null on rejection.
pub type MakeMoveFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;

/// One implementation of the native engine contract.
#[derive(Clone, Copy, Debug)]
pub struct MazerApi {
    /// Boundary self-test.
    pub integration_test: IntegrationTestFn,
    /// Grid construction from a JSON request.
    pub generate_maze: GenerateMazeFn,
    /// Grid destruction.
    pub destroy: DestroyFn,
    /// Current cell snapshot.
    pub get_cells: GetCellsFn,
    /// Release a cell buffer returned by either snapshot call.
    pub free_cells: FreeCellsFn,
    /// Number of recorded generation steps.
    pub get_generation_steps_count: StepsCountFn,
    /// Cell snapshot at a generation step.
    pub get_generation_step_cells: StepCellsFn,
    /// Player move.
    pub make_move: MakeMoveFn,
}

#[cfg(feature = "native")]
mod linked {
    use super::{FfiCell, RawGrid};
    use std::ffi::{c_char, c_int, c_void};

    extern "C" {
        pub(super) fn mazer_ffi_integration_test() -> c_int;
        pub(super) fn mazer_generate_maze(request_json: *const c_char) -> *mut RawGrid;
        pub(super) fn mazer_destroy(grid: *mut RawGrid);
        pub(super) fn mazer_get_cells(grid: *mut RawGrid, length: *mut usize) -> *mut FfiCell;
        pub(super) fn mazer_free_cells(cells: *mut FfiCell, length: usize);
        pub(super) fn mazer_get_generation_steps_count(grid: *mut RawGrid) -> usize;
        pub(super) fn mazer_get_generation_step_cells(
            grid: *mut RawGrid,
            step_index: usize,
            length: *mut usize,
        ) -> *mut FfiCell;
        pub(super) fn mazer_make_move(grid: *mut c_void, direction: *const c_char)
            -> *mut c_void;
    }
}

#[cfg(feature = "native")]
impl MazerApi {
    /// The engine linked into this binary (`libmazer`).
    pub fn linked() -> Self {
        Self {
            integration_test: linked::mazer_ffi_integration_test,
            generate_maze: linked::mazer_generate_maze,
            destroy: linked::mazer_destroy,
            get_cells: linked::mazer_get_cells,
            free_cells: linked::mazer_free_cells,
            get_generation_steps_count: linked::mazer_get_generation_steps_count,
            get_generation_step_cells: linked::mazer_get_generation_step_cells,
            make_move: linked::mazer_make_move,
        }
    }
}
