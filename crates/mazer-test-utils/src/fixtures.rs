//! Hand-built cells, host-side and native-side.
//!
//! - [`cell`]: a plain host [`Cell`] with neutral flags.
//! - [`NativeCell`]: owns the C strings and pointer array behind one
//!   [`FfiCell`], with knobs for null and non-UTF-8 fields.

use std::ffi::{c_char, CString};
use std::ptr;

use mazer_core::Cell;
use mazer_sys::FfiCell;

/// A host cell at `(x, y)` in an orthogonal maze with no links.
pub fn cell(x: i64, y: i64) -> Cell {
    Cell {
        x,
        y,
        maze_type: "Orthogonal".into(),
        linked: Vec::new(),
        distance: 0,
        is_start: false,
        is_goal: false,
        is_active: false,
        is_visited: true,
        has_been_visited: false,
        on_solution_path: false,
        orientation: "Normal".into(),
        is_square: true,
    }
}

fn c_string(bytes: Vec<u8>) -> CString {
    // Fixture text never contains NUL; strip it if a test passes one.
    let bytes: Vec<u8> = bytes.into_iter().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default()
}

/// Backing storage for one native cell record.
///
/// [`raw`](NativeCell::raw) points into this value; keep it alive for as
/// long as the record is read.
pub struct NativeCell {
    x: usize,
    y: usize,
    maze_type: Option<CString>,
    linked: Vec<Option<CString>>,
    linked_ptrs: Vec<*const c_char>,
    null_linked_array: bool,
    linked_len_override: Option<usize>,
    distance: i32,
    flags: [bool; 6],
    orientation: Option<CString>,
    is_square: bool,
}

impl NativeCell {
    /// Native mirror of a host cell. Negative coordinates clamp to zero.
    pub fn from_cell(cell: &Cell) -> Self {
        let mut native = Self {
            x: usize::try_from(cell.x).unwrap_or(0),
            y: usize::try_from(cell.y).unwrap_or(0),
            maze_type: Some(c_string(cell.maze_type.clone().into_bytes())),
            linked: cell
                .linked
                .iter()
                .map(|l| Some(c_string(l.clone().into_bytes())))
                .collect(),
            linked_ptrs: Vec::new(),
            null_linked_array: false,
            linked_len_override: None,
            distance: cell.distance,
            flags: [
                cell.is_start,
                cell.is_goal,
                cell.is_active,
                cell.is_visited,
                cell.has_been_visited,
                cell.on_solution_path,
            ],
            orientation: Some(c_string(cell.orientation.clone().into_bytes())),
            is_square: cell.is_square,
        };
        native.rebuild_ptrs();
        native
    }

    fn rebuild_ptrs(&mut self) {
        self.linked_ptrs = self
            .linked
            .iter()
            .map(|l| l.as_ref().map_or(ptr::null(), |s| s.as_ptr()))
            .collect();
    }

    /// Override the raw `size_t` coordinates.
    pub fn with_raw_coords(mut self, x: usize, y: usize) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Replace `maze_type` with raw bytes, or a null pointer.
    pub fn with_maze_type_bytes(mut self, bytes: Option<Vec<u8>>) -> Self {
        self.maze_type = bytes.map(c_string);
        self
    }

    /// Replace `orientation` with raw bytes, or a null pointer.
    pub fn with_orientation_bytes(mut self, bytes: Option<Vec<u8>>) -> Self {
        self.orientation = bytes.map(c_string);
        self
    }

    /// Make neighbor entry `index` a null pointer.
    pub fn with_null_link(mut self, index: usize) -> Self {
        if let Some(entry) = self.linked.get_mut(index) {
            *entry = None;
        }
        self.rebuild_ptrs();
        self
    }

    /// Report `len` neighbors through a null array pointer.
    pub fn with_null_linked_array(mut self, len: usize) -> Self {
        self.null_linked_array = true;
        self.linked_len_override = Some(len);
        self
    }

    /// The native record. Valid while `self` is alive and unmodified.
    pub fn raw(&self) -> FfiCell {
        let text = |s: &Option<CString>| s.as_ref().map_or(ptr::null(), |s| s.as_ptr());
        let linked = if self.null_linked_array || self.linked_ptrs.is_empty() {
            ptr::null()
        } else {
            self.linked_ptrs.as_ptr()
        };
        FfiCell {
            x: self.x,
            y: self.y,
            maze_type: text(&self.maze_type),
            linked,
            linked_len: self.linked_len_override.unwrap_or(self.linked_ptrs.len()),
            distance: self.distance,
            is_start: self.flags[0],
            is_goal: self.flags[1],
            is_active: self.flags[2],
            is_visited: self.flags[3],
            has_been_visited: self.flags[4],
            on_solution_path: self.flags[5],
            orientation: text(&self.orientation),
            is_square: self.is_square,
        }
    }
}
