//! Native cell arrays to host [`Cells`].
//!
//! A buffer returned by the engine is wrapped in [`NativeCells`] the moment
//! it arrives. The guard releases it with the engine's `free_cells` on every
//! exit path: after a full copy, after an element fails, or on unwind.

use std::ptr::NonNull;

use mazer_core::Cells;
use mazer_sys::{FfiCell, FreeCellsFn};

use crate::codec::decode_cell;
use crate::error::MarshalError;

/// An engine-owned cell buffer, freed exactly once on drop.
pub struct NativeCells {
    ptr: NonNull<FfiCell>,
    len: usize,
    free: FreeCellsFn,
}

impl NativeCells {
    /// Take ownership of a buffer returned by the engine. `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be a buffer of `len` records returned by the engine whose
    /// `free_cells` is `free`, not yet released, and not adopted elsewhere.
    #[allow(unsafe_code)]
    pub unsafe fn adopt(ptr: *mut FfiCell, len: usize, free: FreeCellsFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, len, free })
    }

    /// Number of records in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The records, borrowed from engine memory.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[FfiCell] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: `adopt` guarantees `len` records at `ptr`, alive until drop.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Deep-copy every record. The buffer is released when `self` drops.
    #[allow(unsafe_code)]
    pub fn to_cells(&self) -> Result<Cells, MarshalError> {
        let mut out = Vec::new();
        out.try_reserve_exact(self.len)
            .map_err(|_| MarshalError::Allocation { len: self.len })?;
        for (index, raw) in self.as_slice().iter().enumerate() {
            // SAFETY: the engine's text pointers live as long as the buffer.
            let cell = unsafe { decode_cell(raw) }
                .map_err(|source| MarshalError::Element { index, source })?;
            out.push(cell);
        }
        Ok(Cells::from(out))
    }
}

impl Drop for NativeCells {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: the buffer came from the engine paired with `free` and is
        // released only here.
        unsafe { (self.free)(self.ptr.as_ptr(), self.len) };
    }
}

impl std::fmt::Debug for NativeCells {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeCells")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Copy a native cell array into owned [`Cells`] and release it.
///
/// A null `ptr` means the engine reported failure: `Ok(None)` and nothing
/// is freed. Otherwise the buffer is freed exactly once, whether the copy
/// succeeds or not.
///
/// # Safety
///
/// Same contract as [`NativeCells::adopt`].
#[allow(unsafe_code)]
pub unsafe fn marshal_cells(
    ptr: *mut FfiCell,
    len: usize,
    free: FreeCellsFn,
) -> Result<Option<Cells>, MarshalError> {
    // SAFETY: forwarded from this function's contract.
    let Some(buffer) = (unsafe { NativeCells::adopt(ptr, len, free) }) else {
        return Ok(None);
    };
    let cells = buffer.to_cells();
    if let Err(e) = &cells {
        log::warn!("discarding {len} native cells: {e}");
    }
    cells.map(Some)
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::error::CellError;
    use mazer_sys::{MazerApi, RawGrid};
    use mazer_test_utils::fake::{self, Misuse};
    use pretty_assertions::assert_eq;
    use std::ffi::CString;

    fn grid(api: &MazerApi, width: usize, height: usize) -> *mut RawGrid {
        let request = CString::new(format!(
            r#"{{"maze_type":"Orthogonal","width":{width},"height":{height}}}"#
        ))
        .unwrap();
        let raw = unsafe { (api.generate_maze)(request.as_ptr()) };
        assert!(!raw.is_null());
        raw
    }

    fn snapshot(api: &MazerApi, raw: *mut RawGrid) -> Result<Option<Cells>, MarshalError> {
        let mut len = 0;
        let ptr = unsafe { (api.get_cells)(raw, &mut len) };
        unsafe { marshal_cells(ptr, len, api.free_cells) }
    }

    #[test]
    fn copies_and_frees_once() {
        fake::reset_ledger();
        let api = fake::api();
        let raw = grid(&api, 3, 2);

        let cells = snapshot(&api, raw).unwrap().unwrap();
        assert_eq!(cells.len(), 6);
        let ledger = fake::ledger();
        assert_eq!(ledger.buffers_allocated, 1);
        assert_eq!(ledger.buffers_freed, 1);

        unsafe { (api.destroy)(raw) };
        assert!(fake::ledger().is_clean());
    }

    #[test]
    fn null_buffer_is_not_freed() {
        fake::reset_ledger();
        let api = fake::api();
        let result = unsafe { marshal_cells(std::ptr::null_mut(), 0, api.free_cells) };
        assert_eq!(result, Ok(None));
        assert!(fake::ledger().misuse.is_empty());
    }

    #[test]
    fn empty_buffer_is_some_and_freed() {
        fake::reset_ledger();
        let api = fake::api();
        let raw = grid(&api, 2, 2);

        fake::inject_empty_snapshot();
        let mut len = usize::MAX;
        let ptr = unsafe { (api.get_cells)(raw, &mut len) };
        assert!(!ptr.is_null());
        assert_eq!(len, 0);
        let result = unsafe { marshal_cells(ptr, len, api.free_cells) };
        assert_eq!(result, Ok(Some(Cells::default())));

        let ledger = fake::ledger();
        assert_eq!(ledger.buffers_allocated, 1);
        assert_eq!(ledger.buffers_freed, 1);
        unsafe { (api.destroy)(raw) };
        let ledger = fake::ledger();
        assert!(ledger.is_clean(), "{ledger:?}");
    }

    #[test]
    fn failing_element_still_frees_buffer() {
        fake::reset_ledger();
        let api = fake::api();
        let raw = grid(&api, 2, 2);

        fake::inject_invalid_utf8(2);
        assert_eq!(
            snapshot(&api, raw),
            Err(MarshalError::Element {
                index: 2,
                source: CellError::InvalidUtf8 {
                    field: "orientation"
                },
            })
        );
        assert_eq!(fake::ledger().outstanding_buffers(), 0);

        fake::inject_null_text(0);
        assert!(matches!(
            snapshot(&api, raw),
            Err(MarshalError::Element { index: 0, .. })
        ));

        unsafe { (api.destroy)(raw) };
        let ledger = fake::ledger();
        assert!(ledger.is_clean(), "{ledger:?}");
        assert!(!ledger.misuse.contains(&Misuse::DoubleFree));
    }

    #[test]
    fn guard_reports_length() {
        fake::reset_ledger();
        let api = fake::api();
        let raw = grid(&api, 4, 1);
        let mut len = 0;
        let ptr = unsafe { (api.get_cells)(raw, &mut len) };
        let buffer = unsafe { NativeCells::adopt(ptr, len, api.free_cells) }.unwrap();
        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.as_slice()[3].x, 3);
        drop(buffer);
        unsafe { (api.destroy)(raw) };
        assert!(fake::ledger().is_clean());
    }
}
