//! Owned native grid.

use std::ffi::{c_void, CString};
use std::ptr::NonNull;

use mazer_core::{Cells, Direction, MazeRequest, MazeType};
use mazer_sys::{MazerApi, RawGrid};

use crate::error::{MarshalError, MoveRejected};
use crate::marshal::marshal_cells;

/// One engine grid. Destroyed exactly once, on drop.
///
/// `Grid` is `Send` but not `Sync`: the engine is not known to tolerate
/// concurrent calls on the same grid, so shared use goes through a lock
/// (see [`Bridge`](crate::Bridge)).
pub struct Grid {
    raw: NonNull<RawGrid>,
    api: MazerApi,
    maze_type: Option<MazeType>,
}

// SAFETY: the grid pointer is only used through `&self`/`&mut self`, and
// without `Sync` no two threads can call into the same grid at once.
#[allow(unsafe_code)]
unsafe impl Send for Grid {}

impl Grid {
    /// Ask the engine for a new grid from a JSON request.
    ///
    /// `None` when the engine rejects the request. A request containing an
    /// interior NUL never reaches the engine.
    #[allow(unsafe_code)]
    pub fn create(api: MazerApi, request_json: &str) -> Option<Grid> {
        let Ok(request) = CString::new(request_json) else {
            log::warn!("maze request contains an interior NUL");
            return None;
        };
        // SAFETY: `request` is NUL-terminated and outlives the call.
        let raw = unsafe { (api.generate_maze)(request.as_ptr()) };
        match NonNull::new(raw) {
            Some(raw) => Some(Grid {
                raw,
                api,
                maze_type: None,
            }),
            None => {
                log::debug!("engine rejected maze request");
                None
            }
        }
    }

    /// Serialize `request` and ask the engine for a grid.
    ///
    /// The request is not validated here; see [`MazeRequest::validate`].
    pub fn generate(api: MazerApi, request: &MazeRequest) -> Option<Grid> {
        match request.to_json() {
            Ok(json) => Self::create(api, &json).map(|mut grid| {
                grid.maze_type = Some(request.maze_type);
                grid
            }),
            Err(e) => {
                log::warn!("could not encode maze request: {e}");
                None
            }
        }
    }

    /// Current cell snapshot. `Ok(None)` if the engine produced none.
    #[allow(unsafe_code)]
    pub fn cells(&self) -> Result<Option<Cells>, MarshalError> {
        let mut len = 0usize;
        // SAFETY: the grid is live; `len` is a valid out-slot.
        let ptr = unsafe { (self.api.get_cells)(self.raw.as_ptr(), &mut len) };
        // SAFETY: buffer fresh from this engine's `get_cells`.
        unsafe { marshal_cells(ptr, len, self.api.free_cells) }
    }

    /// The grid's maze type.
    ///
    /// Known up front for grids built by [`generate`](Self::generate).
    /// Otherwise read from the first snapshot that has a recognizable
    /// type and remembered, so later calls never reach the engine.
    /// `Ok(None)` while the engine reports no such cell.
    pub fn maze_type(&mut self) -> Result<Option<MazeType>, MarshalError> {
        if self.maze_type.is_none() {
            self.maze_type = self.cells()?.and_then(|cells| {
                cells
                    .first()
                    .and_then(|c| MazeType::from_ffi_name(&c.maze_type))
            });
        }
        Ok(self.maze_type)
    }

    /// Number of recorded generation steps.
    #[allow(unsafe_code)]
    pub fn step_count(&self) -> usize {
        // SAFETY: the grid is live.
        unsafe { (self.api.get_generation_steps_count)(self.raw.as_ptr()) }
    }

    /// Cell snapshot at generation step `index`.
    ///
    /// An index at or past [`step_count`](Self::step_count) is answered with
    /// `Ok(None)` without calling the engine.
    #[allow(unsafe_code)]
    pub fn step_cells(&self, index: usize) -> Result<Option<Cells>, MarshalError> {
        let count = self.step_count();
        if index >= count {
            log::debug!("generation step {index} out of range ({count} steps)");
            return Ok(None);
        }
        let mut len = 0usize;
        // SAFETY: the grid is live, `index` is in range, `len` is a valid out-slot.
        let ptr = unsafe {
            (self.api.get_generation_step_cells)(self.raw.as_ptr(), index, &mut len)
        };
        // SAFETY: buffer fresh from this engine's `get_generation_step_cells`.
        unsafe { marshal_cells(ptr, len, self.api.free_cells) }
    }

    /// Forward a move token to the engine.
    ///
    /// On rejection the grid is unchanged. If the engine hands back a
    /// different grid pointer, this `Grid` adopts it; the old pointer is the
    /// engine's to dispose of.
    #[allow(unsafe_code)]
    pub fn make_move(&mut self, direction: &str) -> Result<(), MoveRejected> {
        let rejected = || MoveRejected {
            direction: direction.to_owned(),
        };
        let token = CString::new(direction).map_err(|_| rejected())?;
        // SAFETY: the grid is live; `token` is NUL-terminated and outlives the call.
        let next = unsafe {
            (self.api.make_move)(self.raw.as_ptr().cast::<c_void>(), token.as_ptr())
        };
        let next = NonNull::new(next.cast::<RawGrid>()).ok_or_else(rejected)?;
        if next != self.raw {
            log::debug!("engine relocated grid on move '{direction}'");
            self.raw = next;
        }
        Ok(())
    }

    /// Try `direction`, then its fallbacks for `maze_type`, in order.
    ///
    /// Returns the direction the engine accepted.
    pub fn make_move_with_fallback(
        &mut self,
        direction: Direction,
        maze_type: MazeType,
    ) -> Result<Direction, MoveRejected> {
        for candidate in direction.fallbacks(maze_type) {
            if self.make_move(candidate.token()).is_ok() {
                return Ok(candidate);
            }
        }
        Err(MoveRejected {
            direction: direction.token().to_owned(),
        })
    }

    /// Destroy the grid now.
    pub fn destroy(self) {
        drop(self);
    }

    /// The engine pointer. Valid until `self` is dropped or moved by
    /// [`make_move`](Self::make_move).
    pub fn as_raw(&self) -> *mut RawGrid {
        self.raw.as_ptr()
    }
}

impl Drop for Grid {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: `raw` is live and owned by this value; drop runs once.
        unsafe { (self.api.destroy)(self.raw.as_ptr()) };
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("raw", &self.raw)
            .field("maze_type", &self.maze_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazer_test_utils::fake;
    use pretty_assertions::assert_eq;

    const SMALL: &str = r#"{"maze_type":"Orthogonal","width":3,"height":3,"capture_steps":true}"#;

    #[test]
    fn drop_destroys_once() {
        fake::reset_ledger();
        let grid = Grid::create(fake::api(), SMALL).unwrap();
        assert_eq!(fake::ledger().live_grids(), 1);
        grid.destroy();
        assert!(fake::ledger().is_clean());
    }

    #[test]
    fn rejected_request_creates_nothing() {
        fake::reset_ledger();
        assert!(Grid::create(fake::api(), "not json").is_none());
        assert!(Grid::create(fake::api(), "{\0}").is_none());
        assert_eq!(fake::ledger().grids_created, 0);
    }

    #[test]
    fn generate_from_request() {
        fake::reset_ledger();
        let request = MazeRequest::builder(MazeType::Orthogonal, 4, 2)
            .build()
            .unwrap();
        let grid = Grid::generate(fake::api(), &request).unwrap();
        assert_eq!(grid.cells().unwrap().unwrap().len(), 8);
        assert_eq!(grid.step_count(), 0);
    }

    #[test]
    fn maze_type_is_read_once() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        assert_eq!(grid.maze_type(), Ok(Some(MazeType::Orthogonal)));
        assert_eq!(grid.maze_type(), Ok(Some(MazeType::Orthogonal)));
        assert_eq!(fake::ledger().buffers_allocated, 1);

        let request = MazeRequest::builder(MazeType::Orthogonal, 2, 2)
            .build()
            .unwrap();
        let mut generated = Grid::generate(fake::api(), &request).unwrap();
        assert_eq!(generated.maze_type(), Ok(Some(MazeType::Orthogonal)));
        assert_eq!(fake::ledger().buffers_allocated, 1);
    }

    #[test]
    fn unreadable_maze_type_is_an_error_and_not_remembered() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        fake::inject_invalid_utf8(0);
        assert!(matches!(
            grid.maze_type(),
            Err(MarshalError::Element { index: 0, .. })
        ));
        assert_eq!(grid.maze_type(), Ok(Some(MazeType::Orthogonal)));

        let mut empty = Grid::create(fake::api(), SMALL).unwrap();
        fake::inject_empty_snapshot();
        assert_eq!(empty.maze_type(), Ok(None));
        assert_eq!(empty.maze_type(), Ok(Some(MazeType::Orthogonal)));
        drop((grid, empty));
        let ledger = fake::ledger();
        assert!(ledger.is_clean(), "{ledger:?}");
    }

    #[test]
    fn steps_are_bounds_checked() {
        fake::reset_ledger();
        let grid = Grid::create(fake::api(), SMALL).unwrap();
        let count = grid.step_count();
        assert_eq!(count, 8);
        assert_eq!(grid.step_cells(0).unwrap().unwrap().len(), 9);
        assert_eq!(grid.step_cells(count - 1).unwrap().unwrap().len(), 9);
        assert_eq!(grid.step_cells(count), Ok(None));
        drop(grid);
        assert!(fake::ledger().is_clean());
    }

    #[test]
    fn move_updates_active_cell() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        grid.make_move("Right").unwrap();
        let cells = grid.cells().unwrap().unwrap();
        let active = cells.active().unwrap();
        assert_eq!((active.x, active.y), (1, 0));
        assert!(active.has_been_visited);
    }

    #[test]
    fn rejected_move_leaves_grid_unchanged() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        let before = grid.cells().unwrap();
        let raw = grid.as_raw();
        assert_eq!(
            grid.make_move("Up"),
            Err(MoveRejected {
                direction: "Up".into()
            })
        );
        assert!(grid.make_move("north").is_err());
        assert_eq!(grid.as_raw(), raw);
        assert_eq!(grid.cells().unwrap(), before);
    }

    #[test]
    fn relocated_grid_is_adopted() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        let old = grid.as_raw();
        fake::relocate_next_move();
        grid.make_move("Right").unwrap();
        assert_ne!(grid.as_raw(), old);
        assert!(grid.cells().unwrap().is_some());
        drop(grid);
        let ledger = fake::ledger();
        assert!(ledger.is_clean(), "{ledger:?}");
    }

    #[test]
    fn fallback_tries_alternatives() {
        fake::reset_ledger();
        let mut grid = Grid::create(fake::api(), SMALL).unwrap();
        // The fake only knows orthogonal tokens; Delta falls back to Right.
        assert_eq!(
            grid.make_move_with_fallback(Direction::UpperRight, MazeType::Delta),
            Ok(Direction::Right)
        );
        assert!(grid
            .make_move_with_fallback(Direction::UpperLeft, MazeType::Sigma)
            .is_err());
    }
}
