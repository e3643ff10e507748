//! Handle-based access to engine grids.
//!
//! Hosts that cannot hold a Rust value (a Python object, a JNI `long`) keep
//! a [`GridHandle`] instead. The handle resolves through a generational
//! table, so a destroyed or never-issued handle is answered with a sentinel
//! and the engine is never called with a dangling pointer.
//!
//! Locking: the table lock is held only to look up, insert or remove an
//! entry. Each grid has its own lock, held for the duration of one engine
//! call. Calls on different grids run in parallel; calls on the same grid
//! are serialized.

use std::fmt;
use std::sync::{Arc, Mutex};

use mazer_core::{Cells, Direction, MazeRequest, MazeType};
use mazer_sys::MazerApi;

use crate::error::MarshalError;
use crate::grid::Grid;
use crate::handle::HandleTable;
use crate::lock;
use crate::status::MazerStatus;

/// Opaque host-side reference to a grid. Zero is never a live handle.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridHandle(u64);

impl GridHandle {
    /// The "no grid" sentinel.
    pub const NULL: GridHandle = GridHandle(0);

    /// Whether this is [`GridHandle::NULL`].
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Rebuild a handle from the integer a host stored.
    pub fn from_raw(raw: u64) -> Self {
        GridHandle(raw)
    }

    /// The integer to hand to a host.
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GridHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

type SharedGrid = Arc<Mutex<Grid>>;

/// Registry of live grids for one engine.
///
/// Dropping the bridge destroys every grid still registered.
pub struct Bridge {
    api: MazerApi,
    grids: Mutex<HandleTable<SharedGrid>>,
}

impl Bridge {
    /// A bridge over any implementation of the engine contract.
    pub fn new(api: MazerApi) -> Self {
        Self {
            api,
            grids: Mutex::new(HandleTable::new()),
        }
    }

    /// A bridge over the linked `libmazer`.
    #[cfg(feature = "native")]
    pub fn linked() -> Self {
        Self::new(MazerApi::linked())
    }

    /// The engine this bridge calls.
    pub fn api(&self) -> MazerApi {
        self.api
    }

    /// Run the engine's boundary self-test. A correctly wired engine
    /// returns [`MAZER_INTEGRATION_OK`](crate::MAZER_INTEGRATION_OK).
    #[allow(unsafe_code)]
    pub fn integration_test(&self) -> i32 {
        // SAFETY: no arguments, no state.
        unsafe { (self.api.integration_test)() }
    }

    /// Build a grid from a JSON request. [`GridHandle::NULL`] if the engine
    /// rejects it.
    pub fn create_grid(&self, request_json: &str) -> GridHandle {
        match Grid::create(self.api, request_json) {
            Some(grid) => self.register(grid),
            None => GridHandle::NULL,
        }
    }

    /// Build a grid from a typed request. The request is validated first;
    /// an invalid one never reaches the engine.
    pub fn create_from_request(&self, request: &MazeRequest) -> GridHandle {
        if let Err(e) = request.validate() {
            log::debug!("refusing invalid maze request: {e}");
            return GridHandle::NULL;
        }
        match Grid::generate(self.api, request) {
            Some(grid) => self.register(grid),
            None => GridHandle::NULL,
        }
    }

    fn register(&self, grid: Grid) -> GridHandle {
        let inserted = lock(&self.grids).insert(Arc::new(Mutex::new(grid)));
        match inserted {
            Some(raw) => {
                let handle = GridHandle(raw);
                log::debug!("created grid {handle}");
                handle
            }
            // The rejected grid was dropped inside `insert`, destroying it.
            None => {
                log::error!("grid handle table exhausted");
                GridHandle::NULL
            }
        }
    }

    /// Destroy a grid. [`MazerStatus::InvalidHandle`] for a null, stale or
    /// unknown handle; the engine is not called in that case.
    ///
    /// A call already running on the grid in another thread finishes first;
    /// the engine grid is destroyed when the last in-flight call returns.
    pub fn destroy_grid(&self, handle: GridHandle) -> MazerStatus {
        let removed = lock(&self.grids).remove(handle.0);
        match removed {
            Some(grid) => {
                drop(grid);
                log::debug!("destroyed grid {handle}");
                MazerStatus::Ok
            }
            None => {
                log::debug!("destroy of unknown grid {handle}");
                MazerStatus::InvalidHandle
            }
        }
    }

    fn grid(&self, handle: GridHandle) -> Option<SharedGrid> {
        lock(&self.grids).get(handle.0).cloned()
    }

    /// Run `f` on the grid behind `handle` under its lock.
    /// `None` if the handle is not live.
    pub fn with_grid<R>(&self, handle: GridHandle, f: impl FnOnce(&mut Grid) -> R) -> Option<R> {
        let grid = self.grid(handle)?;
        let mut guard = lock(&grid);
        Some(f(&mut guard))
    }

    /// Current cell snapshot. `Ok(None)` for an invalid handle or when the
    /// engine produced none.
    pub fn cells(&self, handle: GridHandle) -> Result<Option<Cells>, MarshalError> {
        self.with_grid(handle, |g| g.cells()).unwrap_or(Ok(None))
    }

    /// Number of generation steps. 0 for an invalid handle.
    pub fn step_count(&self, handle: GridHandle) -> i64 {
        self.with_grid(handle, |g| g.step_count())
            .map_or(0, |n| i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Cell snapshot at generation step `index`.
    ///
    /// `Ok(None)` for an invalid handle or an index outside
    /// `0..step_count`; neither reaches the engine.
    pub fn step_cells(&self, handle: GridHandle, index: i64) -> Result<Option<Cells>, MarshalError> {
        let Ok(index) = usize::try_from(index) else {
            log::debug!("negative generation step {index}");
            return Ok(None);
        };
        self.with_grid(handle, |g| g.step_cells(index))
            .unwrap_or(Ok(None))
    }

    /// Forward a move. Returns `handle` itself when the engine accepts it
    /// and [`GridHandle::NULL`] when it does not; either way the old handle
    /// stays valid.
    pub fn make_move(&self, handle: GridHandle, direction: &str) -> GridHandle {
        match self.with_grid(handle, |g| g.make_move(direction)) {
            Some(Ok(())) => handle,
            Some(Err(e)) => {
                log::debug!("grid {handle}: {e}");
                GridHandle::NULL
            }
            None => {
                log::debug!("move on unknown grid {handle}");
                GridHandle::NULL
            }
        }
    }

    /// Move with the per-maze-type fallbacks of [`Direction::fallbacks`].
    /// Returns the direction that was accepted.
    pub fn make_move_with_fallback(
        &self,
        handle: GridHandle,
        direction: Direction,
        maze_type: MazeType,
    ) -> Result<Direction, MazerStatus> {
        match self.with_grid(handle, |g| g.make_move_with_fallback(direction, maze_type)) {
            Some(Ok(accepted)) => Ok(accepted),
            Some(Err(e)) => Err(MazerStatus::from(&e)),
            None => Err(MazerStatus::InvalidHandle),
        }
    }

    /// Move toward `direction` using the fallbacks for the grid's own maze
    /// type (see [`Grid::maze_type`]). Returns the direction that was
    /// accepted.
    ///
    /// [`MazerStatus::MarshalFailed`] or [`MazerStatus::AllocationFailed`]
    /// if the maze type could not be read; no move is attempted then.
    pub fn move_toward(
        &self,
        handle: GridHandle,
        direction: Direction,
    ) -> Result<Direction, MazerStatus> {
        let outcome = self.with_grid(handle, |g| {
            let maze_type = match g.maze_type() {
                Ok(Some(maze_type)) => maze_type,
                Ok(None) => {
                    log::debug!("grid {handle}: maze type unknown, using orthogonal moves");
                    MazeType::Orthogonal
                }
                Err(e) => {
                    log::warn!("grid {handle}: could not read maze type: {e}");
                    return Err(MazerStatus::from(&e));
                }
            };
            g.make_move_with_fallback(direction, maze_type)
                .map_err(|e| MazerStatus::from(&e))
        });
        outcome.unwrap_or(Err(MazerStatus::InvalidHandle))
    }

    /// Number of grids currently registered.
    pub fn live_grids(&self) -> usize {
        lock(&self.grids).len()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let remaining = lock(&self.grids).drain();
        if !remaining.is_empty() {
            log::info!("destroying {} grids left open", remaining.len());
        }
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("live_grids", &self.live_grids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazer_test_utils::fake;
    use pretty_assertions::assert_eq;

    const REQUEST: &str = r#"{"maze_type":"Orthogonal","width":4,"height":4,"capture_steps":true}"#;

    #[test]
    fn null_handle_sentinel() {
        assert!(GridHandle::NULL.is_null());
        assert_eq!(GridHandle::default(), GridHandle::NULL);
        assert_eq!(GridHandle::from_raw(7).into_raw(), 7);
    }

    #[test]
    fn integration_test_answers_42() {
        let bridge = Bridge::new(fake::api());
        assert_eq!(bridge.integration_test(), crate::MAZER_INTEGRATION_OK);
    }

    #[test]
    fn create_and_destroy() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        assert!(!h.is_null());
        assert_eq!(bridge.live_grids(), 1);
        assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
        assert_eq!(bridge.live_grids(), 0);
        assert_eq!(bridge.destroy_grid(h), MazerStatus::InvalidHandle);
        assert!(fake::ledger().is_clean());
    }

    #[test]
    fn invalid_request_is_null() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        assert!(bridge.create_grid("{}").is_null());
        let bad = MazeRequest {
            width: 0,
            ..MazeRequest::builder(MazeType::Orthogonal, 3, 3).build().unwrap()
        };
        assert!(bridge.create_from_request(&bad).is_null());
        assert_eq!(fake::ledger().grids_created, 0);
    }

    #[test]
    fn stale_handle_is_rejected_everywhere() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        bridge.destroy_grid(h);

        assert_eq!(bridge.cells(h), Ok(None));
        assert_eq!(bridge.step_count(h), 0);
        assert_eq!(bridge.step_cells(h, 0), Ok(None));
        assert!(bridge.make_move(h, "Right").is_null());
        assert_eq!(
            bridge.make_move_with_fallback(h, Direction::Right, MazeType::Orthogonal),
            Err(MazerStatus::InvalidHandle)
        );
        assert_eq!(
            bridge.move_toward(h, Direction::Right),
            Err(MazerStatus::InvalidHandle)
        );
        assert!(fake::ledger().misuse.is_empty());
    }

    #[test]
    fn negative_step_index_is_none() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        assert_eq!(bridge.step_count(h), 15);
        assert_eq!(bridge.step_cells(h, -1), Ok(None));
        assert_eq!(bridge.step_cells(h, 15), Ok(None));
        assert!(bridge.step_cells(h, 14).unwrap().is_some());
    }

    #[test]
    fn fallback_reports_accepted_direction() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        assert_eq!(
            bridge.make_move_with_fallback(h, Direction::LowerRight, MazeType::Delta),
            Ok(Direction::Right)
        );
        assert_eq!(
            bridge.make_move_with_fallback(h, Direction::Up, MazeType::Orthogonal),
            Err(MazerStatus::InvalidMove)
        );
    }

    #[test]
    fn move_toward_reads_maze_type_once() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        assert_eq!(bridge.move_toward(h, Direction::Right), Ok(Direction::Right));
        assert_eq!(bridge.move_toward(h, Direction::Down), Ok(Direction::Down));
        assert_eq!(
            bridge.move_toward(h, Direction::UpperLeft),
            Err(MazerStatus::InvalidMove)
        );
        assert_eq!(fake::ledger().buffers_allocated, 1);
    }

    #[test]
    fn move_toward_surfaces_unreadable_cells() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        let h = bridge.create_grid(REQUEST);
        fake::inject_invalid_utf8(0);
        assert_eq!(
            bridge.move_toward(h, Direction::Right),
            Err(MazerStatus::MarshalFailed)
        );
        let cells = bridge.cells(h).unwrap().unwrap();
        assert_eq!(cells.active().map(|c| (c.x, c.y)), Some((0, 0)));
        assert_eq!(fake::ledger().outstanding_buffers(), 0);
    }

    #[test]
    fn drop_destroys_remaining_grids() {
        fake::reset_ledger();
        let bridge = Bridge::new(fake::api());
        bridge.create_grid(REQUEST);
        bridge.create_grid(REQUEST);
        assert_eq!(fake::ledger().live_grids(), 2);
        drop(bridge);
        assert!(fake::ledger().is_clean());
    }
}
