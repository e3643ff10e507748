//! In-process fake of the native engine.
//!
//! [`api`] returns a [`MazerApi`] whose entry points are implemented here in
//! Rust. The fake builds a deterministic "comb" maze (row 0 open left to
//! right, every other cell linked upward), records one generation step per
//! carved link when `capture_steps` is set, and moves the player along links
//! with the tokens `Up`, `Down`, `Left`, `Right`.
//!
//! Every grid and cell buffer is accounted in a [`Ledger`]. The ledger that
//! is current on the thread creating a grid follows that grid (and its
//! buffers) across threads, so a test reads its own numbers with [`ledger`]
//! even when the test itself spawns workers.
//!
//! Destroyed grids and freed buffers are poisoned, not released: their
//! storage stays reserved so the address is never handed out again, and any
//! later call with that pointer is recorded as [`Misuse`] and answered with
//! null or zero instead of touching the data.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use mazer_sys::{FfiCell, MazerApi, RawGrid, MAZER_INTEGRATION_OK};
use serde_json::Value;

/// Largest width or height the fake accepts.
pub const MAX_DIMENSION: u64 = 1000;

const UP: &str = "Up";
const DOWN: &str = "Down";
const LEFT: &str = "Left";
const RIGHT: &str = "Right";

const MAZE_TYPES: [&str; 5] = ["Delta", "Orthogonal", "Rhombic", "Sigma", "Upsilon"];

/// A contract violation observed by the fake engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Misuse {
    /// A destroyed grid was passed to `call`.
    UseAfterDestroy { call: &'static str },
    /// A grid the engine replaced during a move was passed to `call`.
    UseAfterRelocation { call: &'static str },
    /// `mazer_destroy` was called twice with the same grid.
    DoubleDestroy,
    /// A pointer the engine never returned was passed to `call`.
    UnknownGrid { call: &'static str },
    /// `mazer_free_cells` was called twice with the same buffer.
    DoubleFree,
    /// `mazer_free_cells` received a pointer the engine never returned.
    UnknownBuffer,
    /// `mazer_free_cells` received a different length than was handed out.
    LengthMismatch { allocated: usize, freed: usize },
    /// A required pointer argument was null.
    NullArgument { call: &'static str },
}

/// Allocation counters and recorded misuse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    pub grids_created: usize,
    pub grids_destroyed: usize,
    pub buffers_allocated: usize,
    pub buffers_freed: usize,
    pub misuse: Vec<Misuse>,
}

impl Ledger {
    /// Grids created and not yet destroyed.
    pub fn live_grids(&self) -> usize {
        self.grids_created - self.grids_destroyed
    }

    /// Cell buffers handed out and not yet freed.
    pub fn outstanding_buffers(&self) -> usize {
        self.buffers_allocated - self.buffers_freed
    }

    /// No live grids, no outstanding buffers, no misuse.
    pub fn is_clean(&self) -> bool {
        self.live_grids() == 0 && self.outstanding_buffers() == 0 && self.misuse.is_empty()
    }
}

type SharedLedger = Arc<Mutex<Ledger>>;

#[derive(Default)]
struct Faults {
    invalid_utf8_at: Option<usize>,
    null_text_at: Option<usize>,
    null_snapshot: bool,
    empty_snapshot: bool,
    relocate_next_move: bool,
}

thread_local! {
    static CURRENT: RefCell<SharedLedger> = RefCell::new(Arc::default());
    static FAULTS: RefCell<Faults> = RefCell::new(Faults::default());
}

/// Snapshot of the current thread's ledger.
pub fn ledger() -> Ledger {
    CURRENT.with(|c| lock(&c.borrow()).clone())
}

/// Start a fresh ledger for grids created from now on by this thread.
pub fn reset_ledger() {
    CURRENT.with(|c| *c.borrow_mut() = Arc::default());
}

/// The next cell buffer returned on this thread carries non-UTF-8
/// `orientation` text at `index`.
pub fn inject_invalid_utf8(index: usize) {
    FAULTS.with(|f| f.borrow_mut().invalid_utf8_at = Some(index));
}

/// The next cell buffer returned on this thread has a null `orientation`
/// pointer at `index`.
pub fn inject_null_text(index: usize) {
    FAULTS.with(|f| f.borrow_mut().null_text_at = Some(index));
}

/// The next `mazer_get_cells` on this thread returns null.
pub fn inject_null_snapshot() {
    FAULTS.with(|f| f.borrow_mut().null_snapshot = true);
}

/// The next `mazer_get_cells` on this thread returns a non-null buffer
/// holding zero records.
pub fn inject_empty_snapshot() {
    FAULTS.with(|f| f.borrow_mut().empty_snapshot = true);
}

/// The next accepted move on this thread returns a new grid pointer and
/// retires the old one.
pub fn relocate_next_move() {
    FAULTS.with(|f| f.borrow_mut().relocate_next_move = true);
}

/// The fake engine's entry points.
pub fn api() -> MazerApi {
    MazerApi {
        integration_test: fake_integration_test,
        generate_maze: fake_generate_maze,
        destroy: fake_destroy,
        get_cells: fake_get_cells,
        free_cells: fake_free_cells,
        get_generation_steps_count: fake_steps_count,
        get_generation_step_cells: fake_step_cells,
        make_move: fake_make_move,
    }
}

// ── Engine state ────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct SnapshotCell {
    x: usize,
    y: usize,
    linked: Vec<&'static str>,
    distance: i32,
    is_start: bool,
    is_goal: bool,
    is_active: bool,
    is_visited: bool,
    has_been_visited: bool,
    on_solution_path: bool,
}

#[derive(Clone, Debug, Default)]
struct FakeCell {
    linked: Vec<&'static str>,
    distance: i32,
    is_visited: bool,
    has_been_visited: bool,
    on_solution_path: bool,
}

#[derive(Clone)]
struct FakeGrid {
    ledger: SharedLedger,
    maze_type: &'static str,
    width: usize,
    height: usize,
    cells: Vec<FakeCell>,
    start: usize,
    goal: usize,
    active: usize,
    steps: Vec<Vec<SnapshotCell>>,
}

fn token_rank(token: &str) -> usize {
    [UP, DOWN, LEFT, RIGHT]
        .iter()
        .position(|t| *t == token)
        .unwrap_or(usize::MAX)
}

fn dimension(value: Option<&Value>) -> Option<usize> {
    let v = value?.as_u64()?;
    if v == 0 || v > MAX_DIMENSION {
        return None;
    }
    usize::try_from(v).ok()
}

fn cell_index(value: Option<&Value>, width: usize, height: usize) -> Option<Option<usize>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(v) => {
            let x = usize::try_from(v.get("x")?.as_u64()?).ok()?;
            let y = usize::try_from(v.get("y")?.as_u64()?).ok()?;
            if x >= width || y >= height {
                return None;
            }
            Some(Some(y * width + x))
        }
    }
}

impl FakeGrid {
    fn from_request(text: &str, ledger: SharedLedger) -> Option<Self> {
        let request: Value = serde_json::from_str(text).ok()?;
        let requested = request.get("maze_type")?.as_str()?;
        let maze_type = MAZE_TYPES
            .into_iter()
            .find(|t| t.eq_ignore_ascii_case(requested))?;
        let width = dimension(request.get("width"))?;
        let height = dimension(request.get("height"))?;
        let capture = request
            .get("capture_steps")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let start = cell_index(request.get("start"), width, height)?.unwrap_or(0);
        let goal = cell_index(request.get("goal"), width, height)?.unwrap_or(width * height - 1);
        if start == goal && width * height > 1 {
            return None;
        }

        let mut grid = FakeGrid {
            ledger,
            maze_type,
            width,
            height,
            cells: vec![FakeCell::default(); width * height],
            start,
            goal,
            active: start,
            steps: Vec::new(),
        };
        grid.generate(capture);
        grid.solve();
        Some(grid)
    }

    fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    fn neighbor(&self, index: usize, token: &str) -> Option<usize> {
        let (x, y) = self.coords(index);
        match token {
            UP if y > 0 => Some(index - self.width),
            DOWN if y + 1 < self.height => Some(index + self.width),
            LEFT if x > 0 => Some(index - 1),
            RIGHT if x + 1 < self.width => Some(index + 1),
            _ => None,
        }
    }

    fn link(&mut self, a: usize, to_b: &'static str, b: usize, to_a: &'static str) {
        self.cells[a].linked.push(to_b);
        self.cells[a].linked.sort_by_key(|t| token_rank(t));
        self.cells[b].linked.push(to_a);
        self.cells[b].linked.sort_by_key(|t| token_rank(t));
        self.cells[b].is_visited = true;
    }

    fn generate(&mut self, capture: bool) {
        self.cells[0].is_visited = true;
        for x in 1..self.width {
            self.link(x - 1, RIGHT, x, LEFT);
            if capture {
                self.record_step(x);
            }
        }
        for y in 1..self.height {
            for x in 0..self.width {
                let here = y * self.width + x;
                self.link(here - self.width, DOWN, here, UP);
                if capture {
                    self.record_step(here);
                }
            }
        }
    }

    fn record_step(&mut self, carved: usize) {
        let step = (0..self.cells.len())
            .map(|i| {
                let (x, y) = self.coords(i);
                let c = &self.cells[i];
                SnapshotCell {
                    x,
                    y,
                    linked: c.linked.clone(),
                    distance: 0,
                    is_start: false,
                    is_goal: false,
                    is_active: i == carved,
                    is_visited: c.is_visited,
                    has_been_visited: false,
                    on_solution_path: false,
                }
            })
            .collect();
        self.steps.push(step);
    }

    fn solve(&mut self) {
        let mut distance = vec![i32::MAX; self.cells.len()];
        let mut queue = VecDeque::from([self.start]);
        distance[self.start] = 0;
        while let Some(i) = queue.pop_front() {
            for &token in &self.cells[i].linked {
                if let Some(n) = self.neighbor(i, token) {
                    if distance[n] == i32::MAX {
                        distance[n] = distance[i] + 1;
                        queue.push_back(n);
                    }
                }
            }
        }
        for (c, d) in self.cells.iter_mut().zip(&distance) {
            c.distance = *d;
        }

        let mut at = self.goal;
        self.cells[at].on_solution_path = true;
        while at != self.start {
            let next = self.cells[at]
                .linked
                .iter()
                .filter_map(|t| self.neighbor(at, t))
                .find(|n| distance[*n] + 1 == distance[at]);
            match next {
                Some(n) => {
                    at = n;
                    self.cells[at].on_solution_path = true;
                }
                None => break,
            }
        }
        self.cells[self.start].has_been_visited = true;
    }

    fn try_move(&mut self, token: &str) -> bool {
        if !self.cells[self.active].linked.iter().any(|t| *t == token) {
            return false;
        }
        match self.neighbor(self.active, token) {
            Some(target) => {
                self.active = target;
                self.cells[target].has_been_visited = true;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<SnapshotCell> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (x, y) = self.coords(i);
                SnapshotCell {
                    x,
                    y,
                    linked: c.linked.clone(),
                    distance: c.distance,
                    is_start: i == self.start,
                    is_goal: i == self.goal,
                    is_active: i == self.active,
                    is_visited: c.is_visited,
                    has_been_visited: c.has_been_visited,
                    on_solution_path: c.on_solution_path,
                }
            })
            .collect()
    }
}

// ── Registry ────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Cause {
    Destroyed,
    Relocated,
}

struct Tomb {
    grid: Box<FakeGrid>,
    cause: Cause,
}

struct Buffer {
    cells: Vec<FfiCell>,
    _strings: Vec<CString>,
    _links: Vec<Vec<*const c_char>>,
    ledger: SharedLedger,
}

// SAFETY: the raw pointers in `Buffer` point into `_strings`/`_links`, which
// the buffer owns; they move with it.
unsafe impl Send for Buffer {}

#[derive(Default)]
struct Registry {
    live: HashMap<usize, Box<FakeGrid>>,
    graveyard: HashMap<usize, Tomb>,
    buffers: HashMap<usize, Buffer>,
    released: HashMap<usize, Buffer>,
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(Mutex::default);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn current() -> SharedLedger {
    CURRENT.with(|c| c.borrow().clone())
}

fn record(ledger: &SharedLedger, f: impl FnOnce(&mut Ledger)) {
    f(&mut lock(ledger));
}

fn misuse(ledger: &SharedLedger, m: Misuse) {
    record(ledger, |l| l.misuse.push(m));
}

impl Registry {
    /// Look up a live grid, recording misuse for stale or unknown pointers.
    fn live_grid(&mut self, grid: *const c_void, call: &'static str) -> Option<&mut FakeGrid> {
        let key = grid as usize;
        if self.live.contains_key(&key) {
            return self.live.get_mut(&key).map(|g| &mut **g);
        }
        match self.graveyard.get(&key) {
            Some(tomb) => {
                let m = match tomb.cause {
                    Cause::Destroyed => Misuse::UseAfterDestroy { call },
                    Cause::Relocated => Misuse::UseAfterRelocation { call },
                };
                misuse(&tomb.grid.ledger, m);
            }
            None => misuse(&current(), Misuse::UnknownGrid { call }),
        }
        None
    }

    fn publish(&mut self, mut buffer: Buffer, length: *mut usize) -> *mut FfiCell {
        let len = buffer.cells.len();
        let cells = buffer.cells.as_mut_ptr();
        record(&buffer.ledger, |l| l.buffers_allocated += 1);
        self.buffers.insert(cells as usize, buffer);
        // SAFETY: callers check `length` for null before publishing.
        unsafe { *length = len };
        cells
    }
}

fn intern(strings: &mut Vec<CString>, bytes: Vec<u8>) -> *const c_char {
    let s = CString::new(bytes).unwrap_or_default();
    let p = s.as_ptr();
    strings.push(s);
    p
}

fn render(cells: &[SnapshotCell], maze_type: &str, ledger: SharedLedger) -> Buffer {
    let (invalid_utf8_at, null_text_at) = FAULTS.with(|f| {
        let mut f = f.borrow_mut();
        (f.invalid_utf8_at.take(), f.null_text_at.take())
    });

    let mut strings = Vec::new();
    let mut links = Vec::with_capacity(cells.len());
    // Never zero-capacity: every buffer gets its own address.
    let mut out = Vec::with_capacity(cells.len().max(1));
    for (i, c) in cells.iter().enumerate() {
        let orientation = if null_text_at == Some(i) {
            ptr::null()
        } else if invalid_utf8_at == Some(i) {
            intern(&mut strings, vec![0xff, 0xfe, b'N'])
        } else if maze_type == "Delta" && (c.x + c.y) % 2 == 1 {
            intern(&mut strings, b"Inverted".to_vec())
        } else {
            intern(&mut strings, b"Normal".to_vec())
        };
        let linked_ptrs: Vec<*const c_char> = c
            .linked
            .iter()
            .map(|t| intern(&mut strings, t.as_bytes().to_vec()))
            .collect();
        let linked = if linked_ptrs.is_empty() {
            ptr::null()
        } else {
            linked_ptrs.as_ptr()
        };
        out.push(FfiCell {
            x: c.x,
            y: c.y,
            maze_type: intern(&mut strings, maze_type.as_bytes().to_vec()),
            linked,
            linked_len: linked_ptrs.len(),
            distance: c.distance,
            is_start: c.is_start,
            is_goal: c.is_goal,
            is_active: c.is_active,
            is_visited: c.is_visited,
            has_been_visited: c.has_been_visited,
            on_solution_path: c.on_solution_path,
            orientation,
            is_square: maze_type == "Orthogonal" || (maze_type == "Upsilon" && (c.x + c.y) % 2 == 1),
        });
        links.push(linked_ptrs);
    }
    Buffer {
        cells: out,
        _strings: strings,
        _links: links,
        ledger,
    }
}

// ── Entry points ────────────────────────────────────────────────

unsafe extern "C" fn fake_integration_test() -> c_int {
    MAZER_INTEGRATION_OK
}

unsafe extern "C" fn fake_generate_maze(request: *const c_char) -> *mut RawGrid {
    if request.is_null() {
        misuse(&current(), Misuse::NullArgument {
            call: "mazer_generate_maze",
        });
        return ptr::null_mut();
    }
    // SAFETY: the contract requires a NUL-terminated request string.
    let text = unsafe { CStr::from_ptr(request) };
    let Some(grid) = text
        .to_str()
        .ok()
        .and_then(|t| FakeGrid::from_request(t, current()))
    else {
        return ptr::null_mut();
    };
    let grid = Box::new(grid);
    let key = &*grid as *const FakeGrid as usize;
    record(&grid.ledger, |l| l.grids_created += 1);
    lock(&REGISTRY).live.insert(key, grid);
    key as *mut RawGrid
}

unsafe extern "C" fn fake_destroy(grid: *mut RawGrid) {
    let key = grid as usize;
    let mut reg = lock(&REGISTRY);
    if let Some(g) = reg.live.remove(&key) {
        record(&g.ledger, |l| l.grids_destroyed += 1);
        reg.graveyard.insert(
            key,
            Tomb {
                grid: g,
                cause: Cause::Destroyed,
            },
        );
    } else if let Some(tomb) = reg.graveyard.get(&key) {
        let m = match tomb.cause {
            Cause::Destroyed => Misuse::DoubleDestroy,
            Cause::Relocated => Misuse::UseAfterRelocation {
                call: "mazer_destroy",
            },
        };
        misuse(&tomb.grid.ledger, m);
    } else {
        misuse(&current(), Misuse::UnknownGrid {
            call: "mazer_destroy",
        });
    }
}

unsafe extern "C" fn fake_get_cells(grid: *mut RawGrid, length: *mut usize) -> *mut FfiCell {
    if length.is_null() {
        misuse(&current(), Misuse::NullArgument {
            call: "mazer_get_cells",
        });
        return ptr::null_mut();
    }
    // SAFETY: checked non-null above; the caller owns the slot.
    unsafe { *length = 0 };
    let mut reg = lock(&REGISTRY);
    let Some(g) = reg.live_grid(grid as *const c_void, "mazer_get_cells") else {
        return ptr::null_mut();
    };
    if FAULTS.with(|f| std::mem::take(&mut f.borrow_mut().null_snapshot)) {
        return ptr::null_mut();
    }
    let snapshot = if FAULTS.with(|f| std::mem::take(&mut f.borrow_mut().empty_snapshot)) {
        Vec::new()
    } else {
        g.snapshot()
    };
    let buffer = render(&snapshot, g.maze_type, g.ledger.clone());
    reg.publish(buffer, length)
}

unsafe extern "C" fn fake_free_cells(cells: *mut FfiCell, length: usize) {
    if cells.is_null() {
        misuse(&current(), Misuse::NullArgument {
            call: "mazer_free_cells",
        });
        return;
    }
    let key = cells as usize;
    let mut reg = lock(&REGISTRY);
    if let Some(buffer) = reg.buffers.remove(&key) {
        record(&buffer.ledger, |l| {
            l.buffers_freed += 1;
            if buffer.cells.len() != length {
                l.misuse.push(Misuse::LengthMismatch {
                    allocated: buffer.cells.len(),
                    freed: length,
                });
            }
        });
        // Kept so the address is not reused by a later buffer.
        reg.released.insert(key, buffer);
    } else if let Some(buffer) = reg.released.get(&key) {
        misuse(&buffer.ledger, Misuse::DoubleFree);
    } else {
        misuse(&current(), Misuse::UnknownBuffer);
    }
}

unsafe extern "C" fn fake_steps_count(grid: *mut RawGrid) -> usize {
    lock(&REGISTRY)
        .live_grid(grid as *const c_void, "mazer_get_generation_steps_count")
        .map_or(0, |g| g.steps.len())
}

unsafe extern "C" fn fake_step_cells(
    grid: *mut RawGrid,
    step_index: usize,
    length: *mut usize,
) -> *mut FfiCell {
    if length.is_null() {
        misuse(&current(), Misuse::NullArgument {
            call: "mazer_get_generation_step_cells",
        });
        return ptr::null_mut();
    }
    // SAFETY: checked non-null above; the caller owns the slot.
    unsafe { *length = 0 };
    let mut reg = lock(&REGISTRY);
    let Some(g) = reg.live_grid(grid as *const c_void, "mazer_get_generation_step_cells") else {
        return ptr::null_mut();
    };
    let Some(step) = g.steps.get(step_index) else {
        return ptr::null_mut();
    };
    let buffer = render(step, g.maze_type, g.ledger.clone());
    reg.publish(buffer, length)
}

unsafe extern "C" fn fake_make_move(grid: *mut c_void, direction: *const c_char) -> *mut c_void {
    if direction.is_null() {
        misuse(&current(), Misuse::NullArgument {
            call: "mazer_make_move",
        });
        return ptr::null_mut();
    }
    // SAFETY: the contract requires a NUL-terminated direction string.
    let Ok(token) = unsafe { CStr::from_ptr(direction) }.to_str() else {
        return ptr::null_mut();
    };
    let key = grid as usize;
    let mut reg = lock(&REGISTRY);
    let Some(g) = reg.live_grid(grid, "mazer_make_move") else {
        return ptr::null_mut();
    };
    if !g.try_move(token) {
        return ptr::null_mut();
    }
    if !FAULTS.with(|f| std::mem::take(&mut f.borrow_mut().relocate_next_move)) {
        return grid;
    }

    let moved = Box::new(g.clone());
    let new_key = &*moved as *const FakeGrid as usize;
    if let Some(old) = reg.live.remove(&key) {
        reg.graveyard.insert(
            key,
            Tomb {
                grid: old,
                cause: Cause::Relocated,
            },
        );
    }
    reg.live.insert(new_key, moved);
    new_key as *mut c_void
}
