//! End-to-end bridge behavior against the fake engine.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use mazer_core::{Direction, MazeRequest, MazeType};
use mazer_ffi::{Bridge, CellError, GridHandle, MarshalError, MazerStatus};
use mazer_test_utils::fake::{self, Misuse};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
    fake::reset_ledger();
}

fn request(width: i32, height: i32, capture_steps: bool) -> String {
    MazeRequest::builder(MazeType::Orthogonal, width, height)
        .capture_steps(capture_steps)
        .build()
        .unwrap()
        .to_json()
        .unwrap()
}

#[test]
fn create_destroy_leaves_nothing_behind() {
    init();
    let bridge = Bridge::new(fake::api());
    for _ in 0..10 {
        let h = bridge.create_grid(&request(5, 5, true));
        assert!(!h.is_null());
        bridge.cells(h).unwrap();
        bridge.step_cells(h, 0).unwrap();
        assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
    }
    let ledger = fake::ledger();
    assert_eq!(ledger.grids_created, 10);
    assert!(ledger.is_clean(), "{ledger:?}");
}

#[test]
fn five_by_five_covers_every_coordinate_once() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(5, 5, false));
    let cells = bridge.cells(h).unwrap().unwrap();

    assert_eq!(cells.len(), 25);
    let coords: HashSet<(i64, i64)> = cells.iter().map(|c| (c.x, c.y)).collect();
    assert_eq!(coords.len(), 25);
    for x in 0..5 {
        for y in 0..5 {
            assert!(coords.contains(&(x, y)), "missing ({x}, {y})");
        }
    }
    assert!(cells.iter().all(|c| c.maze_type == "Orthogonal"));
    assert_eq!(cells.start().map(|c| (c.x, c.y)), Some((0, 0)));
    assert_eq!(cells.goal().map(|c| (c.x, c.y)), Some((4, 4)));
    assert!(cells.solution_path().count() >= 9);
}

#[test]
fn neighbor_lists_are_symmetric() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(4, 3, false));
    let cells = bridge.cells(h).unwrap().unwrap();
    let links: usize = cells.iter().map(|c| c.linked.len()).sum();
    assert_eq!(links, 2 * (4 * 3 - 1));

    let opposite = |t: &str| match t {
        "Up" => ("Down", 0, -1),
        "Down" => ("Up", 0, 1),
        "Left" => ("Right", -1, 0),
        _ => ("Left", 1, 0),
    };
    for c in cells.iter() {
        for token in &c.linked {
            let (back, dx, dy) = opposite(token.as_str());
            let n = cells.at(c.x + dx, c.y + dy).unwrap();
            assert!(n.is_linked(back), "({}, {}) {token}", c.x, c.y);
        }
    }
}

#[test]
fn snapshots_are_idempotent() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(6, 4, false));
    let first = bridge.cells(h).unwrap();
    let second = bridge.cells(h).unwrap();
    assert_eq!(first, second);
    assert_eq!(fake::ledger().outstanding_buffers(), 0);
}

#[test]
fn generation_steps_are_bounded() {
    init();
    let bridge = Bridge::new(fake::api());

    let plain = bridge.create_grid(&request(3, 3, false));
    assert_eq!(bridge.step_count(plain), 0);
    assert_eq!(bridge.step_cells(plain, 0), Ok(None));

    let captured = bridge.create_grid(&request(3, 3, true));
    let count = bridge.step_count(captured);
    assert_eq!(count, 8);
    for i in 0..count {
        let step = bridge.step_cells(captured, i).unwrap().unwrap();
        assert_eq!(step.len(), 9);
    }
    let last = bridge.step_cells(captured, count - 1).unwrap().unwrap();
    let current = bridge.cells(captured).unwrap().unwrap();
    let links = |cells: &mazer_core::Cells| -> Vec<Vec<String>> {
        cells.iter().map(|c| c.linked.clone()).collect()
    };
    assert_eq!(links(&last), links(&current));

    assert_eq!(bridge.step_cells(captured, count), Ok(None));
    assert_eq!(bridge.step_cells(captured, -5), Ok(None));
    assert_eq!(bridge.step_cells(captured, i64::MAX), Ok(None));
    assert!(fake::ledger().misuse.is_empty());
}

#[test]
fn accepted_move_keeps_handle() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(3, 3, false));
    assert_eq!(bridge.make_move(h, "Right"), h);
    assert_eq!(bridge.make_move(h, "Down"), h);
    let cells = bridge.cells(h).unwrap().unwrap();
    let active = cells.active().unwrap();
    assert_eq!((active.x, active.y), (1, 1));
    assert!(cells.at(1, 0).unwrap().has_been_visited);
}

#[test]
fn rejected_move_returns_null_and_keeps_state() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(3, 3, true));
    let steps = bridge.step_count(h);
    let before = bridge.cells(h).unwrap();

    assert_eq!(bridge.make_move(h, "Up"), GridHandle::NULL);
    assert_eq!(bridge.make_move(h, "sideways"), GridHandle::NULL);
    assert_eq!(bridge.make_move(h, "Up\0Down"), GridHandle::NULL);

    assert_eq!(bridge.step_count(h), steps);
    assert_eq!(bridge.cells(h).unwrap(), before);
    assert_eq!(bridge.make_move(h, Direction::Right.token()), h);
}

#[test]
fn double_destroy_never_reaches_engine() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(2, 2, false));
    assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
    assert_eq!(bridge.destroy_grid(h), MazerStatus::InvalidHandle);
    assert_eq!(bridge.destroy_grid(GridHandle::NULL), MazerStatus::InvalidHandle);
    assert_eq!(
        bridge.destroy_grid(GridHandle::from_raw(0xdead_beef)),
        MazerStatus::InvalidHandle
    );
    let ledger = fake::ledger();
    assert!(!ledger.misuse.contains(&Misuse::DoubleDestroy));
    assert!(ledger.is_clean(), "{ledger:?}");
}

#[test]
fn failed_copy_still_frees_buffer() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(3, 3, true));

    fake::inject_invalid_utf8(4);
    let err = bridge.cells(h).unwrap_err();
    assert_eq!(
        err,
        MarshalError::Element {
            index: 4,
            source: CellError::InvalidUtf8 {
                field: "orientation"
            },
        }
    );
    assert_eq!(MazerStatus::from(&err), MazerStatus::MarshalFailed);

    fake::inject_null_text(0);
    assert!(bridge.step_cells(h, 2).is_err());

    let ledger = fake::ledger();
    assert_eq!(ledger.buffers_allocated, 2);
    assert_eq!(ledger.outstanding_buffers(), 0);

    // The grid is still usable afterwards.
    assert_eq!(bridge.cells(h).unwrap().unwrap().len(), 9);
}

#[test]
fn engine_without_snapshot_is_none() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(2, 2, false));
    fake::inject_null_snapshot();
    assert_eq!(bridge.cells(h), Ok(None));
    assert_eq!(fake::ledger().buffers_allocated, 0);
}

#[test]
fn relocated_grid_stays_behind_same_handle() {
    init();
    let bridge = Bridge::new(fake::api());
    let h = bridge.create_grid(&request(3, 3, false));
    fake::relocate_next_move();
    assert_eq!(bridge.make_move(h, "Right"), h);
    let cells = bridge.cells(h).unwrap().unwrap();
    assert_eq!(cells.active().map(|c| (c.x, c.y)), Some((1, 0)));
    assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
    let ledger = fake::ledger();
    assert!(ledger.is_clean(), "{ledger:?}");
}

#[test]
fn dropping_bridge_destroys_open_grids() {
    init();
    let bridge = Bridge::new(fake::api());
    for _ in 0..3 {
        bridge.create_grid(&request(2, 2, false));
    }
    assert_eq!(bridge.live_grids(), 3);
    drop(bridge);
    assert!(fake::ledger().is_clean());
}

#[test]
fn grids_are_usable_from_many_threads() {
    init();
    let bridge = Arc::new(Bridge::new(fake::api()));
    let handles: Vec<GridHandle> = (0..4)
        .map(|_| bridge.create_grid(&request(4, 4, true)))
        .collect();

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            let h = handles[i % handles.len()];
            thread::spawn(move || {
                for step in 0..bridge.step_count(h) {
                    let cells = bridge.step_cells(h, step).unwrap().unwrap();
                    assert_eq!(cells.len(), 16);
                }
                bridge.make_move(h, "Right");
                bridge.make_move(h, "Left");
                bridge.cells(h).unwrap().unwrap().len()
            })
        })
        .collect();
    for w in workers {
        assert_eq!(w.join().unwrap(), 16);
    }

    for h in handles {
        assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
    }
    let ledger = fake::ledger();
    assert!(ledger.is_clean(), "{ledger:?}");
}

#[test]
fn destroy_races_with_readers() {
    init();
    let bridge = Arc::new(Bridge::new(fake::api()));
    let h = bridge.create_grid(&request(8, 8, false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for _ in 0..50 {
                    // Either a full snapshot or None once destroyed.
                    if let Some(cells) = bridge.cells(h).unwrap() {
                        assert_eq!(cells.len(), 64);
                    }
                }
            })
        })
        .collect();
    assert_eq!(bridge.destroy_grid(h), MazerStatus::Ok);
    for r in readers {
        r.join().unwrap();
    }

    let ledger = fake::ledger();
    assert!(ledger.is_clean(), "{ledger:?}");
}
