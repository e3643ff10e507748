//! Owned host-side cell snapshots.
//!
//! A [`Cell`] is a deep copy of one native cell record: every text field is
//! an owned `String`, so a cell stays valid after the native buffer it was
//! copied from has been released.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// One maze cell as seen by the host.
///
/// Field order follows the wire shape of the native record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column coordinate.
    pub x: i64,
    /// Row coordinate.
    pub y: i64,
    /// Engine label for the maze family this cell belongs to (e.g. `"Orthogonal"`).
    pub maze_type: String,
    /// Directions of the neighbors this cell is linked to, in engine order.
    pub linked: Vec<String>,
    /// Distance value used for heat-map rendering.
    pub distance: i32,
    /// Cell is the start of the maze.
    pub is_start: bool,
    /// Cell is the goal of the maze.
    pub is_goal: bool,
    /// Cell currently holds the player.
    pub is_active: bool,
    /// Cell has been visited by the generator.
    pub is_visited: bool,
    /// Cell has been visited by the player at some point.
    pub has_been_visited: bool,
    /// Cell lies on the start-to-goal solution path.
    pub on_solution_path: bool,
    /// Engine orientation label (e.g. `"Normal"` / `"Inverted"` for delta cells).
    pub orientation: String,
    /// Cell is drawn as a square (upsilon mazes alternate octagons and squares).
    pub is_square: bool,
}

impl Cell {
    /// Whether this cell has a link in the given engine direction token.
    pub fn is_linked(&self, direction: &str) -> bool {
        self.linked.iter().any(|d| d == direction)
    }
}

/// An ordered sequence of cells produced by a single accessor call.
///
/// Order is the native array order; the bridge never reorders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cells(Vec<Cell>);

impl Cells {
    /// Cell at the given coordinates, if present.
    pub fn at(&self, x: i64, y: i64) -> Option<&Cell> {
        self.0.iter().find(|c| c.x == x && c.y == y)
    }

    /// The cell currently holding the player.
    pub fn active(&self) -> Option<&Cell> {
        self.0.iter().find(|c| c.is_active)
    }

    /// The start cell.
    pub fn start(&self) -> Option<&Cell> {
        self.0.iter().find(|c| c.is_start)
    }

    /// The goal cell.
    pub fn goal(&self) -> Option<&Cell> {
        self.0.iter().find(|c| c.is_goal)
    }

    /// Cells on the solution path, in array order.
    pub fn solution_path(&self) -> impl Iterator<Item = &Cell> {
        self.0.iter().filter(|c| c.on_solution_path)
    }

    /// Consume the sequence, returning the underlying vector.
    pub fn into_vec(self) -> Vec<Cell> {
        self.0
    }
}

impl From<Vec<Cell>> for Cells {
    fn from(cells: Vec<Cell>) -> Self {
        Self(cells)
    }
}

impl Deref for Cells {
    type Target = [Cell];

    fn deref(&self) -> &[Cell] {
        &self.0
    }
}

impl IntoIterator for Cells {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Cells {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
