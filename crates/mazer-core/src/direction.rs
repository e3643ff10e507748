//! Move directions and their engine tokens.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::request::MazeType;

/// A player move direction.
///
/// The engine receives the token from [`Direction::token`]; which tokens a
/// given cell accepts is decided natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Toward column 0.
    Left,
    /// Away from column 0.
    Right,
    /// Up and left.
    UpperLeft,
    /// Up and right.
    UpperRight,
    /// Down and left.
    LowerLeft,
    /// Down and right.
    LowerRight,
}

impl Direction {
    /// Every direction, in declaration order.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpperLeft,
        Direction::UpperRight,
        Direction::LowerLeft,
        Direction::LowerRight,
    ];

    /// Token the native move operator understands.
    pub fn token(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::UpperLeft => "UpperLeft",
            Direction::UpperRight => "UpperRight",
            Direction::LowerLeft => "LowerLeft",
            Direction::LowerRight => "LowerRight",
        }
    }

    /// Directions to try, in order, when the player presses `self`.
    ///
    /// Delta cells have no diagonal walls on half of their orientations, so a
    /// diagonal press falls back to the horizontal move. Sigma (hex) cells
    /// have no pure left/right, so a diagonal falls back to its mirror.
    pub fn fallbacks(self, maze_type: MazeType) -> Vec<Direction> {
        use Direction::*;
        match (maze_type, self) {
            (MazeType::Delta, UpperRight | LowerRight) => vec![self, Right],
            (MazeType::Delta, UpperLeft | LowerLeft) => vec![self, Left],
            (MazeType::Sigma, UpperRight) => vec![UpperRight, LowerRight],
            (MazeType::Sigma, LowerRight) => vec![LowerRight, UpperRight],
            (MazeType::Sigma, UpperLeft) => vec![UpperLeft, LowerLeft],
            (MazeType::Sigma, LowerLeft) => vec![LowerLeft, UpperLeft],
            _ => vec![self],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when parsing an unknown direction token.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown direction '{0}'")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.token() == s)
            .ok_or_else(|| UnknownDirection(s.to_owned()))
    }
}
