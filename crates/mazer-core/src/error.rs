//! Request validation errors.

use thiserror::Error;

use crate::request::{MazeAlgorithm, MazeType};

/// Reasons a [`MazeRequest`](crate::MazeRequest) is rejected before it is
/// handed to the native engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Width or height is zero or negative.
    #[error("the provided maze dimensions are invalid ({width}x{height})")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// Step capture was requested for a maze larger than the capture limit.
    #[error("capture steps is only available for mazes with width and height <= {limit}")]
    InvalidDimensionsForCaptureSteps {
        /// Largest width/height for which steps may be captured.
        limit: i32,
    },
    /// The algorithm cannot generate this maze type.
    #[error("algorithm {algorithm:?} is not valid for maze type {maze_type:?}")]
    InvalidAlgorithm {
        /// Requested maze type.
        maze_type: MazeType,
        /// Requested algorithm.
        algorithm: MazeAlgorithm,
    },
    /// Start or goal lies outside the grid.
    #[error("coordinates ({x}, {y}) are out of bounds")]
    InvalidCoordinates {
        /// Offending column.
        x: i32,
        /// Offending row.
        y: i32,
    },
    /// Start and goal are the same cell.
    #[error("start and goal coordinates cannot be the same")]
    StartAndGoalCoordinatesSame,
    /// The request could not be serialized.
    #[error("the maze request JSON is malformed: {reason}")]
    InvalidJson {
        /// Serializer message.
        reason: String,
    },
}
