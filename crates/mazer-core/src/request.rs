//! Maze construction requests.
//!
//! The native engine builds a grid from a JSON document. [`MazeRequest`]
//! is the typed form of that document; [`MazeRequestBuilder`] validates it
//! before serialization so obviously bad requests never reach the engine.
//! The bridge itself forwards whatever text it is given.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Largest width or height for which generation steps may be captured.
pub const CAPTURE_STEPS_LIMIT: i32 = 100;

/// Maze family. Serialized with the engine's names (`"Orthogonal"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MazeType {
    /// Triangular cells, alternating normal and inverted.
    Delta,
    /// Square cells on a rectangular grid.
    Orthogonal,
    /// Diamond cells with slanted paths.
    Rhombic,
    /// Hexagonal cells.
    Sigma,
    /// Alternating octagon and square cells.
    Upsilon,
}

impl MazeType {
    /// Every maze type, in declaration order.
    pub const ALL: [MazeType; 5] = [
        MazeType::Delta,
        MazeType::Orthogonal,
        MazeType::Rhombic,
        MazeType::Sigma,
        MazeType::Upsilon,
    ];

    /// Engine-side name, as it appears in requests and in cell records.
    pub fn ffi_name(self) -> &'static str {
        match self {
            MazeType::Delta => "Delta",
            MazeType::Orthogonal => "Orthogonal",
            MazeType::Rhombic => "Rhombic",
            MazeType::Sigma => "Sigma",
            MazeType::Upsilon => "Upsilon",
        }
    }

    /// Parse an engine-side name (as found in [`Cell::maze_type`](crate::Cell)).
    pub fn from_ffi_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.ffi_name() == name)
    }

    /// Like [`from_ffi_name`](Self::from_ffi_name), ignoring ASCII case.
    pub fn parse_loose(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.ffi_name().eq_ignore_ascii_case(name))
    }
}

/// Generation algorithm. Serialized with the engine's PascalCase names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MazeAlgorithm {
    /// Random walk; uniform spanning tree.
    AldousBroder,
    /// Carves north or east from every cell.
    BinaryTree,
    /// Row-by-row set merging.
    Ellers,
    /// Growing tree, always extending the newest cell.
    GrowingTreeNewest,
    /// Growing tree, extending a random cell.
    GrowingTreeRandom,
    /// Random walk with hunting scans for unvisited cells.
    HuntAndKill,
    /// Randomized Kruskal over all walls.
    Kruskals,
    /// Randomized Prim frontier expansion.
    Prims,
    /// Depth-first search with backtracking.
    RecursiveBacktracker,
    /// Walls added by recursive subdivision.
    RecursiveDivision,
    /// Removes walls from a fully linked grid.
    ReverseDelete,
    /// Row runs closed out by a northward link.
    Sidewinder,
    /// Loop-erased random walks; uniform spanning tree.
    Wilsons,
}

impl MazeAlgorithm {
    /// Every algorithm, in declaration order.
    pub const ALL: [MazeAlgorithm; 13] = [
        MazeAlgorithm::AldousBroder,
        MazeAlgorithm::BinaryTree,
        MazeAlgorithm::Ellers,
        MazeAlgorithm::GrowingTreeNewest,
        MazeAlgorithm::GrowingTreeRandom,
        MazeAlgorithm::HuntAndKill,
        MazeAlgorithm::Kruskals,
        MazeAlgorithm::Prims,
        MazeAlgorithm::RecursiveBacktracker,
        MazeAlgorithm::RecursiveDivision,
        MazeAlgorithm::ReverseDelete,
        MazeAlgorithm::Sidewinder,
        MazeAlgorithm::Wilsons,
    ];

    /// Engine-side name, as it appears in requests.
    pub fn name(self) -> &'static str {
        use MazeAlgorithm::*;
        match self {
            AldousBroder => "AldousBroder",
            BinaryTree => "BinaryTree",
            Ellers => "Ellers",
            GrowingTreeNewest => "GrowingTreeNewest",
            GrowingTreeRandom => "GrowingTreeRandom",
            HuntAndKill => "HuntAndKill",
            Kruskals => "Kruskals",
            Prims => "Prims",
            RecursiveBacktracker => "RecursiveBacktracker",
            RecursiveDivision => "RecursiveDivision",
            ReverseDelete => "ReverseDelete",
            Sidewinder => "Sidewinder",
            Wilsons => "Wilsons",
        }
    }

    /// Parse an engine-side name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Whether the engine can run this algorithm on the given maze type.
    ///
    /// Row-oriented algorithms only work on orthogonal grids; rhombic grids
    /// additionally exclude the algorithms that walk row or tree order.
    pub fn supports(self, maze_type: MazeType) -> bool {
        use MazeAlgorithm::*;
        match maze_type {
            MazeType::Orthogonal => true,
            MazeType::Rhombic => !matches!(
                self,
                BinaryTree
                    | Sidewinder
                    | Ellers
                    | GrowingTreeNewest
                    | GrowingTreeRandom
                    | HuntAndKill
            ),
            MazeType::Delta | MazeType::Sigma | MazeType::Upsilon => {
                !matches!(self, BinaryTree | Sidewinder | Ellers | RecursiveDivision)
            }
        }
    }

    /// Algorithms available for a maze type, in declaration order.
    pub fn available_for(maze_type: MazeType) -> Vec<MazeAlgorithm> {
        Self::ALL
            .into_iter()
            .filter(|a| a.supports(maze_type))
            .collect()
    }
}

/// A cell position in a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// A validated construction request.
///
/// Obtain one through [`MazeRequest::builder`]; deserialized requests can be
/// re-checked with [`MazeRequest::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeRequest {
    /// Maze family.
    pub maze_type: MazeType,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Generation algorithm.
    pub algorithm: MazeAlgorithm,
    /// Record a snapshot per generation step.
    #[serde(default)]
    pub capture_steps: bool,
    /// Explicit start cell; the engine picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Coordinates>,
    /// Explicit goal cell; the engine picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Coordinates>,
}

impl MazeRequest {
    /// Start building a request for a `width` x `height` maze.
    pub fn builder(maze_type: MazeType, width: i32, height: i32) -> MazeRequestBuilder {
        MazeRequestBuilder {
            request: MazeRequest {
                maze_type,
                width,
                height,
                algorithm: MazeAlgorithm::RecursiveBacktracker,
                capture_steps: false,
                start: None,
                goal: None,
            },
        }
    }

    /// Check the request against the engine's documented limits.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(RequestError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.capture_steps
            && (self.width > CAPTURE_STEPS_LIMIT || self.height > CAPTURE_STEPS_LIMIT)
        {
            return Err(RequestError::InvalidDimensionsForCaptureSteps {
                limit: CAPTURE_STEPS_LIMIT,
            });
        }
        if !self.algorithm.supports(self.maze_type) {
            return Err(RequestError::InvalidAlgorithm {
                maze_type: self.maze_type,
                algorithm: self.algorithm,
            });
        }
        for c in [self.start, self.goal].into_iter().flatten() {
            if c.x < 0 || c.y < 0 || c.x >= self.width || c.y >= self.height {
                return Err(RequestError::InvalidCoordinates { x: c.x, y: c.y });
            }
        }
        if let (Some(start), Some(goal)) = (self.start, self.goal) {
            if start == goal {
                return Err(RequestError::StartAndGoalCoordinatesSame);
            }
        }
        Ok(())
    }

    /// Serialize to the JSON document the engine's construction call expects.
    pub fn to_json(&self) -> Result<String, RequestError> {
        serde_json::to_string(self).map_err(|e| RequestError::InvalidJson {
            reason: e.to_string(),
        })
    }

    /// Parse and validate a JSON request.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let request: MazeRequest =
            serde_json::from_str(json).map_err(|e| RequestError::InvalidJson {
                reason: e.to_string(),
            })?;
        request.validate()?;
        Ok(request)
    }
}

/// Builder for [`MazeRequest`]; validation runs in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct MazeRequestBuilder {
    request: MazeRequest,
}

impl MazeRequestBuilder {
    /// Generation algorithm (default: recursive backtracker).
    pub fn algorithm(mut self, algorithm: MazeAlgorithm) -> Self {
        self.request.algorithm = algorithm;
        self
    }

    /// Record generation steps for playback.
    pub fn capture_steps(mut self, capture: bool) -> Self {
        self.request.capture_steps = capture;
        self
    }

    /// Explicit start cell.
    pub fn start(mut self, x: i32, y: i32) -> Self {
        self.request.start = Some(Coordinates { x, y });
        self
    }

    /// Explicit goal cell.
    pub fn goal(mut self, x: i32, y: i32) -> Self {
        self.request.goal = Some(Coordinates { x, y });
        self
    }

    /// Validate and return the request.
    pub fn build(self) -> Result<MazeRequest, RequestError> {
        self.request.validate()?;
        Ok(self.request)
    }
}
