//! # Grid Primitives
//!
//! Coordinates, compass directions, sensor markers and the `GridKnowledge`
//! abstraction the exploration policy is written against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of a sensor snapshot. The agent sits at the center cell.
pub const SCAN_SIZE: usize = 5;
/// Distance from the center of a snapshot to its border.
pub const SCAN_RADIUS: i64 = (SCAN_SIZE / 2) as i64;

/// A cell on the grid. `x` grows to the east, `y` grows to the south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i64,
    pub y: i64,
}

impl Pos {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    pub fn manhattan(self, other: Pos) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn in_bounds(self, grid_size: i64) -> bool {
        (0..grid_size).contains(&self.x) && (0..grid_size).contains(&self.y)
    }

    /// Distance to the nearest grid border (0 on the border itself).
    pub fn edge_distance(self, grid_size: i64) -> i64 {
        self.x
            .min(self.y)
            .min(grid_size - 1 - self.x)
            .min(grid_size - 1 - self.y)
    }

    /// Cells of the scan window centered on `self`, including out-of-grid ones.
    pub fn window(self) -> impl Iterator<Item = Pos> {
        (-SCAN_RADIUS..=SCAN_RADIUS)
            .flat_map(move |dy| (-SCAN_RADIUS..=SCAN_RADIUS).map(move |dx| self.offset(dx, dy)))
    }

    /// The 8-neighbourhood of `self`.
    pub fn neighbors8(self) -> impl Iterator<Item = Pos> {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| self.offset(dx, dy))
    }
}

/// Walls are submitted as `"x-y"` strings.
impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid wall coordinate: {0:?}")]
pub struct ParsePosError(String);

impl FromStr for Pos {
    type Err = ParsePosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePosError(s.to_string());
        let (x, y) = s.split_once('-').ok_or_else(err)?;
        let x = x.parse::<i64>().map_err(|_| err())?;
        let y = y.parse::<i64>().map_err(|_| err())?;
        if x < 0 || y < 0 {
            return Err(err());
        }
        Ok(Pos::new(x, y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    /// Evaluation order used when several moves score the same.
    pub const ALL: [Direction; 4] = [Direction::N, Direction::S, Direction::E, Direction::W];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::N => (0, -1),
            Direction::S => (0, 1),
            Direction::E => (1, 0),
            Direction::W => (-1, 0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::S => "S",
            Direction::E => "E",
            Direction::W => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker of a single snapshot cell as reported by the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Wall,
    Empty,
    /// Anything else: out of bounds, another crow, unreadable.
    Other,
}

impl Marker {
    pub fn parse(s: &str) -> Self {
        match s {
            "W" => Marker::Wall,
            "_" => Marker::Empty,
            _ => Marker::Other,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Marker::Wall => "W",
            Marker::Empty => "_",
            Marker::Other => "X",
        }
    }
}

/// Raw 5x5 sensor reading, row-major, row 0 is the northmost.
pub type Snapshot = Vec<Vec<String>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Wall,
    Empty,
    Unknown,
}

/// Read-only view of what is known about the grid.
pub trait GridKnowledge {
    fn grid_size(&self) -> i64;
    fn cell(&self, pos: Pos) -> CellState;
    /// True when at least one cell has been confirmed empty.
    fn any_explored(&self) -> bool;
    fn walls_found(&self) -> usize;
    fn is_scanned(&self, pos: Pos) -> bool;

    fn is_wall(&self, pos: Pos) -> bool {
        self.cell(pos) == CellState::Wall
    }
    fn is_explored(&self, pos: Pos) -> bool {
        self.cell(pos) == CellState::Empty
    }
    fn is_unknown(&self, pos: Pos) -> bool {
        self.cell(pos) == CellState::Unknown
    }
}
