//! # Knowledge Store
//!
//! What a session has learned about the hidden grid: confirmed walls,
//! confirmed empty cells and the raw snapshots taken at each position.
//! Walls and explored cells are kept disjoint.

use std::collections::{BTreeSet, HashMap};

use crate::grid::{CellState, GridKnowledge, Pos, Snapshot};

#[derive(Clone, Debug)]
pub struct Knowledge {
    grid_size: i64,
    walls: BTreeSet<Pos>,
    explored: BTreeSet<Pos>,
    scans: HashMap<Pos, Snapshot>,
}

impl Knowledge {
    pub fn new(grid_size: i64) -> Self {
        Self {
            grid_size,
            walls: BTreeSet::new(),
            explored: BTreeSet::new(),
            scans: HashMap::new(),
        }
    }

    /// Records a wall. Returns `true` if it was not known before.
    /// Out-of-grid cells are ignored.
    pub fn mark_wall(&mut self, pos: Pos) -> bool {
        if !pos.in_bounds(self.grid_size) {
            return false;
        }
        self.explored.remove(&pos);
        self.walls.insert(pos)
    }

    /// Records an empty cell reported by a sensor. A known wall wins.
    pub fn mark_explored(&mut self, pos: Pos) -> bool {
        if !pos.in_bounds(self.grid_size) || self.walls.contains(&pos) {
            return false;
        }
        self.explored.insert(pos)
    }

    /// Records a cell an agent is standing on. Agents never stand on walls,
    /// so this overrides an earlier wall report.
    pub fn mark_occupied(&mut self, pos: Pos) -> bool {
        if !pos.in_bounds(self.grid_size) {
            return false;
        }
        self.walls.remove(&pos);
        self.explored.insert(pos)
    }

    pub fn cache_scan(&mut self, pos: Pos, snapshot: Snapshot) {
        self.scans.insert(pos, snapshot);
    }

    pub fn scan_at(&self, pos: Pos) -> Option<&Snapshot> {
        self.scans.get(&pos)
    }

    pub fn walls(&self) -> &BTreeSet<Pos> {
        &self.walls
    }

    pub fn explored(&self) -> &BTreeSet<Pos> {
        &self.explored
    }

    pub fn num_walls(&self) -> usize {
        self.walls.len()
    }

    pub fn num_explored(&self) -> usize {
        self.explored.len()
    }

    pub fn num_scans(&self) -> usize {
        self.scans.len()
    }

    /// Discovered walls in submission format, ordered by `(x, y)`.
    pub fn submission(&self) -> Vec<String> {
        self.walls.iter().map(Pos::to_string).collect()
    }
}

impl GridKnowledge for Knowledge {
    fn grid_size(&self) -> i64 {
        self.grid_size
    }

    fn cell(&self, pos: Pos) -> CellState {
        if self.walls.contains(&pos) {
            CellState::Wall
        } else if self.explored.contains(&pos) {
            CellState::Empty
        } else {
            CellState::Unknown
        }
    }

    fn any_explored(&self) -> bool {
        !self.explored.is_empty()
    }

    fn walls_found(&self) -> usize {
        self.walls.len()
    }

    fn is_scanned(&self, pos: Pos) -> bool {
        self.scans.contains_key(&pos)
    }
}
