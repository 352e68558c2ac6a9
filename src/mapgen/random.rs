//! # Random Map Generation
//!
//! Generates hidden Fog of Wall layouts for the local judge: a set of walls
//! and starting positions for the crows, never overlapping.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

use crate::grid::Pos;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub grid_size: i64,
    pub walls: BTreeSet<Pos>,
    pub crows: Vec<Pos>,
}

/// Generates a random layout.
///
/// # Arguments
/// * `grid_size` - Side length of the square grid.
/// * `num_walls` - Number of walls; capped so every crow still fits.
/// * `num_crows` - Number of crows, at least one.
/// * `seed` - An optional seed for the random number generator for reproducibility.
pub fn generate(grid_size: i64, num_walls: usize, num_crows: usize, seed: Option<u64>) -> Layout {
    let mut rng = match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_os_rng(),
    };

    // Shuffle every cell once; walls and crows are drawn from disjoint slices.
    let mut cells: Vec<Pos> = (0..grid_size)
        .flat_map(|y| (0..grid_size).map(move |x| Pos::new(x, y)))
        .collect();
    cells.shuffle(&mut rng);

    let num_crows = num_crows.clamp(1, cells.len());
    let num_walls = num_walls.min(cells.len() - num_crows);
    let walls = cells[..num_walls].iter().copied().collect();
    let crows = cells[num_walls..num_walls + num_crows].to_vec();
    Layout {
        grid_size,
        walls,
        crows,
    }
}
