//! Scripted player used by the `play` command: casts whatever is ready and
//! prefers swaps that complete a run.

use gem_battle_core::{CellCoord, Grid, GRID_COLUMNS, GRID_ROWS};
use gem_battle_system_grid_scanner::GridScanner;
use gem_battle_world::{query, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Offsets of the right, down and both downward diagonal neighbours.
const SWAP_OFFSETS: [(i64, i64); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Deterministic stand-in for a player.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    scanner: GridScanner,
    candidates: Vec<(CellCoord, CellCoord)>,
}

impl Autopilot {
    /// Creates an autopilot whose fallback swaps derive from `seed`.
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
            scanner: GridScanner::new(),
            candidates: Vec::new(),
        }
    }

    /// Slots to invoke before the next swap.
    pub(crate) fn skills_to_cast(&self, world: &World) -> Vec<usize> {
        query::ready_slots(world)
    }

    /// First swap in row-major order that leaves a run on the board, or a
    /// random adjacent swap when none does.
    pub(crate) fn choose_swap(&mut self, grid: &Grid) -> (CellCoord, CellCoord) {
        self.candidates.clear();
        for row in 0..GRID_ROWS as i64 {
            for column in 0..GRID_COLUMNS as i64 {
                for (dc, dr) in SWAP_OFFSETS {
                    let (to_column, to_row) = (column + dc, row + dr);
                    if to_column < 0 || to_row < 0 {
                        continue;
                    }
                    let from = CellCoord::new(column as u32, row as u32);
                    let to = CellCoord::new(to_column as u32, to_row as u32);
                    if to.is_on_board() {
                        self.candidates.push((from, to));
                    }
                }
            }
        }

        for &(from, to) in &self.candidates {
            let mut trial = grid.clone();
            let _ = trial.swap(from, to);
            if self.scanner.has_runs(&trial) {
                return (from, to);
            }
        }

        self.candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or((CellCoord::new(0, 0), CellCoord::new(1, 0)))
    }
}
