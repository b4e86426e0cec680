#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that merges overlapping runs into connected clusters.

use std::collections::HashSet;

use gem_battle_core::{CellCoord, Cluster, Grid, Run};

/// Flood-fill merger turning runs into clusters that partition the matched
/// cells.
#[derive(Debug, Default)]
pub struct ClusterMerger {
    matched: HashSet<CellCoord>,
    visited: HashSet<CellCoord>,
    worklist: Vec<CellCoord>,
}

impl ClusterMerger {
    /// Creates a new merger with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one cluster per connected component of matched cells to `out`.
    ///
    /// Components are seeded in run order, so identical inputs always yield
    /// identical cluster order.
    pub fn merge(&mut self, grid: &Grid, runs: &[Run], out: &mut Vec<Cluster>) {
        self.matched.clear();
        self.visited.clear();
        self.matched.extend(runs.iter().flat_map(Run::cells));

        for run in runs {
            for seed in run.cells() {
                if self.visited.contains(&seed) {
                    continue;
                }
                let Some(kind) = grid.gem(seed) else {
                    continue;
                };

                let mut cells = Vec::new();
                self.worklist.clear();
                self.worklist.push(seed);
                let _ = self.visited.insert(seed);

                while let Some(cell) = self.worklist.pop() {
                    cells.push(cell);
                    for neighbor in cell.neighbors() {
                        if !self.matched.contains(&neighbor)
                            || self.visited.contains(&neighbor)
                            || grid.gem(neighbor) != Some(kind)
                        {
                            continue;
                        }
                        let _ = self.visited.insert(neighbor);
                        self.worklist.push(neighbor);
                    }
                }

                out.push(Cluster::new(kind, cells));
            }
        }
    }
}
