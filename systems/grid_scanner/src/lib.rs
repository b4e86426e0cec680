#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that finds axis-aligned runs of identical gems.

use gem_battle_core::{Axis, GemKind, Grid, Run, GRID_COLUMNS, GRID_ROWS, MIN_RUN_LENGTH};

/// Scanner that reports every run of at least [`MIN_RUN_LENGTH`] gems.
#[derive(Debug, Default)]
pub struct GridScanner {
    line: Vec<Option<GemKind>>,
}

impl GridScanner {
    /// Creates a new scanner with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every run on the board to `out`, rows first (top to bottom)
    /// and then columns (left to right).
    pub fn scan(&mut self, grid: &Grid, out: &mut Vec<Run>) {
        for row in 0..GRID_ROWS {
            self.line.clear();
            if let Some(cells) = grid.row(row) {
                self.line.extend_from_slice(cells);
            }
            collect_runs(&self.line, Axis::Row, row as u32, out);
        }

        for column in 0..GRID_COLUMNS {
            self.line.clear();
            if let Some(cells) = grid.column(column) {
                self.line.extend_from_slice(&cells);
            }
            collect_runs(&self.line, Axis::Column, column as u32, out);
        }
    }

    /// Reports whether the board holds at least one run.
    #[must_use]
    pub fn has_runs(&mut self, grid: &Grid) -> bool {
        let mut runs = Vec::new();
        self.scan(grid, &mut runs);
        !runs.is_empty()
    }
}

fn collect_runs(line: &[Option<GemKind>], axis: Axis, index: u32, out: &mut Vec<Run>) {
    let mut start = 0;
    while start < line.len() {
        let Some(kind) = line[start] else {
            start += 1;
            continue;
        };

        let mut end = start + 1;
        while end < line.len() && line[end] == Some(kind) {
            end += 1;
        }

        let length = end - start;
        if length >= MIN_RUN_LENGTH {
            out.push(Run {
                axis,
                index,
                start: start as u32,
                length: length as u32,
                kind,
            });
        }
        start = end;
    }
}
