#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that compacts columns after clearing and refills vacated
//! cells from a validated spawn pool.

use gem_battle_core::{
    CellCoord, ConfigurationError, FallPlan, GemFall, GemKind, Grid, GRID_COLUMNS, GRID_ROWS,
};
use rand::Rng;

/// Gem kinds new gems are drawn from, with at least two distinct kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnPool {
    first: GemKind,
    rest: Vec<GemKind>,
}

impl SpawnPool {
    /// Validates the pool. Duplicate entries weight the draw.
    pub fn new(kinds: Vec<GemKind>) -> Result<Self, ConfigurationError> {
        let Some((&first, rest)) = kinds.split_first() else {
            return Err(ConfigurationError::EmptySpawnPool);
        };
        if rest.iter().all(|&kind| kind == first) {
            return Err(ConfigurationError::DegenerateSpawnPool { kind: first });
        }
        Ok(Self {
            first,
            rest: rest.to_vec(),
        })
    }

    /// Pool containing every gem kind once.
    #[must_use]
    pub fn uniform() -> Self {
        let [first, rest @ ..] = GemKind::ALL;
        Self {
            first,
            rest: rest.to_vec(),
        }
    }

    /// Kinds in the pool, in configuration order.
    pub fn kinds(&self) -> impl Iterator<Item = GemKind> + '_ {
        std::iter::once(self.first).chain(self.rest.iter().copied())
    }

    /// Number of entries in the pool, duplicates included.
    fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Draws one entry uniformly from the pool.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> GemKind {
        let index = rng.gen_range(0..self.len() as u32) as usize;
        match index.checked_sub(1) {
            None => self.first,
            Some(offset) => self.rest[offset],
        }
    }

    /// Fills a whole board from the pool.
    pub fn fill<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        Grid::from_fn(|_| self.pick(rng))
    }
}

impl Default for SpawnPool {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Gravity system that settles every column and reports the movement.
#[derive(Debug, Default)]
pub struct Gravity {
    survivors: Vec<(u32, GemKind)>,
}

impl Gravity {
    /// Creates a new gravity system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles the board so that no cell is empty.
    ///
    /// Surviving gems keep their relative order and sink to the bottom of
    /// their column; vacated top cells are filled with kinds drawn from
    /// `pool`. The returned plan lists one movement per cell of every column
    /// that had a gap; untouched columns are omitted.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        pool: &SpawnPool,
        rng: &mut R,
    ) -> FallPlan {
        let mut falls = Vec::new();

        for column in 0..GRID_COLUMNS as u32 {
            self.survivors.clear();
            for row in 0..GRID_ROWS as u32 {
                if let Some(kind) = grid.gem(CellCoord::new(column, row)) {
                    self.survivors.push((row, kind));
                }
            }

            let missing = GRID_ROWS - self.survivors.len();
            if missing == 0 {
                continue;
            }

            for row in 0..missing as u32 {
                let kind = pool.pick(rng);
                grid.set(CellCoord::new(column, row), kind);
                falls.push(GemFall {
                    kind,
                    column,
                    origin_row: row as i32 - missing as i32,
                    destination_row: row,
                    spawned: true,
                });
            }

            for (offset, &(origin, kind)) in self.survivors.iter().enumerate() {
                let destination = (missing + offset) as u32;
                grid.set(CellCoord::new(column, destination), kind);
                falls.push(GemFall {
                    kind,
                    column,
                    origin_row: origin as i32,
                    destination_row: destination,
                    spawned: false,
                });
            }
        }

        FallPlan::from_falls(falls)
    }
}
