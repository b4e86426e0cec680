//! Board geometry shared by every system: gem kinds, cell coordinates, the
//! fixed-size grid, matched runs, merged clusters and fall plans.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows laid out on the board.
pub const GRID_ROWS: usize = 5;

/// Number of columns laid out on the board.
pub const GRID_COLUMNS: usize = 6;

/// Minimum count of consecutive identical gems that forms a run.
pub const MIN_RUN_LENGTH: usize = 3;

const EMPTY_GLYPH: char = '.';

/// Closed set of gem kinds, doubling as the elements units fight with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GemKind {
    /// Fire gems and fire-aligned units.
    Fire,
    /// Water gems and water-aligned units.
    Water,
    /// Wind gems and wind-aligned units.
    Wind,
    /// Earth gems and earth-aligned units.
    Earth,
    /// Life gems; matching them heals the party instead of attacking.
    Life,
}

impl GemKind {
    /// Every gem kind in canonical resolution order.
    pub const ALL: [Self; 5] = [Self::Fire, Self::Water, Self::Wind, Self::Earth, Self::Life];

    /// Element this kind is strong against on the affinity wheel.
    ///
    /// Life sits outside the wheel and beats nothing.
    #[must_use]
    pub const fn beats(self) -> Option<Self> {
        match self {
            Self::Fire => Some(Self::Wind),
            Self::Wind => Some(Self::Earth),
            Self::Earth => Some(Self::Water),
            Self::Water => Some(Self::Fire),
            Self::Life => None,
        }
    }

    /// Single-character glyph used by the textual board notation.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Fire => '$',
            Self::Water => '~',
            Self::Wind => '@',
            Self::Earth => '#',
            Self::Life => '&',
        }
    }

    /// Parses a glyph produced by [`GemKind::glyph`].
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '$' => Some(Self::Fire),
            '~' => Some(Self::Water),
            '@' => Some(Self::Wind),
            '#' => Some(Self::Earth),
            '&' => Some(Self::Life),
            _ => None,
        }
    }

    /// Human-readable name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fire => "Fire",
            Self::Water => "Water",
            Self::Wind => "Wind",
            Self::Earth => "Earth",
            Self::Life => "Life",
        }
    }

    /// Dense index in `0..5`, matching the position in [`GemKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Fire => 0,
            Self::Water => 1,
            Self::Wind => 2,
            Self::Earth => 3,
            Self::Life => 4,
        }
    }
}

impl fmt::Display for GemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location of a single board cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell, counted from the top.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the coordinate lies on the fixed board.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        (self.column as usize) < GRID_COLUMNS && (self.row as usize) < GRID_ROWS
    }

    /// Computes the Chebyshev distance, the larger of the two axis deltas.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Orthogonal neighbours of the cell that lie on the board.
    pub fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        let CellCoord { column, row } = self;
        [
            column.checked_sub(1).map(|left| CellCoord::new(left, row)),
            Some(CellCoord::new(column + 1, row)),
            row.checked_sub(1).map(|up| CellCoord::new(column, up)),
            Some(CellCoord::new(column, row + 1)),
        ]
        .into_iter()
        .flatten()
        .filter(CellCoord::is_on_board)
    }
}

/// Fixed five-by-six board of gems.
///
/// Cells hold `None` only while a cascade is clearing them; the coordinator
/// refills the board before control returns to the player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: [[Option<GemKind>; GRID_COLUMNS]; GRID_ROWS],
}

impl Grid {
    /// Creates a board with every cell cleared.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rows: [[None; GRID_COLUMNS]; GRID_ROWS],
        }
    }

    /// Creates a fully populated board from explicit rows, top row first.
    #[must_use]
    pub fn from_rows(rows: [[GemKind; GRID_COLUMNS]; GRID_ROWS]) -> Self {
        Self::from_fn(|cell| rows[cell.row() as usize][cell.column() as usize])
    }

    /// Creates a fully populated board by querying `gem_at` for every cell in
    /// row-major order.
    #[must_use]
    pub fn from_fn(mut gem_at: impl FnMut(CellCoord) -> GemKind) -> Self {
        let mut grid = Self::empty();
        for (row_index, row) in grid.rows.iter_mut().enumerate() {
            for (column_index, slot) in row.iter_mut().enumerate() {
                *slot = Some(gem_at(CellCoord::new(column_index as u32, row_index as u32)));
            }
        }
        grid
    }

    /// Gem occupying the cell, or `None` when cleared or off the board.
    #[must_use]
    pub fn gem(&self, cell: CellCoord) -> Option<GemKind> {
        self.slot(cell).copied().flatten()
    }

    /// Places a gem into the cell. Off-board coordinates are ignored.
    pub fn set(&mut self, cell: CellCoord, kind: GemKind) {
        if let Some(slot) = self.slot_mut(cell) {
            *slot = Some(kind);
        }
    }

    /// Clears the cell, returning the gem it held.
    pub fn clear(&mut self, cell: CellCoord) -> Option<GemKind> {
        self.slot_mut(cell).and_then(Option::take)
    }

    /// Exchanges the contents of two cells. Returns `false` when either cell
    /// lies off the board.
    pub fn swap(&mut self, first: CellCoord, second: CellCoord) -> bool {
        if !first.is_on_board() || !second.is_on_board() {
            return false;
        }
        let held = self.rows[first.row() as usize][first.column() as usize];
        self.rows[first.row() as usize][first.column() as usize] =
            self.rows[second.row() as usize][second.column() as usize];
        self.rows[second.row() as usize][second.column() as usize] = held;
        true
    }

    /// Cells of a single row, left to right.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[Option<GemKind>; GRID_COLUMNS]> {
        self.rows.get(row)
    }

    /// Cells of a single column, top to bottom.
    #[must_use]
    pub fn column(&self, column: usize) -> Option<[Option<GemKind>; GRID_ROWS]> {
        if column >= GRID_COLUMNS {
            return None;
        }
        let mut cells = [None; GRID_ROWS];
        for (slot, row) in cells.iter_mut().zip(self.rows.iter()) {
            *slot = row[column];
        }
        Some(cells)
    }

    /// Iterator over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, Option<GemKind>)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row_index, row)| {
            row.iter().enumerate().map(move |(column_index, slot)| {
                (CellCoord::new(column_index as u32, row_index as u32), *slot)
            })
        })
    }

    /// Reports whether every cell holds a gem.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_some)
    }

    fn slot(&self, cell: CellCoord) -> Option<&Option<GemKind>> {
        self.rows
            .get(cell.row() as usize)
            .and_then(|row| row.get(cell.column() as usize))
    }

    fn slot_mut(&mut self, cell: CellCoord) -> Option<&mut Option<GemKind>> {
        self.rows
            .get_mut(cell.row() as usize)
            .and_then(|row| row.get_mut(cell.column() as usize))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for slot in row {
                let glyph = slot.map_or(EMPTY_GLYPH, GemKind::glyph);
                write!(f, "{glyph}")?;
            }
        }
        Ok(())
    }
}

/// Reasons the textual board notation may fail to parse.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    /// The notation did not contain exactly [`GRID_ROWS`] rows.
    #[error("expected {GRID_ROWS} rows, found {found}")]
    RowCount {
        /// Number of rows present in the input.
        found: usize,
    },
    /// A row did not contain exactly [`GRID_COLUMNS`] cells.
    #[error("row {row} has {found} cells, expected {GRID_COLUMNS}")]
    RowLength {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of cells present in the row.
        found: usize,
    },
    /// A cell used a glyph that names no gem kind.
    #[error("unknown glyph `{glyph}` at row {row}, column {column}")]
    UnknownGlyph {
        /// Zero-based row of the glyph.
        row: usize,
        /// Zero-based column of the glyph.
        column: usize,
        /// The unrecognised character.
        glyph: char,
    },
}

impl FromStr for Grid {
    type Err = GridParseError;

    /// Parses whitespace-separated rows of glyphs, `.` marking a cleared cell.
    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = notation.split_whitespace().collect();
        if rows.len() != GRID_ROWS {
            return Err(GridParseError::RowCount { found: rows.len() });
        }

        let mut grid = Self::empty();
        for (row_index, text) in rows.into_iter().enumerate() {
            let glyphs: Vec<char> = text.chars().collect();
            if glyphs.len() != GRID_COLUMNS {
                return Err(GridParseError::RowLength {
                    row: row_index,
                    found: glyphs.len(),
                });
            }
            for (column_index, glyph) in glyphs.into_iter().enumerate() {
                if glyph == EMPTY_GLYPH {
                    continue;
                }
                let kind = GemKind::from_glyph(glyph).ok_or(GridParseError::UnknownGlyph {
                    row: row_index,
                    column: column_index,
                    glyph,
                })?;
                grid.rows[row_index][column_index] = Some(kind);
            }
        }
        Ok(grid)
    }
}

/// Axis along which a run was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal run inside a single row.
    Row,
    /// Vertical run inside a single column.
    Column,
}

/// Straight sequence of at least [`MIN_RUN_LENGTH`] identical gems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    /// Axis the run extends along.
    pub axis: Axis,
    /// Row index for horizontal runs, column index for vertical runs.
    pub index: u32,
    /// Offset of the first cell along the axis.
    pub start: u32,
    /// Number of consecutive cells covered by the run.
    pub length: u32,
    /// Gem kind shared by every cell of the run.
    pub kind: GemKind,
}

impl Run {
    /// Cells covered by the run in increasing offset order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let run = *self;
        (run.start..run.start + run.length).map(move |offset| match run.axis {
            Axis::Row => CellCoord::new(offset, run.index),
            Axis::Column => CellCoord::new(run.index, offset),
        })
    }
}

/// Connected set of matched cells sharing one gem kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cluster {
    kind: GemKind,
    cells: Vec<CellCoord>,
}

impl Cluster {
    /// Creates a cluster; cells are stored sorted and deduplicated.
    #[must_use]
    pub fn new(kind: GemKind, mut cells: Vec<CellCoord>) -> Self {
        cells.sort_unstable();
        cells.dedup();
        Self { kind, cells }
    }

    /// Gem kind shared by the cluster.
    #[must_use]
    pub const fn kind(&self) -> GemKind {
        self.kind
    }

    /// Member cells in sorted order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of member cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the cell belongs to the cluster.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }
}

/// Movement of a single gem during a refill, consumed by presentation layers
/// that animate falling gems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemFall {
    /// Kind of the falling gem.
    pub kind: GemKind,
    /// Column the gem travels in.
    pub column: u32,
    /// Row the gem starts from; negative rows lie above the board and mark
    /// freshly spawned gems.
    pub origin_row: i32,
    /// Row the gem comes to rest in.
    pub destination_row: u32,
    /// Indicates whether the gem was generated to fill a vacated cell.
    pub spawned: bool,
}

impl GemFall {
    /// Number of rows travelled.
    #[must_use]
    pub fn distance(&self) -> u32 {
        (i64::from(self.destination_row) - i64::from(self.origin_row)).unsigned_abs() as u32
    }
}

/// Complete before/after mapping produced by one refill.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FallPlan {
    falls: Vec<GemFall>,
}

impl FallPlan {
    /// Creates a plan from the provided movements.
    #[must_use]
    pub fn from_falls(falls: Vec<GemFall>) -> Self {
        Self { falls }
    }

    /// Iterator over every movement in the plan.
    pub fn iter(&self) -> impl Iterator<Item = &GemFall> {
        self.falls.iter()
    }

    /// Movements of gems generated to fill vacated cells.
    pub fn spawned(&self) -> impl Iterator<Item = &GemFall> {
        self.falls.iter().filter(|fall| fall.spawned)
    }

    /// Number of movements in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.falls.len()
    }

    /// Reports whether the plan moves nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.falls.is_empty()
    }
}
