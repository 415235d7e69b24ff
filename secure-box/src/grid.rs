use std::fmt;

use bitvec::prelude::*;
use chumsky::prelude::*;
use itertools::Itertools;
use miette::*;

/// A bit vector backed by `usize` words with Least Significant Bit first ordering.
/// Sized at runtime, so there is no ceiling on the number of cells.
pub type Row = BitVec<usize, Lsb0>;

/// A full copy of a box's cells, indexed as `snapshot[row][col]`.
/// `true` = locked, `false` = unlocked.
pub type Snapshot = Vec<Vec<bool>>;

/// A position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid dimensions, fixed for the lifetime of one solve.
///
/// Cells are linearised row-major: `index = row * cols + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        ensure!(
            rows > 0 && cols > 0,
            "grid dimensions must be positive, got {rows}x{cols}"
        );
        Ok(Self { rows, cols })
    }

    /// Reads the dimensions off a snapshot, rejecting empty and ragged grids.
    pub fn of(snapshot: &[Vec<bool>]) -> Result<Self> {
        let rows = snapshot.len();
        let cols = snapshot.first().map(Vec::len).unwrap_or(0);
        if let Some((r, row)) = snapshot.iter().find_position(|row| row.len() != cols) {
            bail!(
                "ragged grid: row {r} has {} cells, expected {cols}",
                row.len()
            );
        }
        Self::new(rows, cols)
    }

    /// Total number of cells (`n` in the linear system).
    pub const fn cells(self) -> usize {
        self.rows * self.cols
    }

    pub const fn index(self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    pub const fn cell(self, index: usize) -> Cell {
        Cell::new(index / self.cols, index % self.cols)
    }

    /// Flattens a snapshot into a bit row using the same row-major indexing.
    pub fn flatten(self, snapshot: &[Vec<bool>]) -> Row {
        debug_assert_eq!(snapshot.len(), self.rows);
        snapshot.iter().flatten().copied().collect()
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Parses a diagram where `#` is a locked cell and `.` an unlocked one.
fn parser<'a>() -> impl Parser<'a, &'a str, Snapshot, extra::Err<Rich<'a, char>>> {
    let cell = just('#').to(true).or(just('.').to(false));

    cell.repeated()
        .collect::<Vec<_>>()
        .separated_by(text::newline())
        .allow_trailing()
        .collect::<Vec<_>>()
        .map(|rows| {
            // Trailing newlines produce empty rows
            rows.into_iter()
                .filter(|r: &Vec<bool>| !r.is_empty())
                .collect::<Snapshot>()
        })
}

#[tracing::instrument(skip(input))]
pub fn parse_diagram(input: &str) -> Result<Snapshot> {
    let snapshot = parser()
        .parse(input.trim())
        .into_result()
        .map_err(|e| miette!("Parse failed: {:?}", e))?;

    Dims::of(&snapshot)?;
    Ok(snapshot)
}

/// Renders a snapshot back into the `#`/`.` diagram format.
pub fn render(snapshot: &[Vec<bool>]) -> String {
    snapshot
        .iter()
        .map(|row| {
            row.iter()
                .map(|&locked| if locked { '#' } else { '.' })
                .collect::<String>()
        })
        .join("\n")
}
