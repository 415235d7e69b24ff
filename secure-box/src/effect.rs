//! Which cells a toggle flips.
//!
//! Toggling `(r, c)` flips every cell in row `r` and every cell in column `c`.
//! The cell itself sits in both and is flipped exactly once.

use itertools::Itertools;

use crate::grid::{Cell, Dims, Row};

/// Indices of the cells flipped by toggling `cell`, in increasing order.
///
/// Always yields `rows + cols - 1` indices.
pub fn affected_cells(cell: Cell, dims: Dims) -> impl Iterator<Item = usize> {
    let row = (0..dims.cols).map(move |c| dims.index(Cell::new(cell.row, c)));
    let col = (0..dims.rows)
        .filter(move |&r| r != cell.row)
        .map(move |r| dims.index(Cell::new(r, cell.col)));

    row.merge(col)
}

/// The same set as [`affected_cells`], as a bit row of length `dims.cells()`.
pub fn toggle_mask(cell: Cell, dims: Dims) -> Row {
    let mut mask = Row::repeat(false, dims.cells());
    for idx in affected_cells(cell, dims) {
        mask.set(idx, true);
    }
    mask
}
