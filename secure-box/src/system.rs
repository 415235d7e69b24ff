use bitvec::prelude::*;
use miette::*;

use crate::effect::toggle_mask;
use crate::grid::{Dims, Row, Snapshot};

/// The toggle problem for one box as a linear system `T·B = A` over GF(2).
///
/// Row `i` of `T` is the toggle mask of cell `i`, which is also the set of
/// toggles that flip cell `i` since the row/column relation is symmetric.
/// `A` is the box's flattened state and `B` the set of cells to toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearSystem {
    /// Augmented matrix [T | A], `n` rows of `n + 1` bits
    pub(crate) matrix: Vec<Row>,
    pub(crate) dims: Dims,
}

impl LinearSystem {
    /// Builds the system for a flattened state of length `dims.cells()`.
    #[tracing::instrument(level = "debug", skip(state))]
    pub fn new(dims: Dims, state: &BitSlice<usize, Lsb0>) -> Result<Self> {
        let n = dims.cells();
        ensure!(
            state.len() == n,
            "state has {} cells, a {dims} box has {n}",
            state.len()
        );

        let matrix = (0..n)
            .map(|idx| {
                let mut row = toggle_mask(dims.cell(idx), dims);
                // Augmented column holds the target bit
                row.push(state[idx]);
                row
            })
            .collect();

        Ok(Self { matrix, dims })
    }

    /// Builds the system straight from a box snapshot.
    pub fn from_state(snapshot: &Snapshot) -> Result<Self> {
        let dims = Dims::of(snapshot)?;
        Self::new(dims, &dims.flatten(snapshot))
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Number of unknowns (and equations), one per cell.
    pub fn len(&self) -> usize {
        self.dims.cells()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `T[i][j]`: whether toggling cell `j` flips cell `i`.
    pub fn coefficient(&self, i: usize, j: usize) -> bool {
        self.matrix[i][j]
    }

    /// Row `i` of `T`, without the augmented column.
    pub fn coefficients(&self, i: usize) -> &BitSlice<usize, Lsb0> {
        &self.matrix[i][..self.len()]
    }

    /// The target vector `A`.
    pub fn target(&self) -> Row {
        let n = self.len();
        self.matrix.iter().map(|row| row[n]).collect()
    }
}
