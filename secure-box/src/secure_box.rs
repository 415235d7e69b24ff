use std::fmt;

use miette::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{render, Dims, Snapshot};

/// Upper bound (exclusive) on the number of random toggles in a shuffle.
pub const SHUFFLE_TOGGLES: u32 = 1000;

/// The public surface of a box: the only operations a solver may use.
pub trait Lockbox {
    fn dims(&self) -> Dims;

    /// Flips the cell at `(row, col)`, every cell in its row and every cell
    /// in its column. The cell itself flips once.
    fn toggle(&mut self, row: usize, col: usize);

    /// A copy of the current grid.
    fn state(&self) -> Snapshot;

    /// `true` if any cell is still locked.
    fn is_locked(&self) -> bool;
}

/// A boolean grid shuffled into a locked state by random toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureBox {
    cells: Snapshot,
    dims: Dims,
}

impl SecureBox {
    /// Creates an unlocked `rows x cols` box and shuffles it with `rng`.
    pub fn new<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Result<Self> {
        let dims = Dims::new(rows, cols)?;
        let mut secure_box = Self {
            cells: vec![vec![false; cols]; rows],
            dims,
        };
        secure_box.shuffle(rng);
        Ok(secure_box)
    }

    /// Same seed, same shuffle.
    pub fn seeded(rows: usize, cols: usize, seed: u64) -> Result<Self> {
        Self::new(rows, cols, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(rows: usize, cols: usize) -> Result<Self> {
        Self::new(rows, cols, &mut rand::rng())
    }

    /// Wraps an explicit grid without shuffling it.
    pub fn from_state(cells: Snapshot) -> Result<Self> {
        let dims = Dims::of(&cells)?;
        Ok(Self { cells, dims })
    }

    #[tracing::instrument(level = "debug", skip_all, fields(dims = %self.dims))]
    fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let toggles = rng.random_range(0..SHUFFLE_TOGGLES);
        for _ in 0..toggles {
            let row = rng.random_range(0..self.dims.rows);
            let col = rng.random_range(0..self.dims.cols);
            self.toggle(row, col);
        }
        tracing::debug!(toggles, "shuffled");
    }
}

impl Lockbox for SecureBox {
    fn dims(&self) -> Dims {
        self.dims
    }

    fn toggle(&mut self, row: usize, col: usize) {
        self.cells[row][col] = !self.cells[row][col];
        for cell in self.cells[row].iter_mut() {
            *cell = !*cell;
        }
        for line in self.cells.iter_mut() {
            line[col] = !line[col];
        }
    }

    fn state(&self) -> Snapshot {
        self.cells.clone()
    }

    fn is_locked(&self) -> bool {
        self.cells.iter().flatten().any(|&locked| locked)
    }
}

impl fmt::Display for SecureBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.cells))
    }
}
