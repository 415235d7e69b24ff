use bitvec::prelude::*;
use miette::*;
use tracing::{debug, trace};

use crate::elimination::Strategy;
use crate::grid::{Dims, Row};
use crate::secure_box::Lockbox;
use crate::system::LinearSystem;

/// The toggles chosen for one state, before they touch the box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// `B[idx]` set iff cell `idx` is toggled once
    pub solution: Row,
    pub rank: usize,
    pub free_vars: usize,
    pub consistent: bool,
}

/// What happened to the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// `is_locked()` after the toggles were applied
    pub locked: bool,
    pub toggles: usize,
    pub rank: usize,
    pub free_vars: usize,
    pub consistent: bool,
}

/// Builds and solves `T·B = A` for a flattened state.
///
/// Fails if `state` does not hold exactly `dims.cells()` bits.
#[tracing::instrument(level = "debug", skip(state))]
pub fn plan(dims: Dims, state: &BitSlice<usize, Lsb0>, strategy: Strategy) -> Result<Plan> {
    let elimination = LinearSystem::new(dims, state)?.eliminate();
    Ok(Plan {
        solution: elimination.solution(strategy),
        rank: elimination.rank(),
        free_vars: elimination.free_vars().len(),
        consistent: elimination.is_consistent(),
    })
}

/// Toggles every cell set in `solution` once, in increasing index order.
///
/// Returns the number of toggles applied.
#[tracing::instrument(level = "debug", skip_all)]
pub fn apply_toggles<B: Lockbox + ?Sized>(
    lockbox: &mut B,
    solution: &BitSlice<usize, Lsb0>,
) -> usize {
    let dims = lockbox.dims();
    let mut toggles = 0;
    for idx in solution.iter_ones() {
        let cell = dims.cell(idx);
        trace!(%cell, "toggle");
        lockbox.toggle(cell.row, cell.col);
        toggles += 1;
    }
    toggles
}

/// Reads the box, solves for the toggles, applies them and reports whether
/// the box is still locked.
///
/// Fails only if the box reports a snapshot that does not match its own
/// dimensions. A singular or inconsistent system is not an error; it shows up
/// as `locked` in the outcome.
#[tracing::instrument(skip(lockbox), fields(dims = %lockbox.dims()))]
pub fn open_box<B: Lockbox + ?Sized>(lockbox: &mut B, strategy: Strategy) -> Result<Outcome> {
    let dims = lockbox.dims();
    let snapshot = lockbox.state();
    ensure!(
        Dims::of(&snapshot)? == dims,
        "box snapshot does not match its {dims} dimensions"
    );

    let planned = plan(dims, &dims.flatten(&snapshot), strategy)?;
    let toggles = apply_toggles(lockbox, &planned.solution);
    let locked = lockbox.is_locked();
    debug!(toggles, locked, "applied solution");

    Ok(Outcome {
        locked,
        toggles,
        rank: planned.rank,
        free_vars: planned.free_vars,
        consistent: planned.consistent,
    })
}
