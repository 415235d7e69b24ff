use tracing::{debug, warn};

use crate::grid::{Dims, Row};
use crate::system::LinearSystem;

/// Null spaces larger than `2^MAX_ENUMERATED_FREE_VARS` are not searched
/// for a minimum-weight solution.
pub const MAX_ENUMERATED_FREE_VARS: usize = 20;

/// How free variables are chosen when the system is singular.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Every free variable is left at zero (not toggled).
    #[default]
    Particular,
    /// Search the null space for the solution with the fewest toggles.
    Minimal,
}

/// A system in Reduced Row Echelon Form.
#[derive(Debug, Clone)]
pub struct Elimination {
    /// Augmented matrix [T | A] after full reduction
    matrix: Vec<Row>,
    dims: Dims,
    /// Maps column index (variable) to pivot row index
    col_to_pivot: Vec<Option<usize>>,
    /// Indices of free variables (columns without pivots)
    free_vars: Vec<usize>,
    rank: usize,
    consistent: bool,
}

impl LinearSystem {
    /// Performs Gaussian Elimination over GF(2), consuming the system.
    ///
    /// Each pivot row is XORed into every other row holding a 1 in its
    /// column, above and below, so no back-substitution pass is needed.
    #[tracing::instrument(level = "debug", skip(self), fields(dims = %self.dims))]
    pub fn eliminate(self) -> Elimination {
        let LinearSystem { mut matrix, dims } = self;
        let n = dims.cells();

        let mut col_to_pivot = vec![None; n];
        let mut free_vars = Vec::new();
        let mut pivot_row = 0;

        for c in 0..n {
            if pivot_row >= n {
                free_vars.push(c);
                continue;
            }

            let Some(r) = (pivot_row..n).find(|&r| matrix[r][c]) else {
                free_vars.push(c);
                continue;
            };

            matrix.swap(pivot_row, r);
            col_to_pivot[c] = Some(pivot_row);

            // Owned copy, the loop below borrows every row mutably
            let pivot_vec = matrix[pivot_row].clone();

            for (i, row) in matrix.iter_mut().enumerate() {
                if i != pivot_row && row[c] {
                    *row ^= &pivot_vec;
                }
            }
            pivot_row += 1;
        }

        // A zero row with its augmented bit set reads 0 = 1
        let consistent = matrix[pivot_row..].iter().all(|row| !row[n]);

        debug!(rank = pivot_row, free = free_vars.len(), consistent);
        if !consistent {
            warn!(%dims, "state is not reachable by toggles, solution will leave cells locked");
        }

        Elimination {
            matrix,
            dims,
            col_to_pivot,
            free_vars,
            rank: pivot_row,
            consistent,
        }
    }
}

impl Elimination {
    /// Number of pivots.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn free_vars(&self) -> &[usize] {
        &self.free_vars
    }

    /// Whether `T·B = A` has any solution at all.
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Solution with every free variable set to 0.
    ///
    /// In RREF the pivot variables simply take the value of the augmented
    /// column. For an inconsistent system this is still returned as a best
    /// effort.
    pub fn particular_solution(&self) -> Row {
        let n = self.dims.cells();
        let mut x_p = Row::repeat(false, n);
        for (c, pivot) in self.col_to_pivot.iter().enumerate() {
            if let Some(r) = *pivot {
                x_p.set(c, self.matrix[r][n]);
            }
        }
        x_p
    }

    /// One toggle set per free variable, each leaving every cell unchanged.
    ///
    /// For free variable `f` the vector sets `x_f = 1`, other free variables
    /// to 0, and each pivot variable to the coefficient of `f` in its row.
    pub fn null_space_basis(&self) -> Vec<Row> {
        let n = self.dims.cells();
        self.free_vars
            .iter()
            .map(|&f| {
                let mut v = Row::repeat(false, n);
                v.set(f, true);
                for (c, pivot) in self.col_to_pivot.iter().enumerate() {
                    if let Some(r) = *pivot {
                        v.set(c, self.matrix[r][f]);
                    }
                }
                v
            })
            .collect()
    }

    /// The solution with the fewest toggles, or `None` if the null space is
    /// too large to enumerate.
    ///
    /// Walks the null space in Gray code order: the bit that changes between
    /// gray(i-1) and gray(i) is the lowest set bit of `i`, so each step is a
    /// single XOR with one basis vector.
    pub fn minimum_weight_solution(&self) -> Option<Row> {
        let null_basis = self.null_space_basis();
        let k = null_basis.len();
        if k > MAX_ENUMERATED_FREE_VARS {
            return None;
        }

        let mut current = self.particular_solution();
        let mut best = current.clone();
        let mut min_weight = best.count_ones();

        let num_combinations: usize = 1 << k;
        for i in 1..num_combinations {
            let basis_idx = i.trailing_zeros() as usize;
            current ^= &null_basis[basis_idx];

            let weight = current.count_ones();
            if weight < min_weight {
                min_weight = weight;
                best.copy_from_bitslice(&current);
            }
        }

        Some(best)
    }

    /// The toggle set `B` to apply, chosen by `strategy`.
    pub fn solution(&self, strategy: Strategy) -> Row {
        match strategy {
            Strategy::Particular => self.particular_solution(),
            Strategy::Minimal => self.minimum_weight_solution().unwrap_or_else(|| {
                warn!(
                    free = self.free_vars.len(),
                    limit = MAX_ENUMERATED_FREE_VARS,
                    "too many free variables to minimise, using particular solution"
                );
                self.particular_solution()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bitvec::prelude::*;
    use crate::effect::toggle_mask;
    use crate::grid::parse_diagram;
    use miette::Result;
    use rstest::rstest;

    /// `T·x` computed by XORing the toggle masks of the set bits of `x`.
    fn apply(dims: Dims, x: &BitSlice<usize, Lsb0>) -> Row {
        let mut out = Row::repeat(false, dims.cells());
        for idx in x.iter_ones() {
            out ^= &toggle_mask(dims.cell(idx), dims);
        }
        out
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(1, 5, 1)]
    #[case(4, 1, 1)]
    #[case(2, 2, 4)]
    #[case(2, 3, 5)]
    #[case(3, 3, 5)]
    #[case(4, 4, 16)]
    #[case(4, 5, 17)]
    #[case(5, 5, 17)]
    fn rank_of_toggle_matrix(
        #[case] rows: usize,
        #[case] cols: usize,
        #[case] rank: usize,
    ) -> Result<()> {
        let dims = Dims { rows, cols };
        let elim = LinearSystem::new(dims, &Row::repeat(false, dims.cells()))?.eliminate();
        assert_eq!(elim.rank(), rank);
        assert_eq!(elim.free_vars().len(), dims.cells() - rank);
        assert!(elim.is_consistent());
        Ok(())
    }

    #[test]
    fn two_by_two_single_corner() -> Result<()> {
        let system = LinearSystem::from_state(&parse_diagram("#.\n..")?)?;
        let elim = system.eliminate();
        assert!(elim.is_consistent());
        assert!(elim.free_vars().is_empty());
        // (0,0), (0,1) and (1,0): cell 0 flips three times, the rest twice
        assert_eq!(
            elim.particular_solution(),
            bitvec![usize, Lsb0; 1, 1, 1, 0]
        );
        Ok(())
    }

    #[rstest]
    #[case("#")]
    #[case("###")]
    #[case("#\n#\n#\n#")]
    #[case("###\n#..\n#..")]
    #[case(".#.#\n####\n.#.#\n.#.#")]
    fn solutions_reproduce_target(#[case] diagram: &str) -> Result<()> {
        let system = LinearSystem::from_state(&parse_diagram(diagram)?)?;
        let target = system.target();
        let dims = system.dims();
        let elim = system.eliminate();
        assert!(elim.is_consistent());

        let particular = elim.particular_solution();
        assert_eq!(apply(dims, &particular), target);

        let minimal = elim.solution(Strategy::Minimal);
        assert_eq!(apply(dims, &minimal), target);
        assert!(minimal.count_ones() <= particular.count_ones());
        Ok(())
    }

    #[rstest]
    #[case(1, 4)]
    #[case(3, 3)]
    #[case(2, 5)]
    fn null_space_vectors_flip_nothing(#[case] rows: usize, #[case] cols: usize) -> Result<()> {
        let dims = Dims { rows, cols };
        let elim = LinearSystem::new(dims, &Row::repeat(false, dims.cells()))?.eliminate();
        let basis = elim.null_space_basis();
        assert_eq!(basis.len(), elim.free_vars().len());
        for v in basis {
            assert!(v.any());
            assert!(apply(dims, &v).not_any());
        }
        Ok(())
    }

    #[test]
    fn minimal_prefers_fewer_toggles() -> Result<()> {
        // A single toggle at (1, 2) on a 3x3 box
        let system = LinearSystem::from_state(&parse_diagram("..#\n###\n..#")?)?;
        let elim = system.eliminate();
        assert_eq!(elim.particular_solution().count_ones(), 5);
        assert_eq!(
            elim.solution(Strategy::Minimal),
            bitvec![usize, Lsb0; 0, 0, 0, 0, 0, 1, 0, 0, 0]
        );
        Ok(())
    }

    #[rstest]
    #[case("#.")]
    #[case("#\n.")]
    #[case("#..\n...\n...")]
    fn unreachable_states_are_inconsistent(#[case] diagram: &str) -> Result<()> {
        let elim = LinearSystem::from_state(&parse_diagram(diagram)?)?.eliminate();
        assert!(!elim.is_consistent());
        Ok(())
    }

    #[test]
    fn minimal_falls_back_past_enumeration_limit() -> Result<()> {
        // A single line of 22 cells leaves 21 free variables
        let system = LinearSystem::from_state(&parse_diagram(&"#".repeat(22))?)?;
        let dims = system.dims();
        let target = system.target();
        let elim = system.eliminate();
        assert_eq!(elim.free_vars().len(), MAX_ENUMERATED_FREE_VARS + 1);
        assert!(elim.minimum_weight_solution().is_none());

        let minimal = elim.solution(Strategy::Minimal);
        assert_eq!(minimal, elim.particular_solution());
        assert_eq!(apply(dims, &minimal), target);
        Ok(())
    }

    #[test]
    fn elimination_is_deterministic() -> Result<()> {
        let snapshot = parse_diagram("#.#.\n..##\n#..#")?;
        let first = LinearSystem::from_state(&snapshot)?.eliminate();
        let second = LinearSystem::from_state(&snapshot)?.eliminate();
        assert_eq!(first.particular_solution(), second.particular_solution());
        assert_eq!(
            first.solution(Strategy::Minimal),
            second.solution(Strategy::Minimal)
        );
        Ok(())
    }
}
