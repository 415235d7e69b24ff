//! Opens a secure box: a grid of locks where toggling a cell also flips its
//! whole row and column.
//!
//! The toggles that open a box are the solution `B` of `T·B = A` over GF(2),
//! where `A` is the box's state and `T` the toggle-effect matrix. The system
//! is reduced with Gaussian elimination and every cell in `B` is toggled once.

pub mod effect;
pub mod elimination;
pub mod grid;
pub mod secure_box;
pub mod solver;
pub mod system;

pub use elimination::{Elimination, Strategy};
pub use grid::{Cell, Dims, Row, Snapshot};
pub use secure_box::{Lockbox, SecureBox};
pub use solver::{apply_toggles, open_box, plan, Outcome, Plan};
pub use system::LinearSystem;
