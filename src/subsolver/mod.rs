//! Exact subsolver seam.
//!
//! Small subproblems (the visiting order of a short route, the choice of a
//! reorder quantity) are expressed as mixed-integer [`Formulation`]s and
//! handed to an [`ExactSolver`]. The crate ships no solver; callers plug
//! one in through the trait. Any failure leaves the heuristic answer in
//! place.

mod adapter;
mod formulation;
#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{SubsolverAdapter, SubsolverError};
pub use formulation::{
    ExactSolver, Formulation, LinearConstraint, LinearExpr, Relation, SolveReport, SolveStatus,
    Variable, VariableKind,
};
