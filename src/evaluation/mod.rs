//! Route and plan evaluation.
//!
//! [`RouteEvaluator`] is the single source of truth for feasibility and
//! cost. The builder, the improver and the reoptimizer all go through it,
//! and every finished [`Plan`](crate::models::Plan) is re-verified by it.

mod assemble;
mod evaluator;

pub use assemble::draft_from_plan;
pub use evaluator::{Infeasibility, RouteEvaluator, FEASIBILITY_TOLERANCE};
