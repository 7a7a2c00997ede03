//! Plan improvement by local search.
//!
//! - [`Move`] — 2-opt, relocate, swap and reinsert neighborhoods
//! - [`Annealer`] — Simulated annealing with geometric cooling and
//!   best-so-far retention
//! - [`RouteSearch`] — Serial annealing, or route-partitioned rounds on a
//!   rayon pool when several workers are configured
//!
//! Every search honors a [`Budget`]: an iteration count, an optional
//! wall-clock deadline and an optional [`CancelFlag`].

mod annealing;
mod budget;
mod moves;
mod parallel;

pub use annealing::{Annealer, SearchOutcome};
pub use budget::{Budget, CancelFlag, StopReason};
pub use moves::{propose, Move};
pub use parallel::RouteSearch;
