//! Initial plan construction.
//!
//! - [`InsertionBuilder`] — Cheapest feasible insertion across a
//!   heterogeneous multi-depot fleet, O(n²m)

mod insertion;

pub use insertion::{cheapest_insertion, InsertionBuilder, InsertionOutcome};
