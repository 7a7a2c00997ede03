//! Disruption-aware re-planning.
//!
//! - [`Disruption`] — risk and demand updates, cancellations and vehicle
//!   outages, applied to a snapshot with [`ProblemModel::revise`]
//! - [`BoundedRepair`] — re-places affected orders within the touched
//!   routes and the empty routes of spare vehicles
//!
//! The engine escalates to a full replan only when bounded repair leaves a
//! displaced order without a route.
//!
//! [`ProblemModel::revise`]: crate::models::ProblemModel::revise

mod disruption;
mod repair;

pub use disruption::{DemandUpdate, Disruption, RiskUpdate};
pub use repair::{BoundedRepair, ReoptOutcome, Reoptimization, RepairResult};
