//! # u-logistics
//!
//! Prescriptive optimization engine for logistics: turns a snapshot of
//! depots, a heterogeneous fleet, time-windowed orders with delay risk and
//! inventory positions into an executable plan of vehicle routes and
//! reorder actions, and repairs that plan when disruptions arrive. Delivery
//! tasks can also be scheduled onto drivers and dock slots.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Depot, Vehicle, Order, InventoryPosition, ProblemModel, Plan)
//! - [`distance`] — Euclidean distance matrix
//! - [`evaluation`] — Route feasibility checking and cost evaluation
//! - [`constructive`] — Cheapest-insertion builder
//! - [`local_search`] — Simulated annealing, optionally route-partitioned in parallel
//! - [`subsolver`] — Mixed-integer formulations and the pluggable exact solver seam
//! - [`inventory`] — Reorder point, safety stock and order quantity decisions
//! - [`reoptimize`] — Disruptions and bounded plan repair
//! - [`scheduling`] — Task-to-resource slot scheduling
//! - [`engine`] — End-to-end planning cycle
//! - [`config`] — Engine configuration
//! - [`io`] — JSON records in, JSON plans out
//! - [`error`] — Validation and engine errors

pub mod config;
pub mod constructive;
pub mod distance;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod inventory;
pub mod io;
pub mod local_search;
pub mod models;
pub mod reoptimize;
pub mod scheduling;
pub mod subsolver;
