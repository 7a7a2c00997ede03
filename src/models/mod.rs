//! Domain model types for logistics planning.
//!
//! Provides the core abstractions: depots, vehicles with speed profiles and
//! availability, orders with time windows and risk scores, inventory
//! positions, the validated [`ProblemModel`] snapshot, and the plan types
//! produced by the engine.

mod depot;
mod draft;
mod inventory;
mod location;
mod order;
mod plan;
mod problem;
mod route;
mod vehicle;

pub use depot::Depot;
pub use draft::{PlanDraft, RouteScope};
pub use inventory::{DemandForecast, InventoryCosts, InventoryPosition};
pub use location::Location;
pub use order::{Order, TimeWindow};
pub use plan::{
    CostBreakdown, Plan, PlanAction, QuantityMethod, ReorderAction, UnassignedOrder,
    UnassignedReason,
};
pub(crate) use problem::{check_non_negative, check_range, index_ids};
pub use problem::{ProblemModel, ProblemRecord};
pub use route::{Route, RouteCost, Stop};
pub use vehicle::{SpeedBand, SpeedProfile, Vehicle, VehicleStatus};
