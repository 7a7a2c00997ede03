//! Plan output types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Route, RouteCost};

/// Why an order could not be placed on any route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// No vehicle in scope is available.
    NoVehicleAvailable,
    /// Every candidate position exceeded a vehicle capacity.
    CapacityExceeded,
    /// Every candidate position arrived too late.
    TimeWindow,
    /// Every candidate route ran past the vehicle or depot hours.
    Availability,
    /// Every candidate route broke a distance or duration limit.
    RouteLimit,
    /// Every candidate depot was out of dispatch capacity.
    DepotCapacity,
}

impl fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnassignedReason::NoVehicleAvailable => "no vehicle available",
            UnassignedReason::CapacityExceeded => "vehicle capacity exceeded",
            UnassignedReason::TimeWindow => "time window cannot be met",
            UnassignedReason::Availability => "vehicle or depot hours exceeded",
            UnassignedReason::RouteLimit => "route distance or duration limit exceeded",
            UnassignedReason::DepotCapacity => "depot dispatch capacity exceeded",
        };
        f.write_str(text)
    }
}

/// An order left out of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedOrder {
    /// Order identifier.
    pub order_id: String,
    /// Dominant reason no position was feasible.
    pub reason: UnassignedReason,
}

/// How a reorder quantity was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityMethod {
    /// The position's configured reorder quantity.
    Fixed,
    /// Closed-form economic order quantity.
    EconomicOrderQuantity,
    /// Selected by the exact subsolver.
    Exact,
}

/// A replenishment decision for one inventory position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderAction {
    /// Item identifier.
    pub item: String,
    /// Depot identifier.
    pub location: String,
    /// Units to order.
    pub quantity: i32,
    /// Reorder point that triggered the action.
    pub reorder_point: f64,
    /// Safety stock included in the reorder point.
    pub safety_stock: f64,
    /// Expected cost attributed to this action.
    pub expected_cost: f64,
    /// How `quantity` was chosen.
    pub method: QuantityMethod,
}

/// A single plan decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanAction {
    /// Dispatch a vehicle along a route.
    Dispatch(Route),
    /// Replenish an inventory position.
    Reorder(ReorderAction),
}

/// Cost components of a plan. [`CostBreakdown::total`] is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Distance cost over all routes.
    pub distance: f64,
    /// Fixed vehicle costs.
    pub vehicle_fixed: f64,
    /// Lateness × priority.
    pub time_window_penalty: f64,
    /// Lateness × priority × risk.
    pub risk_penalty: f64,
    /// Penalty for unassigned orders.
    pub unassigned_penalty: f64,
    /// Expected inventory cost of reorder actions.
    pub inventory: f64,
}

impl CostBreakdown {
    /// Adds one route's components.
    pub fn add_route(&mut self, cost: &RouteCost) {
        self.distance += cost.distance;
        self.vehicle_fixed += cost.vehicle_fixed;
        self.time_window_penalty += cost.time_window_penalty;
        self.risk_penalty += cost.risk_penalty;
    }

    /// Routing part of the cost (everything except inventory).
    pub fn routing(&self) -> f64 {
        self.distance
            + self.vehicle_fixed
            + self.time_window_penalty
            + self.risk_penalty
            + self.unassigned_penalty
    }

    /// Total cost.
    pub fn total(&self) -> f64 {
        self.routing() + self.inventory
    }
}

/// The output of one planning cycle.
///
/// A plan is an immutable snapshot: the next cycle produces a new plan
/// rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    actions: Vec<PlanAction>,
    unassigned: Vec<UnassignedOrder>,
    cost: CostBreakdown,
    feasible: bool,
    violations: Vec<String>,
}

impl Plan {
    /// Assembles a plan. The plan is feasible iff `violations` is empty.
    pub fn new(
        actions: Vec<PlanAction>,
        unassigned: Vec<UnassignedOrder>,
        cost: CostBreakdown,
        violations: Vec<String>,
    ) -> Self {
        Self {
            actions,
            unassigned,
            cost,
            feasible: violations.is_empty(),
            violations,
        }
    }

    /// All actions in plan order (dispatches first, then reorders).
    pub fn actions(&self) -> &[PlanAction] {
        &self.actions
    }

    /// Dispatched routes.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.actions.iter().filter_map(|a| match a {
            PlanAction::Dispatch(route) => Some(route),
            PlanAction::Reorder(_) => None,
        })
    }

    /// Reorder actions.
    pub fn reorders(&self) -> impl Iterator<Item = &ReorderAction> {
        self.actions.iter().filter_map(|a| match a {
            PlanAction::Reorder(action) => Some(action),
            PlanAction::Dispatch(_) => None,
        })
    }

    /// Route served by the given vehicle, if any.
    pub fn route_for_vehicle(&self, vehicle_id: &str) -> Option<&Route> {
        self.routes().find(|r| r.vehicle_id() == vehicle_id)
    }

    /// Number of dispatched routes.
    pub fn num_routes(&self) -> usize {
        self.routes().count()
    }

    /// Orders left out of the plan.
    pub fn unassigned(&self) -> &[UnassignedOrder] {
        &self.unassigned
    }

    /// Number of unassigned orders.
    pub fn num_unassigned(&self) -> usize {
        self.unassigned.len()
    }

    /// Number of orders served across all routes.
    pub fn num_assigned(&self) -> usize {
        self.routes().map(Route::len).sum()
    }

    /// Cost breakdown.
    pub fn cost(&self) -> &CostBreakdown {
        &self.cost
    }

    /// Total cost.
    pub fn total_cost(&self) -> f64 {
        self.cost.total()
    }

    /// Returns `true` if every route passed every check.
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    /// Descriptions of failed checks; empty for feasible plans.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stop;

    fn route(vehicle: &str, orders: &[&str]) -> Route {
        let mut r = Route::new(vehicle, "d0");
        for (i, id) in orders.iter().enumerate() {
            r.push_stop(Stop {
                order_id: id.to_string(),
                arrival: 0.0,
                service_start: 0.0,
                departure: 0.0,
                load_after: i as i64 + 1,
                lateness: 0.0,
            });
        }
        r
    }

    #[test]
    fn test_plan_accessors() {
        let reorder = ReorderAction {
            item: "sku".into(),
            location: "d0".into(),
            quantity: 10,
            reorder_point: 5.0,
            safety_stock: 0.0,
            expected_cost: 3.0,
            method: QuantityMethod::Fixed,
        };
        let plan = Plan::new(
            vec![
                PlanAction::Dispatch(route("v0", &["o1", "o2"])),
                PlanAction::Dispatch(route("v1", &["o3"])),
                PlanAction::Reorder(reorder),
            ],
            vec![UnassignedOrder {
                order_id: "o4".into(),
                reason: UnassignedReason::CapacityExceeded,
            }],
            CostBreakdown::default(),
            vec![],
        );
        assert_eq!(plan.num_routes(), 2);
        assert_eq!(plan.num_assigned(), 3);
        assert_eq!(plan.num_unassigned(), 1);
        assert_eq!(plan.reorders().count(), 1);
        assert!(plan.is_feasible());
        assert_eq!(plan.route_for_vehicle("v1").map(Route::len), Some(1));
        assert!(plan.route_for_vehicle("v7").is_none());
    }

    #[test]
    fn test_breakdown_sums() {
        let mut cost = CostBreakdown::default();
        cost.add_route(&RouteCost {
            distance: 10.0,
            vehicle_fixed: 1.0,
            time_window_penalty: 2.0,
            risk_penalty: 3.0,
        });
        cost.unassigned_penalty = 100.0;
        cost.inventory = 4.0;
        assert!((cost.routing() - 116.0).abs() < 1e-10);
        assert!((cost.total() - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_infeasible_plan() {
        let plan = Plan::new(vec![], vec![], CostBreakdown::default(), vec!["late".into()]);
        assert!(!plan.is_feasible());
        assert_eq!(plan.violations(), ["late".to_string()]);
    }

    #[test]
    fn test_action_tagging() {
        let json = serde_json::to_string(&PlanAction::Dispatch(route("v0", &[]))).expect("serializes");
        assert!(json.contains("\"kind\":\"dispatch\""));
    }
}
