//! Cheapest feasible insertion for heterogeneous, multi-depot fleets.
//!
//! # Algorithm
//!
//! Orders are processed by priority (highest first), then by latest
//! allowed time (earliest first), then by identifier. Each order goes into
//! the (vehicle, position) pair with the smallest feasible cost increase:
//!
//! Δ(v, p) = cost(route_v with order at p) − cost(route_v)
//!
//! Ties keep the first candidate in vehicle, then position, order. An order
//! with no feasible position is recorded as unassigned with the failure
//! seen most often across all candidates.
//!
//! # Complexity
//!
//! O(n² · m) route evaluations in the worst case, where n = orders and
//! m = vehicles.

use tracing::debug;

use crate::evaluation::{Infeasibility, RouteEvaluator};
use crate::models::{PlanDraft, RouteScope, UnassignedReason};

/// Result of searching for an order's best position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertionOutcome {
    /// Cheapest feasible position.
    Placed {
        /// Vehicle index.
        vehicle: usize,
        /// Position in the vehicle's route.
        position: usize,
        /// Cost increase.
        delta: f64,
    },
    /// No feasible position; carries the dominant failure.
    Unplaceable(UnassignedReason),
}

/// Places orders into a draft one at a time at their cheapest position.
///
/// # Examples
///
/// ```
/// use u_logistics::config::CostConfig;
/// use u_logistics::constructive::InsertionBuilder;
/// use u_logistics::evaluation::RouteEvaluator;
/// use u_logistics::models::{Depot, Location, Order, ProblemModel, TimeWindow, Vehicle};
///
/// let tw = TimeWindow::new(0.0, 100.0).unwrap();
/// let problem = ProblemModel::new(
///     vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
///     vec![Vehicle::new("v0", "d0", 10)],
///     vec![
///         Order::new("o1", Location::new(5.0, 0.0), 4, tw),
///         Order::new("o2", Location::new(9.0, 0.0), 4, tw),
///         Order::new("o3", Location::new(7.0, 0.0), 4, tw),
///     ],
///     vec![],
/// )
/// .unwrap();
/// let costs = CostConfig::default();
/// let draft = InsertionBuilder::new(RouteEvaluator::new(&problem, &costs)).build();
///
/// assert_eq!(draft.num_assigned(), 2);
/// assert_eq!(draft.unassigned().len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InsertionBuilder<'a> {
    evaluator: RouteEvaluator<'a>,
}

impl<'a> InsertionBuilder<'a> {
    /// Creates a builder over the given evaluator.
    pub fn new(evaluator: RouteEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    /// Builds a draft from scratch with every order and every vehicle.
    pub fn build(&self) -> PlanDraft {
        let problem = self.evaluator.problem();
        let mut draft = PlanDraft::new(problem.num_vehicles());
        let orders: Vec<usize> = (0..problem.num_orders()).collect();
        self.insert_orders(&mut draft, &orders, &RouteScope::all(problem.num_vehicles()));
        draft
    }

    /// Inserts `orders` into the routes in `scope`, leaving routes outside
    /// the scope untouched. Orders that fit nowhere go to the unassigned
    /// pool. Returns the number of orders placed.
    pub fn insert_orders(&self, draft: &mut PlanDraft, orders: &[usize], scope: &RouteScope) -> usize {
        let mut queue = orders.to_vec();
        self.sort_for_insertion(&mut queue);

        let mut route_costs = self.evaluator.route_costs(draft);
        let mut depot_loads = self.evaluator.depot_loads(draft);
        let mut placed = 0;

        for order in queue {
            match self.best_insertion(draft, &route_costs, &depot_loads, order, scope) {
                InsertionOutcome::Placed {
                    vehicle, position, ..
                } => {
                    draft.insert(vehicle, position, order);
                    route_costs[vehicle] = self
                        .evaluator
                        .route_cost(vehicle, draft.route(vehicle))
                        .unwrap_or(f64::INFINITY);
                    let problem = self.evaluator.problem();
                    depot_loads[problem.vehicle_depot(vehicle)] += i64::from(problem.orders()[order].demand());
                    placed += 1;
                }
                InsertionOutcome::Unplaceable(reason) => {
                    debug!(order = self.evaluator.problem().orders()[order].id(), %reason, "order left unassigned");
                    draft.mark_unassigned(order, reason);
                }
            }
        }

        debug!(placed, requested = orders.len(), "insertion finished");
        placed
    }

    /// Finds the cheapest feasible position for `order` among the routes in
    /// `scope`.
    ///
    /// `route_costs` and `depot_loads` must reflect `draft`.
    pub fn best_insertion(
        &self,
        draft: &PlanDraft,
        route_costs: &[f64],
        depot_loads: &[i64],
        order: usize,
        scope: &RouteScope,
    ) -> InsertionOutcome {
        let problem = self.evaluator.problem();
        let demand = i64::from(problem.orders()[order].demand());
        let mut best: Option<(usize, usize, f64)> = None;
        let mut failures = FailureTally::default();
        let mut candidate = Vec::new();

        for vehicle in scope.vehicles() {
            if !route_costs[vehicle].is_finite() {
                continue;
            }
            let route = draft.route(vehicle);
            let depot = problem.vehicle_depot(vehicle);
            if depot_loads[depot] + demand > i64::from(problem.depots()[depot].capacity()) {
                failures.record(UnassignedReason::DepotCapacity);
                continue;
            }
            for position in 0..=route.len() {
                candidate.clear();
                candidate.extend_from_slice(&route[..position]);
                candidate.push(order);
                candidate.extend_from_slice(&route[position..]);

                match self.evaluator.check(vehicle, &candidate) {
                    Ok(cost) => {
                        let delta = cost.total() - route_costs[vehicle];
                        if best.map_or(true, |(_, _, d)| delta < d) {
                            best = Some((vehicle, position, delta));
                        }
                    }
                    Err(Infeasibility::VehicleUnavailable { .. }) => {
                        failures.record(UnassignedReason::NoVehicleAvailable);
                        break;
                    }
                    Err(err) => failures.record(err.reason()),
                }
            }
        }

        match best {
            Some((vehicle, position, delta)) => InsertionOutcome::Placed {
                vehicle,
                position,
                delta,
            },
            None => InsertionOutcome::Unplaceable(failures.dominant()),
        }
    }

    /// Sorts orders by priority descending, latest time ascending, then
    /// identifier.
    pub fn sort_for_insertion(&self, orders: &mut [usize]) {
        let all = self.evaluator.problem().orders();
        orders.sort_by(|&a, &b| {
            let (a, b) = (&all[a], &all[b]);
            b.priority()
                .total_cmp(&a.priority())
                .then(a.time_window().latest().total_cmp(&b.time_window().latest()))
                .then_with(|| a.id().cmp(b.id()))
        });
    }
}

/// Builds a draft by cheapest insertion over the whole problem.
pub fn cheapest_insertion(evaluator: RouteEvaluator<'_>) -> PlanDraft {
    InsertionBuilder::new(evaluator).build()
}

/// Counts failed checks per reason, remembering first-seen order for ties.
#[derive(Debug, Default)]
struct FailureTally {
    counts: Vec<(UnassignedReason, usize)>,
}

impl FailureTally {
    fn record(&mut self, reason: UnassignedReason) {
        match self.counts.iter_mut().find(|(r, _)| *r == reason) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((reason, 1)),
        }
    }

    fn dominant(&self) -> UnassignedReason {
        let mut best: Option<(UnassignedReason, usize)> = None;
        for &(reason, count) in &self.counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((reason, count));
            }
        }
        best.map_or(UnassignedReason::NoVehicleAvailable, |(reason, _)| reason)
    }
}
