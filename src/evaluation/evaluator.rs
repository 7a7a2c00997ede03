//! Route evaluator that computes timing, load, cost and feasibility.

use thiserror::Error;

use crate::config::CostConfig;
use crate::models::{
    PlanDraft, ProblemModel, Route, RouteCost, Stop, UnassignedReason, Vehicle,
};

/// Slack for floating-point comparisons against limits.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// A failed feasibility check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Infeasibility {
    /// The vehicle is out of service.
    #[error("vehicle #{vehicle} is unavailable")]
    VehicleUnavailable {
        /// Vehicle index.
        vehicle: usize,
    },
    /// Cumulative load exceeds capacity at a stop.
    #[error("load {load} exceeds capacity {capacity} at stop {position}")]
    CapacityExceeded {
        /// Stop position where the prefix first exceeds capacity.
        position: usize,
        /// Prefix load.
        load: i64,
        /// Vehicle capacity.
        capacity: i32,
    },
    /// Arrival beyond the order's latest time plus the lateness tolerance.
    #[error("order #{order} reached at {arrival:.2}, latest {latest:.2}")]
    TimeWindowViolated {
        /// Order index.
        order: usize,
        /// Arrival time.
        arrival: f64,
        /// Latest allowed time.
        latest: f64,
    },
    /// Return to depot after the vehicle availability or depot hours end.
    #[error("route ends at {end_time:.2}, after {latest:.2}")]
    AvailabilityExceeded {
        /// Return time.
        end_time: f64,
        /// End of the availability window.
        latest: f64,
    },
    /// Route distance exceeds the vehicle's maximum.
    #[error("route distance {distance:.2} exceeds {max_distance:.2}")]
    MaxDistanceExceeded {
        /// Actual distance.
        distance: f64,
        /// Maximum allowed distance.
        max_distance: f64,
    },
    /// Route duration exceeds the vehicle's maximum.
    #[error("route duration {duration:.2} exceeds {max_duration:.2}")]
    MaxDurationExceeded {
        /// Actual duration.
        duration: f64,
        /// Maximum allowed duration.
        max_duration: f64,
    },
    /// Demand dispatched from a depot exceeds its capacity.
    #[error("depot #{depot} dispatches {load}, capacity {capacity}")]
    DepotCapacityExceeded {
        /// Depot index.
        depot: usize,
        /// Dispatched load.
        load: i64,
        /// Depot capacity.
        capacity: i32,
    },
}

impl Infeasibility {
    /// Unassigned reason corresponding to this failure.
    pub fn reason(&self) -> UnassignedReason {
        match self {
            Infeasibility::VehicleUnavailable { .. } => UnassignedReason::NoVehicleAvailable,
            Infeasibility::CapacityExceeded { .. } => UnassignedReason::CapacityExceeded,
            Infeasibility::TimeWindowViolated { .. } => UnassignedReason::TimeWindow,
            Infeasibility::AvailabilityExceeded { .. } => UnassignedReason::Availability,
            Infeasibility::MaxDistanceExceeded { .. }
            | Infeasibility::MaxDurationExceeded { .. } => UnassignedReason::RouteLimit,
            Infeasibility::DepotCapacityExceeded { .. } => UnassignedReason::DepotCapacity,
        }
    }
}

/// Evaluates candidate routes against a problem snapshot.
///
/// The evaluator is pure: it never mutates its inputs, so it can be shared
/// across worker threads and used to re-verify a plan after the fact.
///
/// Checks run in a fixed order and [`RouteEvaluator::check`] stops at the
/// first failure: vehicle status, capacity prefix, time windows,
/// availability window, then distance/duration limits.
///
/// # Examples
///
/// ```
/// use u_logistics::config::CostConfig;
/// use u_logistics::evaluation::RouteEvaluator;
/// use u_logistics::models::{Depot, Location, Order, ProblemModel, TimeWindow, Vehicle};
///
/// let problem = ProblemModel::new(
///     vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
///     vec![Vehicle::new("v0", "d0", 10)],
///     vec![
///         Order::new("o1", Location::new(3.0, 4.0), 4, TimeWindow::new(0.0, 100.0).unwrap()),
///         Order::new("o2", Location::new(6.0, 8.0), 4, TimeWindow::new(0.0, 100.0).unwrap()),
///     ],
///     vec![],
/// )
/// .unwrap();
/// let costs = CostConfig::default();
/// let evaluator = RouteEvaluator::new(&problem, &costs);
///
/// let cost = evaluator.check(0, &[0, 1]).unwrap();
/// assert!((cost.total() - 20.0).abs() < 1e-9);
///
/// let (route, violations) = evaluator.build_route(0, &[0, 1]);
/// assert_eq!(route.len(), 2);
/// assert!(violations.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RouteEvaluator<'a> {
    problem: &'a ProblemModel,
    costs: &'a CostConfig,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates a new evaluator for the given problem and cost model.
    pub fn new(problem: &'a ProblemModel, costs: &'a CostConfig) -> Self {
        Self { problem, costs }
    }

    /// Problem snapshot.
    pub fn problem(&self) -> &'a ProblemModel {
        self.problem
    }

    /// Cost model.
    pub fn costs(&self) -> &'a CostConfig {
        self.costs
    }

    /// Checks a route and returns its cost, or the first failed check.
    ///
    /// An empty route is always feasible and costs nothing.
    pub fn check(&self, vehicle: usize, stops: &[usize]) -> Result<RouteCost, Infeasibility> {
        if stops.is_empty() {
            return Ok(RouteCost::default());
        }
        let v = &self.problem.vehicles()[vehicle];
        if !v.is_available() {
            return Err(Infeasibility::VehicleUnavailable { vehicle });
        }

        let mut load = 0i64;
        for (position, &order) in stops.iter().enumerate() {
            load += i64::from(self.problem.orders()[order].demand());
            if load > i64::from(v.capacity()) {
                return Err(Infeasibility::CapacityExceeded {
                    position,
                    load,
                    capacity: v.capacity(),
                });
            }
        }

        let depot_loc = self.problem.depot_location(self.problem.vehicle_depot(vehicle));
        let start = self.start_time(vehicle);
        let mut time = start;
        let mut prev = depot_loc;
        let mut distance = 0.0;
        let mut cost = RouteCost::default();

        for &order in stops {
            let loc = self.problem.order_location(order);
            let leg = self.problem.distance(prev, loc);
            distance += leg;
            let arrival = time + v.speed().travel_time(leg, time);

            let o = &self.problem.orders()[order];
            let tw = o.time_window();
            if arrival > tw.latest() + self.costs.max_lateness + FEASIBILITY_TOLERANCE {
                return Err(Infeasibility::TimeWindowViolated {
                    order,
                    arrival,
                    latest: tw.latest(),
                });
            }
            let weighted = tw.lateness(arrival) * o.priority();
            cost.time_window_penalty += weighted;
            cost.risk_penalty += weighted * o.risk_score();

            time = arrival + tw.waiting_time(arrival) + o.service_duration();
            prev = loc;
        }

        let back = self.problem.distance(prev, depot_loc);
        distance += back;
        let end = time + v.speed().travel_time(back, time);

        let latest = self.end_limit(vehicle);
        if end > latest + FEASIBILITY_TOLERANCE {
            return Err(Infeasibility::AvailabilityExceeded {
                end_time: end,
                latest,
            });
        }
        if let Some(err) = route_limits(v, distance, end - start).into_iter().next() {
            return Err(err);
        }

        cost.distance = distance * v.cost_per_distance();
        cost.vehicle_fixed = v.fixed_cost();
        Ok(cost)
    }

    /// Total cost of a route, or `None` if infeasible.
    pub fn route_cost(&self, vehicle: usize, stops: &[usize]) -> Option<f64> {
        self.check(vehicle, stops).ok().map(|c| c.total())
    }

    /// Builds a full route with stop timing, collecting every violation.
    ///
    /// Unlike [`RouteEvaluator::check`] this does not stop at the first
    /// failure, so it serves as the plan's feasibility certificate.
    pub fn build_route(&self, vehicle: usize, stops: &[usize]) -> (Route, Vec<Infeasibility>) {
        let v = &self.problem.vehicles()[vehicle];
        let depot = self.problem.vehicle_depot(vehicle);
        let mut route = Route::new(v.id(), self.problem.depots()[depot].id());
        let mut violations = Vec::new();

        if stops.is_empty() {
            return (route, violations);
        }
        if !v.is_available() {
            violations.push(Infeasibility::VehicleUnavailable { vehicle });
        }

        let depot_loc = self.problem.depot_location(depot);
        let start = self.start_time(vehicle);
        let mut time = start;
        let mut load = 0i64;
        let mut prev = depot_loc;
        let mut distance = 0.0;
        let mut cost = RouteCost::default();

        for (position, &order) in stops.iter().enumerate() {
            let o = &self.problem.orders()[order];
            let loc = self.problem.order_location(order);
            let leg = self.problem.distance(prev, loc);
            distance += leg;
            let arrival = time + v.speed().travel_time(leg, time);

            load += i64::from(o.demand());
            if load > i64::from(v.capacity()) {
                violations.push(Infeasibility::CapacityExceeded {
                    position,
                    load,
                    capacity: v.capacity(),
                });
            }

            let tw = o.time_window();
            if arrival > tw.latest() + self.costs.max_lateness + FEASIBILITY_TOLERANCE {
                violations.push(Infeasibility::TimeWindowViolated {
                    order,
                    arrival,
                    latest: tw.latest(),
                });
            }
            let lateness = tw.lateness(arrival);
            let weighted = lateness * o.priority();
            cost.time_window_penalty += weighted;
            cost.risk_penalty += weighted * o.risk_score();

            let service_start = arrival + tw.waiting_time(arrival);
            let departure = service_start + o.service_duration();
            route.push_stop(Stop {
                order_id: o.id().to_string(),
                arrival,
                service_start,
                departure,
                load_after: load,
                lateness,
            });

            time = departure;
            prev = loc;
        }

        let back = self.problem.distance(prev, depot_loc);
        distance += back;
        let end = time + v.speed().travel_time(back, time);

        let latest = self.end_limit(vehicle);
        if end > latest + FEASIBILITY_TOLERANCE {
            violations.push(Infeasibility::AvailabilityExceeded {
                end_time: end,
                latest,
            });
        }
        violations.extend(route_limits(v, distance, end - start));

        cost.distance = distance * v.cost_per_distance();
        cost.vehicle_fixed = v.fixed_cost();
        route.set_times(start, end);
        route.set_distance(distance);
        route.set_cost(cost);

        (route, violations)
    }

    /// Total demand of a stop sequence.
    ///
    /// Summed in `i64` so that demands near `i32::MAX` cannot wrap.
    pub fn route_load(&self, stops: &[usize]) -> i64 {
        stops
            .iter()
            .map(|&o| i64::from(self.problem.orders()[o].demand()))
            .sum()
    }

    /// Demand dispatched from each depot by a draft.
    pub fn depot_loads(&self, draft: &PlanDraft) -> Vec<i64> {
        let mut loads = vec![0i64; self.problem.depots().len()];
        for (vehicle, stops) in draft.routes().iter().enumerate() {
            loads[self.problem.vehicle_depot(vehicle)] += self.route_load(stops);
        }
        loads
    }

    /// Depots whose dispatch capacity a draft exceeds.
    pub fn depot_violations(&self, draft: &PlanDraft) -> Vec<Infeasibility> {
        self.depot_loads(draft)
            .into_iter()
            .enumerate()
            .filter_map(|(depot, load)| {
                let capacity = self.problem.depots()[depot].capacity();
                (load > i64::from(capacity)).then_some(Infeasibility::DepotCapacityExceeded {
                    depot,
                    load,
                    capacity,
                })
            })
            .collect()
    }

    /// Cost of each route in a draft; infeasible routes cost infinity.
    pub fn route_costs(&self, draft: &PlanDraft) -> Vec<f64> {
        draft
            .routes()
            .iter()
            .enumerate()
            .map(|(vehicle, stops)| self.route_cost(vehicle, stops).unwrap_or(f64::INFINITY))
            .collect()
    }

    /// Routing cost of a draft including the unassigned penalty.
    pub fn draft_cost(&self, draft: &PlanDraft) -> f64 {
        let routes: f64 = self.route_costs(draft).iter().sum();
        routes + self.unassigned_cost(draft.unassigned().len())
    }

    /// Penalty for `count` unassigned orders.
    pub fn unassigned_cost(&self, count: usize) -> f64 {
        count as f64 * self.costs.unassigned_penalty
    }

    /// Earliest departure of a vehicle from its depot.
    pub fn start_time(&self, vehicle: usize) -> f64 {
        let v = &self.problem.vehicles()[vehicle];
        let depot = &self.problem.depots()[self.problem.vehicle_depot(vehicle)];
        let from_vehicle = v.availability().map_or(0.0, |w| w.earliest());
        let from_depot = depot.hours().map_or(0.0, |w| w.earliest());
        from_vehicle.max(from_depot).max(0.0)
    }

    /// Latest return of a vehicle to its depot.
    pub fn end_limit(&self, vehicle: usize) -> f64 {
        let v = &self.problem.vehicles()[vehicle];
        let depot = &self.problem.depots()[self.problem.vehicle_depot(vehicle)];
        let from_vehicle = v.availability().map_or(f64::INFINITY, |w| w.latest());
        let from_depot = depot.hours().map_or(f64::INFINITY, |w| w.latest());
        from_vehicle.min(from_depot)
    }
}

fn route_limits(vehicle: &Vehicle, distance: f64, duration: f64) -> Vec<Infeasibility> {
    let mut violations = Vec::new();
    if let Some(max_distance) = vehicle.max_distance() {
        if distance > max_distance + FEASIBILITY_TOLERANCE {
            violations.push(Infeasibility::MaxDistanceExceeded {
                distance,
                max_distance,
            });
        }
    }
    if let Some(max_duration) = vehicle.max_duration() {
        if duration > max_duration + FEASIBILITY_TOLERANCE {
            violations.push(Infeasibility::MaxDurationExceeded {
                duration,
                max_duration,
            });
        }
    }
    violations
}
