//! Route and stop types.

use serde::{Deserialize, Serialize};

/// A single delivery stop within a route.
///
/// Tracks the order along with its computed timing and load state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Order delivered at this stop.
    pub order_id: String,
    /// Arrival time.
    pub arrival: f64,
    /// Service start (arrival plus waiting).
    pub service_start: f64,
    /// Departure time (service start plus service duration).
    pub departure: f64,
    /// Cumulative delivered load after this stop.
    pub load_after: i64,
    /// Minutes past the order's latest time.
    pub lateness: f64,
}

/// Cost components of one route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCost {
    /// Distance × cost per distance.
    pub distance: f64,
    /// Fixed cost of using the vehicle.
    pub vehicle_fixed: f64,
    /// Σ lateness × priority.
    pub time_window_penalty: f64,
    /// Σ lateness × priority × risk.
    pub risk_penalty: f64,
}

impl RouteCost {
    /// Sum of all components.
    pub fn total(&self) -> f64 {
        self.distance + self.vehicle_fixed + self.time_window_penalty + self.risk_penalty
    }
}

/// An ordered sequence of stops assigned to a single vehicle.
///
/// A route starts and ends at the vehicle's depot (not stored in `stops`).
///
/// # Examples
///
/// ```
/// use u_logistics::models::{Route, Stop};
///
/// let mut route = Route::new("v0", "d0");
/// route.push_stop(Stop {
///     order_id: "o1".into(),
///     arrival: 10.0,
///     service_start: 10.0,
///     departure: 15.0,
///     load_after: 4,
///     lateness: 0.0,
/// });
/// assert_eq!(route.len(), 1);
/// assert_eq!(route.load(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle_id: String,
    depot_id: String,
    stops: Vec<Stop>,
    start_time: f64,
    end_time: f64,
    distance: f64,
    load: i64,
    cost: RouteCost,
}

impl Route {
    /// Creates an empty route for the given vehicle.
    pub fn new(vehicle_id: impl Into<String>, depot_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            depot_id: depot_id.into(),
            stops: Vec::new(),
            start_time: 0.0,
            end_time: 0.0,
            distance: 0.0,
            load: 0,
            cost: RouteCost::default(),
        }
    }

    /// Appends a stop to the end of this route.
    pub fn push_stop(&mut self, stop: Stop) {
        self.load = stop.load_after;
        self.stops.push(stop);
    }

    /// Vehicle serving this route.
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Depot the route starts and ends at.
    pub fn depot_id(&self) -> &str {
        &self.depot_id
    }

    /// Ordered stops.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Order identifiers in visit order.
    pub fn order_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.order_id.as_str()).collect()
    }

    /// Departure from the depot.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Return to the depot.
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Total travelled distance including the return leg.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Total delivered load.
    pub fn load(&self) -> i64 {
        self.load
    }

    /// Cost components.
    pub fn cost(&self) -> &RouteCost {
        &self.cost
    }

    /// Sets depot departure and return times (used by evaluator).
    pub fn set_times(&mut self, start: f64, end: f64) {
        self.start_time = start;
        self.end_time = end;
    }

    /// Sets the total distance (used by evaluator).
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    /// Sets the cost components (used by evaluator).
    pub fn set_cost(&mut self, cost: RouteCost) {
        self.cost = cost;
    }
}
