//! Order and time window types.

use serde::{Deserialize, Serialize};

use super::Location;

/// A time window `[earliest, latest]` in minutes from the horizon start.
///
/// A vehicle arriving before `earliest` waits; arriving after `latest` is
/// late.
///
/// # Examples
///
/// ```
/// use u_logistics::models::TimeWindow;
///
/// let tw = TimeWindow::new(100.0, 200.0).unwrap();
/// assert!(tw.contains(150.0));
/// assert_eq!(tw.waiting_time(80.0), 20.0);
/// assert_eq!(tw.lateness(230.0), 30.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    earliest: f64,
    latest: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `earliest > latest` or either value is non-finite.
    pub fn new(earliest: f64, latest: f64) -> Option<Self> {
        let tw = Self { earliest, latest };
        tw.is_well_formed().then_some(tw)
    }

    /// Earliest service start.
    pub fn earliest(&self) -> f64 {
        self.earliest
    }

    /// Latest on-time arrival.
    pub fn latest(&self) -> f64 {
        self.latest
    }

    /// Returns `true` if bounds are finite and ordered.
    ///
    /// Deserialized windows bypass [`TimeWindow::new`], so snapshots check
    /// this during validation.
    pub fn is_well_formed(&self) -> bool {
        self.earliest.is_finite() && self.latest.is_finite() && self.earliest <= self.latest
    }

    /// Returns `true` if the given time falls within this window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.earliest && time <= self.latest
    }

    /// Waiting time when arriving at `arrival`. Zero if not early.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        (self.earliest - arrival).max(0.0)
    }

    /// Minutes past `latest` when arriving at `arrival`. Zero if on time.
    pub fn lateness(&self, arrival: f64) -> f64 {
        (arrival - self.latest).max(0.0)
    }
}

fn default_priority() -> f64 {
    1.0
}

/// A delivery order.
///
/// Goods are loaded at the serving vehicle's depot and delivered to
/// `destination`; `origin` is carried for reporting. `risk_score` is the
/// externally forecast probability that the order is delayed.
///
/// # Examples
///
/// ```
/// use u_logistics::models::{Location, Order, TimeWindow};
///
/// let order = Order::new(
///     "o1",
///     Location::new(10.0, 0.0),
///     4,
///     TimeWindow::new(0.0, 120.0).unwrap(),
/// )
/// .with_priority(2.0)
/// .with_risk_score(0.3);
/// assert_eq!(order.demand(), 4);
/// assert_eq!(order.priority(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: String,
    #[serde(default)]
    origin: Option<Location>,
    destination: Location,
    demand: i32,
    time_window: TimeWindow,
    #[serde(default)]
    service_duration: f64,
    #[serde(default = "default_priority")]
    priority: f64,
    #[serde(default)]
    risk_score: f64,
}

impl Order {
    /// Creates an order with priority 1, no risk and no service time.
    pub fn new(id: impl Into<String>, destination: Location, demand: i32, time_window: TimeWindow) -> Self {
        Self {
            id: id.into(),
            origin: None,
            destination,
            demand,
            time_window,
            service_duration: 0.0,
            priority: default_priority(),
            risk_score: 0.0,
        }
    }

    /// Sets the pickup origin.
    pub fn with_origin(mut self, origin: Location) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the service duration at the destination.
    pub fn with_service_duration(mut self, minutes: f64) -> Self {
        self.service_duration = minutes;
        self
    }

    /// Sets the priority weight.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the disruption risk score.
    pub fn with_risk_score(mut self, risk: f64) -> Self {
        self.risk_score = risk;
        self
    }

    /// Sets the demand.
    pub fn with_demand(mut self, demand: i32) -> Self {
        self.demand = demand;
        self
    }

    /// Order identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Pickup origin, if reported.
    pub fn origin(&self) -> Option<&Location> {
        self.origin.as_ref()
    }

    /// Delivery destination.
    pub fn destination(&self) -> &Location {
        &self.destination
    }

    /// Demand quantity.
    pub fn demand(&self) -> i32 {
        self.demand
    }

    /// Delivery time window.
    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    /// Service duration at the destination.
    pub fn service_duration(&self) -> f64 {
        self.service_duration
    }

    /// Priority weight.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Delay probability in `[0, 1]`.
    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }
}
