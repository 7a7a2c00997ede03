//! Vehicle type with capacity, speed and cost parameters.

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// Operational status of a vehicle at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// Parked and free to be dispatched.
    #[default]
    Idle,
    /// Currently driving; may still take new work.
    EnRoute,
    /// Out of service for this cycle.
    Unavailable,
}

/// A speed multiplier that applies from `from` until the next band starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    /// Start of the band, in minutes.
    pub from: f64,
    /// Multiplier applied to the base speed.
    pub factor: f64,
}

/// Time-dependent vehicle speed.
///
/// Travel time is `distance / (base_speed * factor)` where the factor is the
/// one active at departure. A leg is not split across bands.
///
/// # Examples
///
/// ```
/// use u_logistics::models::SpeedProfile;
///
/// let profile = SpeedProfile::constant(2.0).with_band(60.0, 0.5);
/// assert_eq!(profile.travel_time(10.0, 0.0), 5.0);
/// assert_eq!(profile.travel_time(10.0, 90.0), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfile {
    base_speed: f64,
    #[serde(default)]
    bands: Vec<SpeedBand>,
}

impl SpeedProfile {
    /// A profile with a single constant speed.
    pub fn constant(speed: f64) -> Self {
        Self {
            base_speed: speed,
            bands: Vec::new(),
        }
    }

    /// Adds a band, keeping bands ordered by start time.
    pub fn with_band(mut self, from: f64, factor: f64) -> Self {
        self.bands.push(SpeedBand { from, factor });
        self.bands.sort_by(|a, b| a.from.total_cmp(&b.from));
        self
    }

    /// Base speed in distance units per minute.
    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    /// Configured bands.
    pub fn bands(&self) -> &[SpeedBand] {
        &self.bands
    }

    /// Effective speed at time `at`.
    ///
    /// The active band is the one with the latest start at or before `at`,
    /// whatever order the bands were given in.
    pub fn speed_at(&self, at: f64) -> f64 {
        let factor = self
            .bands
            .iter()
            .filter(|band| band.from <= at)
            .max_by(|a, b| a.from.total_cmp(&b.from))
            .map_or(1.0, |band| band.factor);
        self.base_speed * factor
    }

    /// Minutes needed to cover `distance` when departing at `departure`.
    pub fn travel_time(&self, distance: f64, departure: f64) -> f64 {
        distance / self.speed_at(departure)
    }
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self::constant(1.0)
    }
}

fn default_cost_per_distance() -> f64 {
    1.0
}

/// A vehicle that serves one route per planning cycle.
///
/// # Examples
///
/// ```
/// use u_logistics::models::{Vehicle, VehicleStatus};
///
/// let v = Vehicle::new("v1", "d1", 200).with_cost_per_distance(1.5);
/// assert_eq!(v.capacity(), 200);
/// assert_eq!(v.status(), VehicleStatus::Idle);
/// assert!(v.is_available());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    id: String,
    depot_id: String,
    capacity: i32,
    #[serde(default)]
    speed: SpeedProfile,
    #[serde(default = "default_cost_per_distance")]
    cost_per_distance: f64,
    #[serde(default)]
    fixed_cost: f64,
    #[serde(default)]
    availability: Option<TimeWindow>,
    #[serde(default)]
    status: VehicleStatus,
    #[serde(default)]
    max_distance: Option<f64>,
    #[serde(default)]
    max_duration: Option<f64>,
}

impl Vehicle {
    /// Creates an idle vehicle at the given depot.
    ///
    /// Default: speed 1, cost_per_distance 1, no fixed cost, always
    /// available, no distance/duration limits.
    pub fn new(id: impl Into<String>, depot_id: impl Into<String>, capacity: i32) -> Self {
        Self {
            id: id.into(),
            depot_id: depot_id.into(),
            capacity,
            speed: SpeedProfile::default(),
            cost_per_distance: default_cost_per_distance(),
            fixed_cost: 0.0,
            availability: None,
            status: VehicleStatus::Idle,
            max_distance: None,
            max_duration: None,
        }
    }

    /// Sets the speed profile.
    pub fn with_speed(mut self, speed: SpeedProfile) -> Self {
        self.speed = speed;
        self
    }

    /// Sets cost per unit distance.
    pub fn with_cost_per_distance(mut self, cost: f64) -> Self {
        self.cost_per_distance = cost;
        self
    }

    /// Sets fixed cost charged when the vehicle is used.
    pub fn with_fixed_cost(mut self, cost: f64) -> Self {
        self.fixed_cost = cost;
        self
    }

    /// Sets the availability window.
    pub fn with_availability(mut self, window: TimeWindow) -> Self {
        self.availability = Some(window);
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets maximum route distance.
    pub fn with_max_distance(mut self, max: f64) -> Self {
        self.max_distance = Some(max);
        self
    }

    /// Sets maximum route duration.
    pub fn with_max_duration(mut self, max: f64) -> Self {
        self.max_duration = Some(max);
        self
    }

    /// Vehicle identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Home depot identifier.
    pub fn depot_id(&self) -> &str {
        &self.depot_id
    }

    /// Maximum load.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Speed profile.
    pub fn speed(&self) -> &SpeedProfile {
        &self.speed
    }

    /// Cost per unit distance traveled.
    pub fn cost_per_distance(&self) -> f64 {
        self.cost_per_distance
    }

    /// Fixed cost when used.
    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }

    /// Availability window, if restricted.
    pub fn availability(&self) -> Option<&TimeWindow> {
        self.availability.as_ref()
    }

    /// Current status.
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Returns `true` unless the vehicle is unavailable.
    pub fn is_available(&self) -> bool {
        self.status != VehicleStatus::Unavailable
    }

    /// Maximum distance limit, if any.
    pub fn max_distance(&self) -> Option<f64> {
        self.max_distance
    }

    /// Maximum duration limit, if any.
    pub fn max_duration(&self) -> Option<f64> {
        self.max_duration
    }
}
