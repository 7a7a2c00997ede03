//! Validated problem snapshot.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Depot, InventoryPosition, Location, Order, TimeWindow, Vehicle};
use crate::distance::DistanceMatrix;
use crate::error::{EntityKind, ValidationError, ValidationIssue};

/// Raw input record: one list per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    /// Depots.
    #[serde(default)]
    pub depots: Vec<Depot>,
    /// Vehicles.
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    /// Orders.
    #[serde(default)]
    pub orders: Vec<Order>,
    /// Inventory positions.
    #[serde(default)]
    pub inventory: Vec<InventoryPosition>,
}

/// Read-only snapshot of one planning horizon.
///
/// Entities are addressed by dense indices in input order. The distance
/// matrix holds depots first (`0..num_depots`) followed by order
/// destinations, see [`ProblemModel::order_location`].
///
/// # Examples
///
/// ```
/// use u_logistics::models::{Depot, Location, Order, ProblemModel, TimeWindow, Vehicle};
///
/// let problem = ProblemModel::new(
///     vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
///     vec![Vehicle::new("v0", "d0", 10)],
///     vec![Order::new("o1", Location::new(3.0, 4.0), 2, TimeWindow::new(0.0, 60.0).unwrap())],
///     vec![],
/// )
/// .unwrap();
/// assert_eq!(problem.num_orders(), 1);
/// assert!((problem.distance(0, problem.order_location(0)) - 5.0).abs() < 1e-10);
///
/// let bad = ProblemModel::new(
///     vec![Depot::new("d0", Location::new(0.0, 0.0), -1)],
///     vec![Vehicle::new("v0", "nowhere", -5)],
///     vec![],
///     vec![],
/// );
/// assert_eq!(bad.unwrap_err().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemModel {
    depots: Vec<Depot>,
    vehicles: Vec<Vehicle>,
    orders: Vec<Order>,
    inventory: Vec<InventoryPosition>,
    distances: DistanceMatrix,
    vehicle_depot: Vec<usize>,
    depot_index: HashMap<String, usize>,
    vehicle_index: HashMap<String, usize>,
    order_index: HashMap<String, usize>,
}

impl ProblemModel {
    /// Validates the entities and builds the snapshot.
    ///
    /// Collects every violation before failing.
    pub fn new(
        depots: Vec<Depot>,
        vehicles: Vec<Vehicle>,
        orders: Vec<Order>,
        inventory: Vec<InventoryPosition>,
    ) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();

        let depot_index = index_ids(EntityKind::Depot, depots.iter().map(Depot::id), &mut issues);
        let vehicle_index = index_ids(EntityKind::Vehicle, vehicles.iter().map(Vehicle::id), &mut issues);
        let order_index = index_ids(EntityKind::Order, orders.iter().map(Order::id), &mut issues);

        for depot in &depots {
            validate_depot(depot, &mut issues);
        }
        for vehicle in &vehicles {
            validate_vehicle(vehicle, &depot_index, &mut issues);
        }
        for order in &orders {
            validate_order(order, &mut issues);
        }
        let mut seen_positions = HashSet::new();
        for position in &inventory {
            if !seen_positions.insert((position.item(), position.location())) {
                issues.push(ValidationIssue::DuplicateId {
                    kind: EntityKind::Inventory,
                    id: position.key(),
                });
            }
            validate_position(position, &depot_index, &mut issues);
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        let vehicle_depot = vehicles
            .iter()
            .map(|v| depot_index[v.depot_id()])
            .collect();

        let locations: Vec<Location> = depots
            .iter()
            .map(|d| *d.location())
            .chain(orders.iter().map(|o| *o.destination()))
            .collect();
        let distances = DistanceMatrix::from_locations(&locations);

        Ok(Self {
            depots,
            vehicles,
            orders,
            inventory,
            distances,
            vehicle_depot,
            depot_index,
            vehicle_index,
            order_index,
        })
    }

    /// Validates and builds a snapshot from an input record.
    pub fn from_record(record: ProblemRecord) -> Result<Self, ValidationError> {
        Self::new(record.depots, record.vehicles, record.orders, record.inventory)
    }

    /// Copies the snapshot back into a record.
    pub fn to_record(&self) -> ProblemRecord {
        ProblemRecord {
            depots: self.depots.clone(),
            vehicles: self.vehicles.clone(),
            orders: self.orders.clone(),
            inventory: self.inventory.clone(),
        }
    }

    /// All depots.
    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    /// All vehicles.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// All orders.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// All inventory positions.
    pub fn inventory(&self) -> &[InventoryPosition] {
        &self.inventory
    }

    /// Distance matrix over depots and order destinations.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Number of orders.
    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Depot index of vehicle `vehicle`.
    pub fn vehicle_depot(&self, vehicle: usize) -> usize {
        self.vehicle_depot[vehicle]
    }

    /// Matrix index of depot `depot`.
    pub fn depot_location(&self, depot: usize) -> usize {
        depot
    }

    /// Matrix index of order `order`'s destination.
    pub fn order_location(&self, order: usize) -> usize {
        self.depots.len() + order
    }

    /// Distance between two matrix indices.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// Index of the depot with the given identifier.
    pub fn depot_index(&self, id: &str) -> Option<usize> {
        self.depot_index.get(id).copied()
    }

    /// Index of the vehicle with the given identifier.
    pub fn vehicle_index(&self, id: &str) -> Option<usize> {
        self.vehicle_index.get(id).copied()
    }

    /// Index of the order with the given identifier.
    pub fn order_index(&self, id: &str) -> Option<usize> {
        self.order_index.get(id).copied()
    }
}

pub(crate) fn index_ids<'a>(
    kind: EntityKind,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationIssue>,
) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.to_string(), i).is_some() {
            issues.push(ValidationIssue::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    index
}

pub(crate) fn check_non_negative(
    kind: EntityKind,
    id: &str,
    field: &'static str,
    value: f64,
    issues: &mut Vec<ValidationIssue>,
) {
    if value < 0.0 || value.is_nan() {
        issues.push(ValidationIssue::NegativeValue {
            kind,
            id: id.to_string(),
            field,
            value,
        });
    }
}

fn check_window(
    kind: EntityKind,
    id: &str,
    field: &'static str,
    window: &TimeWindow,
    issues: &mut Vec<ValidationIssue>,
) {
    if !window.is_well_formed() {
        issues.push(ValidationIssue::MalformedTimeWindow {
            kind,
            id: id.to_string(),
            field,
            earliest: window.earliest(),
            latest: window.latest(),
        });
    }
}

pub(crate) fn check_range(
    kind: EntityKind,
    id: &str,
    field: &'static str,
    value: f64,
    valid: bool,
    issues: &mut Vec<ValidationIssue>,
) {
    if !valid {
        issues.push(ValidationIssue::OutOfRange {
            kind,
            id: id.to_string(),
            field,
            value,
        });
    }
}

fn validate_depot(depot: &Depot, issues: &mut Vec<ValidationIssue>) {
    let kind = EntityKind::Depot;
    check_non_negative(kind, depot.id(), "capacity", f64::from(depot.capacity()), issues);
    if let Some(hours) = depot.hours() {
        check_window(kind, depot.id(), "hours", hours, issues);
    }
    let loc = depot.location();
    check_range(kind, depot.id(), "location", loc.x, loc.is_finite(), issues);
}

fn validate_vehicle(
    vehicle: &Vehicle,
    depots: &HashMap<String, usize>,
    issues: &mut Vec<ValidationIssue>,
) {
    let kind = EntityKind::Vehicle;
    let id = vehicle.id();
    if !depots.contains_key(vehicle.depot_id()) {
        issues.push(ValidationIssue::UnknownDepot {
            kind,
            id: id.to_string(),
            depot_id: vehicle.depot_id().to_string(),
        });
    }
    check_non_negative(kind, id, "capacity", f64::from(vehicle.capacity()), issues);
    check_non_negative(kind, id, "cost_per_distance", vehicle.cost_per_distance(), issues);
    check_non_negative(kind, id, "fixed_cost", vehicle.fixed_cost(), issues);
    if let Some(max) = vehicle.max_distance() {
        check_non_negative(kind, id, "max_distance", max, issues);
    }
    if let Some(max) = vehicle.max_duration() {
        check_non_negative(kind, id, "max_duration", max, issues);
    }
    if let Some(window) = vehicle.availability() {
        check_window(kind, id, "availability", window, issues);
    }
    let speed = vehicle.speed();
    let base = speed.base_speed();
    check_range(kind, id, "speed", base, base.is_finite() && base > 0.0, issues);
    for band in speed.bands() {
        let factor_ok = band.factor.is_finite() && band.factor > 0.0 && band.from.is_finite();
        check_range(kind, id, "speed factor", band.factor, factor_ok, issues);
    }
}

fn validate_order(order: &Order, issues: &mut Vec<ValidationIssue>) {
    let kind = EntityKind::Order;
    let id = order.id();
    check_non_negative(kind, id, "demand", f64::from(order.demand()), issues);
    check_non_negative(kind, id, "service_duration", order.service_duration(), issues);
    check_non_negative(kind, id, "priority", order.priority(), issues);
    check_window(kind, id, "time_window", order.time_window(), issues);
    let risk = order.risk_score();
    check_range(kind, id, "risk_score", risk, (0.0..=1.0).contains(&risk), issues);
    let dest = order.destination();
    check_range(kind, id, "destination", dest.x, dest.is_finite(), issues);
}

fn validate_position(
    position: &InventoryPosition,
    depots: &HashMap<String, usize>,
    issues: &mut Vec<ValidationIssue>,
) {
    let kind = EntityKind::Inventory;
    let id = position.key();
    if !depots.contains_key(position.location()) {
        issues.push(ValidationIssue::UnknownDepot {
            kind,
            id: id.clone(),
            depot_id: position.location().to_string(),
        });
    }
    check_non_negative(kind, &id, "stock", f64::from(position.stock()), issues);
    check_non_negative(kind, &id, "reorder_point", f64::from(position.reorder_point()), issues);
    check_non_negative(kind, &id, "reorder_quantity", f64::from(position.reorder_quantity()), issues);
    if let Some(demand) = position.demand() {
        check_non_negative(kind, &id, "mean_daily", demand.mean_daily, issues);
        check_non_negative(kind, &id, "std_daily", demand.std_daily, issues);
        check_non_negative(kind, &id, "lead_time_days", demand.lead_time_days, issues);
    }
    if let Some(costs) = position.costs() {
        check_non_negative(kind, &id, "holding", costs.holding, issues);
        check_non_negative(kind, &id, "ordering", costs.ordering, issues);
        check_non_negative(kind, &id, "stockout", costs.stockout, issues);
    }
}
