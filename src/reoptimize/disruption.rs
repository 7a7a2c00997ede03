//! Disruption signals and problem revision.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, ValidationError, ValidationIssue};
use crate::models::{ProblemModel, VehicleStatus};

/// New risk score for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskUpdate {
    /// Order identifier.
    pub order_id: String,
    /// Updated risk score in `[0, 1]`.
    pub risk_score: f64,
}

/// New demand for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandUpdate {
    /// Order identifier.
    pub order_id: String,
    /// Updated demand.
    pub demand: i32,
}

/// An externally signaled change that may invalidate part of a plan.
///
/// # Examples
///
/// ```
/// use u_logistics::reoptimize::Disruption;
///
/// let d: Disruption = serde_json::from_str(r#"{"unavailable_vehicles": ["v1"]}"#).unwrap();
/// assert!(!d.is_empty());
/// assert!(Disruption::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disruption {
    /// Changed risk scores.
    pub risk_updates: Vec<RiskUpdate>,
    /// Changed demands.
    pub demand_updates: Vec<DemandUpdate>,
    /// Orders withdrawn from the horizon.
    pub cancelled_orders: Vec<String>,
    /// Vehicles taken out of service.
    pub unavailable_vehicles: Vec<String>,
}

impl Disruption {
    /// Returns `true` if the disruption changes nothing.
    pub fn is_empty(&self) -> bool {
        self.risk_updates.is_empty()
            && self.demand_updates.is_empty()
            && self.cancelled_orders.is_empty()
            && self.unavailable_vehicles.is_empty()
    }

    /// Orders whose risk or demand changed, in input order.
    pub fn changed_orders(&self) -> impl Iterator<Item = &str> {
        self.risk_updates
            .iter()
            .map(|u| u.order_id.as_str())
            .chain(self.demand_updates.iter().map(|u| u.order_id.as_str()))
    }
}

impl ProblemModel {
    /// Builds the next snapshot with a disruption applied.
    ///
    /// Cancelled orders are removed, updated fields are overwritten and
    /// unavailable vehicles are marked as such. Identifiers that do not
    /// exist are reported alongside any issue the revised data raises.
    pub fn revise(&self, disruption: &Disruption) -> Result<ProblemModel, ValidationError> {
        let mut issues = Vec::new();
        let mut unknown = |kind: EntityKind, id: &str, exists: bool| {
            if !exists {
                issues.push(ValidationIssue::UnknownEntity {
                    kind,
                    id: id.to_string(),
                });
            }
        };

        for id in disruption.changed_orders().chain(disruption.cancelled_orders.iter().map(String::as_str)) {
            unknown(EntityKind::Order, id, self.order_index(id).is_some());
        }
        for id in &disruption.unavailable_vehicles {
            unknown(EntityKind::Vehicle, id, self.vehicle_index(id).is_some());
        }

        let mut record = self.to_record();
        let cancelled: HashSet<&str> = disruption.cancelled_orders.iter().map(String::as_str).collect();
        record.orders.retain(|o| !cancelled.contains(o.id()));

        for update in &disruption.risk_updates {
            if let Some(order) = record.orders.iter_mut().find(|o| o.id() == update.order_id) {
                *order = order.clone().with_risk_score(update.risk_score);
            }
        }
        for update in &disruption.demand_updates {
            if let Some(order) = record.orders.iter_mut().find(|o| o.id() == update.order_id) {
                *order = order.clone().with_demand(update.demand);
            }
        }
        for id in &disruption.unavailable_vehicles {
            if let Some(vehicle) = record.vehicles.iter_mut().find(|v| v.id() == id) {
                *vehicle = vehicle.clone().with_status(VehicleStatus::Unavailable);
            }
        }

        match ProblemModel::from_record(record) {
            Ok(revised) if issues.is_empty() => Ok(revised),
            Ok(_) => Err(ValidationError::new(issues)),
            Err(err) => {
                issues.extend(err.issues().iter().cloned());
                Err(ValidationError::new(issues))
            }
        }
    }
}
