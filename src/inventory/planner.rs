//! Reorder decisions per inventory position.
//!
//! # Policy
//!
//! With a demand forecast, the reorder point covers lead-time demand plus
//! safety stock:
//!
//! ```text
//! ROP = μ · L + z · σ · √L,   z = Φ⁻¹(service level)
//! ```
//!
//! When costs are known the service level is the newsvendor critical ratio
//! `p / (h + p)` with daily holding cost `h` and stockout cost `p`;
//! otherwise the configured level is used. Without a forecast the
//! position's own reorder point applies.
//!
//! The order quantity is the economic order quantity `√(2DS/H)` when annual
//! demand and costs are known, optionally refined by the exact subsolver
//! over candidates around it. Otherwise the position's fixed reorder
//! quantity is used.
//!
//! The expected cost of a reorder is
//!
//! ```text
//! S + H · SS + p · σ · φ(z)
//! ```
//!
//! where the last term, the expected stockout cost, needs a forecast.

use tracing::{debug, warn};

use super::normal::{inverse_normal_cdf, normal_pdf};
use crate::config::InventoryConfig;
use crate::models::{InventoryPosition, QuantityMethod, ReorderAction};
use crate::subsolver::SubsolverAdapter;

/// Multipliers of the EOQ offered to the exact subsolver.
const EOQ_CANDIDATES: [f64; 5] = [0.5, 0.75, 1.0, 1.25, 1.5];

/// Reorder point and its parts for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderPolicy {
    /// Stock level at or below which to reorder.
    pub reorder_point: f64,
    /// Safety stock included in `reorder_point`.
    pub safety_stock: f64,
    /// Cycle service level used, if derived from a forecast.
    pub service_level: Option<f64>,
}

/// Economic order quantity `√(2DS/H)`.
///
/// Returns `None` unless annual demand and holding cost are positive.
///
/// # Examples
///
/// ```
/// use u_logistics::inventory::economic_order_quantity;
///
/// let q = economic_order_quantity(3650.0, 50.0, 2.0).unwrap();
/// assert!((q - 427.2).abs() < 0.1);
/// assert!(economic_order_quantity(0.0, 50.0, 2.0).is_none());
/// ```
pub fn economic_order_quantity(annual_demand: f64, ordering_cost: f64, holding_cost: f64) -> Option<f64> {
    if annual_demand <= 0.0 || holding_cost <= 0.0 || ordering_cost < 0.0 {
        return None;
    }
    Some((2.0 * annual_demand * ordering_cost / holding_cost).sqrt())
}

/// Safety stock `z · σ · √L`, never negative.
pub fn safety_stock(service_level: f64, std_daily: f64, lead_time_days: f64) -> f64 {
    let level = service_level.clamp(1e-6, 1.0 - 1e-6);
    (inverse_normal_cdf(level) * std_daily * lead_time_days.max(0.0).sqrt()).max(0.0)
}

/// Ordering plus holding cost of the safety stock plus expected stockout
/// cost `p · σ · φ(z)`. Zero without cost parameters.
fn expected_cost(position: &InventoryPosition, policy: &ReorderPolicy) -> f64 {
    let Some(costs) = position.costs() else {
        return 0.0;
    };
    let stockout = match (position.demand(), policy.service_level) {
        (Some(demand), Some(level)) => {
            let z = inverse_normal_cdf(level.clamp(1e-6, 1.0 - 1e-6));
            costs.stockout * demand.std_daily * normal_pdf(z)
        }
        _ => 0.0,
    };
    costs.ordering + costs.holding * policy.safety_stock + stockout
}

/// Decides reorder actions for inventory positions.
#[derive(Debug, Clone, Copy)]
pub struct InventoryPlanner<'a> {
    config: &'a InventoryConfig,
    subsolver: Option<SubsolverAdapter<'a>>,
}

impl<'a> InventoryPlanner<'a> {
    /// Creates a planner without an exact subsolver.
    pub fn new(config: &'a InventoryConfig) -> Self {
        Self {
            config,
            subsolver: None,
        }
    }

    /// Uses `adapter` to choose order quantities.
    pub fn with_subsolver(mut self, adapter: SubsolverAdapter<'a>) -> Self {
        self.subsolver = Some(adapter);
        self
    }

    /// Reorder actions for every position at or below its reorder point.
    pub fn plan(&self, positions: &[InventoryPosition]) -> Vec<ReorderAction> {
        let actions: Vec<ReorderAction> = positions.iter().filter_map(|p| self.decide(p)).collect();
        debug!(positions = positions.len(), reorders = actions.len(), "inventory planned");
        actions
    }

    /// Reorder action for one position, or `None` if stock is sufficient.
    pub fn decide(&self, position: &InventoryPosition) -> Option<ReorderAction> {
        let policy = self.policy(position);
        if !position.needs_reorder_at(policy.reorder_point) {
            return None;
        }
        let (quantity, method) = self.quantity(position);
        let expected_cost = expected_cost(position, &policy);

        Some(ReorderAction {
            item: position.item().to_string(),
            location: position.location().to_string(),
            quantity,
            reorder_point: policy.reorder_point,
            safety_stock: policy.safety_stock,
            expected_cost,
            method,
        })
    }

    /// Reorder point for a position.
    pub fn policy(&self, position: &InventoryPosition) -> ReorderPolicy {
        let Some(demand) = position.demand() else {
            return ReorderPolicy {
                reorder_point: f64::from(position.reorder_point()),
                safety_stock: 0.0,
                service_level: None,
            };
        };

        let level = position
            .costs()
            .and_then(|c| {
                let holding_daily = c.holding / self.config.days_per_year;
                let denominator = holding_daily + c.stockout;
                (denominator > 0.0).then(|| c.stockout / denominator)
            })
            .unwrap_or(self.config.service_level);

        let safety = safety_stock(level, demand.std_daily, demand.lead_time_days);
        ReorderPolicy {
            reorder_point: demand.mean_daily * demand.lead_time_days + safety,
            safety_stock: safety,
            service_level: Some(level),
        }
    }

    fn quantity(&self, position: &InventoryPosition) -> (i32, QuantityMethod) {
        let fixed = (position.reorder_quantity(), QuantityMethod::Fixed);
        let (Some(demand), Some(costs)) = (position.demand(), position.costs()) else {
            return fixed;
        };
        let annual = demand.mean_daily * self.config.days_per_year;
        let Some(eoq) = economic_order_quantity(annual, costs.ordering, costs.holding) else {
            return fixed;
        };
        let eoq_units = (eoq.round() as i32).max(1);

        let Some(adapter) = self.subsolver else {
            return (eoq_units, QuantityMethod::EconomicOrderQuantity);
        };

        let cycle_cost = |q: i32| {
            let q = f64::from(q);
            annual / q * costs.ordering + q / 2.0 * costs.holding
        };
        let mut candidates: Vec<i32> = EOQ_CANDIDATES
            .iter()
            .map(|f| ((eoq * f).round() as i32).max(1))
            .chain((position.reorder_quantity() > 0).then_some(position.reorder_quantity()))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        let options: Vec<(i32, f64)> = candidates.into_iter().map(|q| (q, cycle_cost(q))).collect();

        match adapter.reorder_quantity(&options) {
            Ok(quantity) => (quantity, QuantityMethod::Exact),
            Err(err) => {
                warn!(position = %position.key(), %err, "exact reorder quantity unavailable, using EOQ");
                (eoq_units, QuantityMethod::EconomicOrderQuantity)
            }
        }
    }
}
