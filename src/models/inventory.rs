//! Inventory position types.

use serde::{Deserialize, Serialize};

/// Forecast of daily demand for an item at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    /// Mean daily demand.
    pub mean_daily: f64,
    /// Standard deviation of daily demand.
    pub std_daily: f64,
    /// Replenishment lead time in days.
    pub lead_time_days: f64,
}

/// Inventory cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryCosts {
    /// Holding cost per unit per year.
    pub holding: f64,
    /// Fixed cost per replenishment order.
    pub ordering: f64,
    /// Cost per unit short.
    pub stockout: f64,
}

/// Stock of one item at one depot.
///
/// The pair `(item, location)` identifies a position.
///
/// # Examples
///
/// ```
/// use u_logistics::models::InventoryPosition;
///
/// let p = InventoryPosition::new("sku-1", "d0", 12, 20, 50);
/// assert!(p.needs_reorder_at(p.reorder_point() as f64));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPosition {
    item: String,
    location: String,
    stock: i32,
    reorder_point: i32,
    reorder_quantity: i32,
    #[serde(default)]
    demand: Option<DemandForecast>,
    #[serde(default)]
    costs: Option<InventoryCosts>,
}

impl InventoryPosition {
    /// Creates a position with a fixed reorder policy.
    pub fn new(
        item: impl Into<String>,
        location: impl Into<String>,
        stock: i32,
        reorder_point: i32,
        reorder_quantity: i32,
    ) -> Self {
        Self {
            item: item.into(),
            location: location.into(),
            stock,
            reorder_point,
            reorder_quantity,
            demand: None,
            costs: None,
        }
    }

    /// Attaches a demand forecast.
    pub fn with_demand(mut self, demand: DemandForecast) -> Self {
        self.demand = Some(demand);
        self
    }

    /// Attaches cost parameters.
    pub fn with_costs(mut self, costs: InventoryCosts) -> Self {
        self.costs = Some(costs);
        self
    }

    /// Item identifier.
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Depot identifier holding the stock.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Units on hand.
    pub fn stock(&self) -> i32 {
        self.stock
    }

    /// Configured reorder point.
    pub fn reorder_point(&self) -> i32 {
        self.reorder_point
    }

    /// Configured reorder quantity.
    pub fn reorder_quantity(&self) -> i32 {
        self.reorder_quantity
    }

    /// Demand forecast, if supplied.
    pub fn demand(&self) -> Option<&DemandForecast> {
        self.demand.as_ref()
    }

    /// Cost parameters, if supplied.
    pub fn costs(&self) -> Option<&InventoryCosts> {
        self.costs.as_ref()
    }

    /// Returns `true` if the stock is at or below `reorder_point`.
    pub fn needs_reorder_at(&self, reorder_point: f64) -> bool {
        f64::from(self.stock) <= reorder_point
    }

    /// Display key `item@location`.
    pub fn key(&self) -> String {
        format!("{}@{}", self.item, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_reorder_trigger() {
        let p = InventoryPosition::new("a", "d0", 10, 15, 40);
        assert!(p.needs_reorder_at(15.0));
        assert!(!p.needs_reorder_at(9.5));
        assert_eq!(p.key(), "a@d0");
    }
}
