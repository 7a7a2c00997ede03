//! Inventory replenishment decisions.
//!
//! - [`InventoryPlanner`] — reorder point, safety stock and order quantity
//!   per position
//! - [`economic_order_quantity`] — classic EOQ (Harris, 1913)
//! - [`inverse_normal_cdf`] — service level to safety factor
//! - [`normal_pdf`] — density used for the expected stockout cost

mod normal;
mod planner;

pub use normal::{inverse_normal_cdf, normal_pdf};
pub use planner::{economic_order_quantity, safety_stock, InventoryPlanner, ReorderPolicy};
