//! Engine configuration.
//!
//! Every section deserializes with defaults for missing fields, so a
//! partial JSON document such as `{"search": {"workers": 4}}` is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Cost model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Penalty per unassigned order. Must dominate any feasible route cost.
    pub unassigned_penalty: f64,
    /// Minutes an arrival may exceed an order's latest time before the
    /// position becomes infeasible. Lateness within the tolerance is
    /// penalized.
    pub max_lateness: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            unassigned_penalty: 1.0e6,
            max_lateness: 0.0,
        }
    }
}

impl CostConfig {
    /// Sets the unassigned penalty.
    pub fn with_unassigned_penalty(mut self, penalty: f64) -> Self {
        self.unassigned_penalty = penalty;
        self
    }

    /// Sets the lateness tolerance.
    pub fn with_max_lateness(mut self, minutes: f64) -> Self {
        self.max_lateness = minutes.max(0.0);
        self
    }
}

/// Local search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Wall-clock budget in milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Starting temperature. Derived from route costs when absent.
    pub initial_temperature: Option<f64>,
    /// Temperature reached at the end of the iteration budget.
    pub final_temperature: f64,
    /// RNG seed.
    pub seed: u64,
    /// Worker threads for route-partitioned search; 1 runs serially.
    pub workers: usize,
    /// Partition rounds in parallel mode.
    pub rounds: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            time_limit_ms: None,
            initial_temperature: None,
            final_temperature: 0.01,
            seed: 42,
            workers: 1,
            rounds: 4,
        }
    }
}

impl SearchConfig {
    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Sets the starting temperature.
    pub fn with_initial_temperature(mut self, temperature: f64) -> Self {
        self.initial_temperature = Some(temperature.max(1e-9));
        self
    }

    /// Sets the final temperature.
    pub fn with_final_temperature(mut self, temperature: f64) -> Self {
        self.final_temperature = temperature.max(1e-9);
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the number of partition rounds.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Wall-clock budget, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Exact subsolver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsolverConfig {
    /// Largest route (in stops) handed to the solver.
    pub max_route_size: usize,
    /// Time limit per solver call in milliseconds.
    pub time_limit_ms: u64,
    /// Re-sequence small routes after local search.
    pub polish_routes: bool,
    /// Largest slot-scheduling model (in binary variables) handed to the
    /// solver.
    pub max_schedule_variables: usize,
}

impl Default for SubsolverConfig {
    fn default() -> Self {
        Self {
            max_route_size: 7,
            time_limit_ms: 1000,
            polish_routes: true,
            max_schedule_variables: 5000,
        }
    }
}

impl SubsolverConfig {
    /// Sets the route size threshold.
    pub fn with_max_route_size(mut self, stops: usize) -> Self {
        self.max_route_size = stops;
        self
    }

    /// Sets the slot-scheduling size threshold.
    pub fn with_max_schedule_variables(mut self, variables: usize) -> Self {
        self.max_schedule_variables = variables;
        self
    }

    /// Sets the per-call time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = limit.as_millis() as u64;
        self
    }

    /// Per-call time limit.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// Inventory policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Cycle service level used when no cost parameters are given.
    pub service_level: f64,
    /// Days per year for annualizing demand.
    pub days_per_year: f64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            service_level: 0.95,
            days_per_year: 365.0,
        }
    }
}

impl InventoryConfig {
    /// Sets the service level, clamped to `(0, 1)`.
    pub fn with_service_level(mut self, level: f64) -> Self {
        self.service_level = level.clamp(1e-6, 1.0 - 1e-6);
        self
    }
}

/// Full engine configuration.
///
/// # Examples
///
/// ```
/// use u_logistics::config::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{"search": {"workers": 4, "seed": 7}}"#).unwrap();
/// assert_eq!(config.search.workers, 4);
/// assert_eq!(config.search.max_iterations, 2000);
/// assert_eq!(config.cost.unassigned_penalty, 1.0e6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cost model.
    pub cost: CostConfig,
    /// Local search.
    pub search: SearchConfig,
    /// Exact subsolver.
    pub subsolver: SubsolverConfig,
    /// Inventory policy.
    pub inventory: InventoryConfig,
}

impl EngineConfig {
    /// Parses a configuration document.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the cost section.
    pub fn with_cost(mut self, cost: CostConfig) -> Self {
        self.cost = cost;
        self
    }

    /// Sets the search section.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Sets the subsolver section.
    pub fn with_subsolver(mut self, subsolver: SubsolverConfig) -> Self {
        self.subsolver = subsolver;
        self
    }

    /// Sets the inventory section.
    pub fn with_inventory(mut self, inventory: InventoryConfig) -> Self {
        self.inventory = inventory;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cost.max_lateness, 0.0);
        assert_eq!(config.search.workers, 1);
        assert!(config.search.time_limit().is_none());
        assert_eq!(config.subsolver.max_route_size, 7);
        assert!((config.inventory.service_level - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"cost": {"max_lateness": 15.0}}"#).expect("parses");
        assert_eq!(config.cost.max_lateness, 15.0);
        assert_eq!(config.cost.unassigned_penalty, 1.0e6);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{\"search\": 3}"),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn test_builders_clamp() {
        let search = SearchConfig::default()
            .with_workers(0)
            .with_rounds(0)
            .with_time_limit(Duration::from_millis(250));
        assert_eq!(search.workers, 1);
        assert_eq!(search.rounds, 1);
        assert_eq!(search.time_limit(), Some(Duration::from_millis(250)));
        let inv = InventoryConfig::default().with_service_level(1.5);
        assert!(inv.service_level < 1.0);
    }
}
