//! Bounded repair of a prior plan after a disruption.
//!
//! # Algorithm
//!
//! 1. Rebuild the prior plan's routes against the revised problem.
//!    Cancelled orders disappear with the revision.
//! 2. Mark as touched every vehicle that became unavailable and every route
//!    that held a cancelled order or an order whose risk or demand changed.
//! 3. Displace the orders of unavailable vehicles and orders whose demand
//!    changed.
//! 4. Re-insert displaced orders into the touched routes plus the empty
//!    routes of available vehicles, then anneal within that scope.
//!
//! Routes outside the scope are carried over unchanged. Displaced orders
//! that fit nowhere in scope are reported as stranded so the caller can
//! escalate to a full replan.

use std::collections::HashSet;

use tracing::debug;

use super::disruption::Disruption;
use crate::config::SearchConfig;
use crate::constructive::InsertionBuilder;
use crate::evaluation::{draft_from_plan, RouteEvaluator};
use crate::local_search::{Annealer, Budget};
use crate::models::{Plan, PlanDraft, ProblemModel, RouteScope};

/// How a disruption was absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReoptOutcome {
    /// Nothing changed; the prior plan is returned as is.
    Unchanged,
    /// Only the listed vehicles' routes were modified.
    Bounded {
        /// Identifiers of the vehicles whose routes were touched.
        touched: Vec<String>,
    },
    /// Bounded repair could not place every displaced order, so the whole
    /// plan was rebuilt.
    Escalated {
        /// Identifiers of the orders the bounded repair left stranded.
        stranded: Vec<String>,
    },
}

/// Result of re-planning after a disruption.
#[derive(Debug, Clone)]
pub struct Reoptimization {
    /// Revised problem snapshot the plan refers to.
    pub problem: ProblemModel,
    /// Repaired or rebuilt plan.
    pub plan: Plan,
    /// How the disruption was absorbed.
    pub outcome: ReoptOutcome,
}

/// Outcome of a bounded repair.
#[derive(Debug, Clone)]
pub struct RepairResult {
    /// Repaired draft over the revised problem.
    pub draft: PlanDraft,
    /// Vehicles whose routes the disruption touched or the repair changed,
    /// ascending.
    pub touched: Vec<usize>,
    /// Orders taken off their routes.
    pub displaced: Vec<usize>,
    /// Displaced orders that could not be placed again.
    pub stranded: Vec<usize>,
}

/// Repairs a prior plan within the routes a disruption affects.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRepair<'a> {
    evaluator: RouteEvaluator<'a>,
    search: &'a SearchConfig,
}

impl<'a> BoundedRepair<'a> {
    /// Creates a repair over the revised problem held by `evaluator`.
    pub fn new(evaluator: RouteEvaluator<'a>, search: &'a SearchConfig) -> Self {
        Self { evaluator, search }
    }

    /// Repairs `prior` after `disruption`.
    pub fn run(&self, prior: &Plan, disruption: &Disruption, budget: &Budget) -> RepairResult {
        let problem = self.evaluator.problem();
        let num_vehicles = problem.num_vehicles();
        let (mut draft, fresh) = draft_from_plan(problem, prior);
        let original = draft.clone();

        let changed: HashSet<&str> = disruption
            .changed_orders()
            .chain(disruption.cancelled_orders.iter().map(String::as_str))
            .collect();
        let demand_changed: HashSet<&str> = disruption
            .demand_updates
            .iter()
            .map(|u| u.order_id.as_str())
            .collect();

        let mut touched = vec![false; num_vehicles];
        for route in prior.routes() {
            let Some(vehicle) = problem.vehicle_index(route.vehicle_id()) else {
                continue;
            };
            if route.stops().iter().any(|s| changed.contains(s.order_id.as_str())) {
                touched[vehicle] = true;
            }
        }

        let mut displaced = fresh;
        for id in &disruption.unavailable_vehicles {
            if let Some(vehicle) = problem.vehicle_index(id) {
                touched[vehicle] = true;
                displaced.extend(draft.take_route(vehicle));
            }
        }
        for vehicle in 0..num_vehicles {
            let (moved, kept): (Vec<usize>, Vec<usize>) = draft
                .route(vehicle)
                .iter()
                .partition(|&&o| demand_changed.contains(problem.orders()[o].id()));
            if !moved.is_empty() {
                draft.set_route(vehicle, kept);
                displaced.extend(moved);
            }
        }

        let scope = RouteScope::only(
            num_vehicles,
            (0..num_vehicles).filter(|&v| {
                touched[v] || (draft.route(v).is_empty() && problem.vehicles()[v].is_available())
            }),
        );
        debug!(
            touched = touched.iter().filter(|&&t| t).count(),
            displaced = displaced.len(),
            scope = scope.len(),
            "bounded repair scope"
        );

        InsertionBuilder::new(self.evaluator).insert_orders(&mut draft, &displaced, &scope);
        let displaced_set: HashSet<usize> = displaced.iter().copied().collect();
        let stranded: Vec<usize> = draft
            .unassigned()
            .iter()
            .map(|&(o, _)| o)
            .filter(|o| displaced_set.contains(o))
            .collect();

        if stranded.is_empty() {
            let outcome = Annealer::new(self.evaluator, self.search).improve(
                draft,
                &scope,
                budget,
                self.search.seed,
                true,
            );
            draft = outcome.draft;
        }

        let touched = (0..num_vehicles)
            .filter(|&v| touched[v] || draft.route(v) != original.route(v))
            .collect();

        RepairResult {
            draft,
            touched,
            displaced,
            stranded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostConfig;
    use crate::models::{Depot, Location, Order, TimeWindow, Vehicle};
    use crate::reoptimize::DemandUpdate;

    fn base_problem() -> ProblemModel {
        let tw = TimeWindow::new(0.0, 1000.0).expect("valid");
        ProblemModel::new(
            vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
            vec![
                Vehicle::new("v0", "d0", 10).with_fixed_cost(100.0),
                Vehicle::new("v1", "d0", 10).with_fixed_cost(100.0),
                Vehicle::new("v2", "d0", 10).with_fixed_cost(100.0),
            ],
            vec![
                Order::new("e1", Location::new(10.0, 0.0), 5, tw),
                Order::new("e2", Location::new(20.0, 0.0), 5, tw),
                Order::new("w1", Location::new(-10.0, 0.0), 5, tw),
                Order::new("w2", Location::new(-20.0, 0.0), 5, tw),
            ],
            vec![],
        )
        .expect("valid")
    }

    fn prior_plan(problem: &ProblemModel, costs: &CostConfig) -> Plan {
        let eval = RouteEvaluator::new(problem, costs);
        eval.assemble(&PlanDraft::from_routes(vec![vec![0, 1], vec![2, 3], vec![]]), vec![])
    }

    #[test]
    fn test_unavailable_vehicle_moves_to_spare() {
        let problem = base_problem();
        let costs = CostConfig::default();
        let prior = prior_plan(&problem, &costs);
        let disruption = Disruption {
            unavailable_vehicles: vec!["v0".into()],
            ..Disruption::default()
        };
        let revised = problem.revise(&disruption).expect("valid");
        let eval = RouteEvaluator::new(&revised, &costs);
        let search = SearchConfig::default();
        let result = BoundedRepair::new(eval, &search).run(&prior, &disruption, &Budget::iterations(200));

        assert!(result.stranded.is_empty());
        assert!(result.draft.route(0).is_empty());
        assert_eq!(result.draft.route(1), &[2, 3]);
        let mut spare = result.draft.route(2).to_vec();
        spare.sort_unstable();
        assert_eq!(spare, vec![0, 1]);
        assert_eq!(result.touched, vec![0, 2]);
    }

    #[test]
    fn test_demand_change_strands_order() {
        let problem = base_problem();
        let costs = CostConfig::default();
        let prior = prior_plan(&problem, &costs);
        let disruption = Disruption {
            demand_updates: vec![DemandUpdate {
                order_id: "e2".into(),
                demand: 11,
            }],
            ..Disruption::default()
        };
        let revised = problem.revise(&disruption).expect("valid");
        let eval = RouteEvaluator::new(&revised, &costs);
        let search = SearchConfig::default();
        let result = BoundedRepair::new(eval, &search).run(&prior, &disruption, &Budget::iterations(50));
        assert_eq!(result.displaced, vec![1]);
        assert_eq!(result.stranded, vec![1]);
        assert_eq!(result.draft.route(1), &[2, 3]);
    }

    #[test]
    fn test_cancelled_order_shrinks_route() {
        let problem = base_problem();
        let costs = CostConfig::default();
        let prior = prior_plan(&problem, &costs);
        let disruption = Disruption {
            cancelled_orders: vec!["w1".into()],
            ..Disruption::default()
        };
        let revised = problem.revise(&disruption).expect("valid");
        let eval = RouteEvaluator::new(&revised, &costs);
        let search = SearchConfig::default();
        let result = BoundedRepair::new(eval, &search).run(&prior, &disruption, &Budget::iterations(100));
        // w2 is index 2 after the revision removes w1
        assert_eq!(revised.orders()[2].id(), "w2");
        assert!(result.draft.route(0).len() == 2);
        assert_eq!(result.draft.num_assigned(), 3);
        assert!(result.touched.contains(&1));
        assert!(result.displaced.is_empty());
    }
}
