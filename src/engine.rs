//! Planning cycle driver.
//!
//! One cycle runs the stages in order:
//!
//! 1. [`InsertionBuilder`] constructs an initial draft.
//! 2. [`RouteSearch`] improves it under the cycle's [`Budget`].
//! 3. With an [`ExactSolver`] plugged in, short routes are re-sequenced by
//!    the [`SubsolverAdapter`]. A result is kept only if it is feasible and
//!    cheaper.
//! 4. [`InventoryPlanner`] decides reorder actions.
//! 5. The draft is re-verified and assembled into a [`Plan`].
//!
//! [`Engine::reoptimize`] re-enters the pipeline with a prior plan as warm
//! start and repairs it within the routes a [`Disruption`] touches.
//! [`Engine::schedule`] places delivery tasks on drivers and dock slots.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::constructive::InsertionBuilder;
use crate::error::ValidationError;
use crate::evaluation::RouteEvaluator;
use crate::inventory::InventoryPlanner;
use crate::local_search::{Budget, RouteSearch};
use crate::models::{Plan, PlanDraft, ProblemModel, ProblemRecord, ReorderAction, RouteScope};
use crate::reoptimize::{BoundedRepair, Disruption, ReoptOutcome, Reoptimization};
use crate::scheduling::{Schedule, ScheduleRequest, SlotScheduler};
use crate::subsolver::{ExactSolver, SubsolverAdapter};

/// Tolerance for accepting a re-sequenced route as cheaper.
const POLISH_EPS: f64 = 1e-9;

/// Prescriptive planning engine.
///
/// # Examples
///
/// ```
/// use u_logistics::config::EngineConfig;
/// use u_logistics::engine::Engine;
/// use u_logistics::models::{Depot, Location, Order, ProblemModel, TimeWindow, Vehicle};
///
/// let tw = TimeWindow::new(0.0, 480.0).unwrap();
/// let problem = ProblemModel::new(
///     vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
///     vec![Vehicle::new("v0", "d0", 10)],
///     vec![
///         Order::new("o1", Location::new(3.0, 4.0), 3, tw),
///         Order::new("o2", Location::new(6.0, 8.0), 3, tw),
///     ],
///     vec![],
/// )
/// .unwrap();
///
/// let plan = Engine::new(EngineConfig::default()).plan(&problem);
/// assert!(plan.is_feasible());
/// assert_eq!(plan.num_assigned(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    solver: Option<Arc<dyn ExactSolver>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("solver", &self.solver.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Engine {
    /// Creates an engine without an exact solver.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            solver: None,
        }
    }

    /// Plugs in an exact solver for route polishing and reorder quantities.
    pub fn with_solver(mut self, solver: Arc<dyn ExactSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates a raw record and plans it.
    pub fn solve(&self, record: ProblemRecord) -> Result<(ProblemModel, Plan), ValidationError> {
        let problem = ProblemModel::from_record(record)?;
        let plan = self.plan(&problem);
        Ok((problem, plan))
    }

    /// Runs one planning cycle under the configured budget.
    pub fn plan(&self, problem: &ProblemModel) -> Plan {
        self.plan_with_budget(problem, &Budget::from_config(&self.config.search))
    }

    /// Runs one planning cycle under `budget`.
    ///
    /// Expiry or cancellation only cuts the local search short; the best
    /// plan found so far is still polished and assembled.
    pub fn plan_with_budget(&self, problem: &ProblemModel, budget: &Budget) -> Plan {
        info!(
            orders = problem.num_orders(),
            vehicles = problem.num_vehicles(),
            positions = problem.inventory().len(),
            "planning cycle started"
        );
        let evaluator = RouteEvaluator::new(problem, &self.config.cost);
        let scope = RouteScope::all(problem.num_vehicles());

        let initial = InsertionBuilder::new(evaluator).build();
        let outcome = RouteSearch::new(evaluator, &self.config.search).run(initial, &scope, budget);
        debug!(
            iterations = outcome.iterations,
            accepted = outcome.accepted,
            stop = ?outcome.stop,
            cost = outcome.cost,
            "local search finished"
        );

        let mut draft = outcome.draft;
        self.polish(evaluator, &mut draft, &scope);
        let reorders = self.plan_inventory(problem);
        let plan = evaluator.assemble(&draft, reorders);
        info!(
            cost = plan.total_cost(),
            assigned = plan.num_assigned(),
            unassigned = plan.num_unassigned(),
            feasible = plan.is_feasible(),
            "planning cycle finished"
        );
        plan
    }

    /// Re-plans after `disruption` under the configured budget.
    pub fn reoptimize(
        &self,
        problem: &ProblemModel,
        prior: &Plan,
        disruption: &Disruption,
    ) -> Result<Reoptimization, ValidationError> {
        self.reoptimize_with_budget(problem, prior, disruption, &Budget::from_config(&self.config.search))
    }

    /// Re-plans after `disruption` under `budget`.
    ///
    /// An empty disruption returns `prior` unchanged. Otherwise the prior
    /// plan is repaired within the affected routes. If a displaced order
    /// fits nowhere in that scope, the revised problem is planned from
    /// scratch. Reorder actions carry over since disruptions do not touch
    /// inventory.
    pub fn reoptimize_with_budget(
        &self,
        problem: &ProblemModel,
        prior: &Plan,
        disruption: &Disruption,
        budget: &Budget,
    ) -> Result<Reoptimization, ValidationError> {
        if disruption.is_empty() {
            return Ok(Reoptimization {
                problem: problem.clone(),
                plan: prior.clone(),
                outcome: ReoptOutcome::Unchanged,
            });
        }

        let revised = problem.revise(disruption)?;
        let evaluator = RouteEvaluator::new(&revised, &self.config.cost);
        let repair = BoundedRepair::new(evaluator, &self.config.search).run(prior, disruption, budget);

        if !repair.stranded.is_empty() {
            let stranded: Vec<String> = repair
                .stranded
                .iter()
                .map(|&o| revised.orders()[o].id().to_string())
                .collect();
            warn!(?stranded, "bounded repair left orders without a route, replanning");
            let plan = self.plan_with_budget(&revised, budget);
            return Ok(Reoptimization {
                problem: revised,
                plan,
                outcome: ReoptOutcome::Escalated { stranded },
            });
        }

        let mut draft = repair.draft;
        self.polish(
            evaluator,
            &mut draft,
            &RouteScope::only(revised.num_vehicles(), repair.touched.iter().copied()),
        );
        let reorders: Vec<ReorderAction> = prior.reorders().cloned().collect();
        let plan = evaluator.assemble(&draft, reorders);
        let touched: Vec<String> = repair
            .touched
            .iter()
            .map(|&v| revised.vehicles()[v].id().to_string())
            .collect();
        info!(
            touched = touched.len(),
            displaced = repair.displaced.len(),
            cost = plan.total_cost(),
            "bounded reoptimization finished"
        );

        Ok(Reoptimization {
            problem: revised,
            plan,
            outcome: ReoptOutcome::Bounded { touched },
        })
    }

    /// Validates a scheduling request and assigns its tasks to resources and
    /// start slots, minimizing the priority-weighted start.
    pub fn schedule(&self, request: &ScheduleRequest) -> Result<Schedule, ValidationError> {
        request.validate()?;
        info!(
            tasks = request.tasks.len(),
            resources = request.resources.len(),
            "scheduling started"
        );
        let scheduler = SlotScheduler::new();
        let schedule = match self.solver.as_deref() {
            Some(solver) => scheduler
                .with_subsolver(SubsolverAdapter::new(solver, &self.config.subsolver))
                .schedule(request),
            None => scheduler.schedule(request),
        };
        info!(
            scheduled = schedule.assignments.len(),
            unscheduled = schedule.unscheduled.len(),
            weighted_start = schedule.weighted_start,
            method = ?schedule.method,
            "scheduling finished"
        );
        Ok(schedule)
    }

    fn plan_inventory(&self, problem: &ProblemModel) -> Vec<ReorderAction> {
        let planner = InventoryPlanner::new(&self.config.inventory);
        match self.solver.as_deref() {
            Some(solver) => planner
                .with_subsolver(SubsolverAdapter::new(solver, &self.config.subsolver))
                .plan(problem.inventory()),
            None => planner.plan(problem.inventory()),
        }
    }

    fn polish(&self, evaluator: RouteEvaluator<'_>, draft: &mut PlanDraft, scope: &RouteScope) {
        let Some(solver) = self.solver.as_deref() else {
            return;
        };
        if !self.config.subsolver.polish_routes {
            return;
        }
        let adapter = SubsolverAdapter::new(solver, &self.config.subsolver);
        let vehicles = evaluator.problem().vehicles();

        let mut improved = 0usize;
        for vehicle in scope.vehicles() {
            let stops = draft.route(vehicle);
            if stops.len() < 2 || stops.len() > self.config.subsolver.max_route_size {
                continue;
            }
            let Some(current) = evaluator.route_cost(vehicle, stops) else {
                continue;
            };
            match adapter.route_order(&evaluator, vehicle, stops) {
                Ok(order) => {
                    if evaluator
                        .route_cost(vehicle, &order)
                        .is_some_and(|cost| cost < current - POLISH_EPS)
                    {
                        draft.set_route(vehicle, order);
                        improved += 1;
                    }
                }
                Err(err) => {
                    warn!(vehicle = vehicles[vehicle].id(), %err, "route polish failed, keeping heuristic order");
                }
            }
        }
        debug!(improved, "route polish finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchConfig, SubsolverConfig};
    use crate::models::{Depot, InventoryPosition, Location, Order, TimeWindow, Vehicle};
    use crate::subsolver::testing::{EnumerationSolver, FixedSolver};
    use crate::subsolver::{SolveReport, SolveStatus};

    fn problem() -> ProblemModel {
        let tw = TimeWindow::new(0.0, 1000.0).expect("valid");
        ProblemModel::new(
            vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
            vec![Vehicle::new("v0", "d0", 6), Vehicle::new("v1", "d0", 6)],
            vec![
                Order::new("a", Location::new(10.0, 0.0), 2, tw),
                Order::new("b", Location::new(20.0, 5.0), 2, tw),
                Order::new("c", Location::new(30.0, 0.0), 2, tw),
                Order::new("d", Location::new(-10.0, 0.0), 2, tw),
                Order::new("e", Location::new(-20.0, -5.0), 2, tw),
            ],
            vec![
                InventoryPosition::new("sku", "d0", 3, 5, 20),
                InventoryPosition::new("bolts", "d0", 30, 5, 20),
            ],
        )
        .expect("valid")
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_search(SearchConfig::default().with_max_iterations(500).with_seed(3))
            .with_subsolver(SubsolverConfig::default().with_max_route_size(3))
    }

    #[test]
    fn test_plan_assigns_everything() {
        let plan = Engine::new(config()).plan(&problem());
        assert!(plan.is_feasible());
        assert_eq!(plan.num_assigned(), 5);
        assert_eq!(plan.num_unassigned(), 0);
        assert_eq!(plan.reorders().count(), 1);
    }

    #[test]
    fn test_plan_deterministic() {
        let engine = Engine::new(config());
        let p = problem();
        assert_eq!(engine.plan(&p), engine.plan(&p));
    }

    #[test]
    fn test_polish_never_worsens() {
        let p = problem();
        let plain = Engine::new(config()).plan(&p);
        let polished = Engine::new(config())
            .with_solver(Arc::new(EnumerationSolver))
            .plan(&p);
        assert!(polished.is_feasible());
        assert!(polished.cost().routing() <= plain.cost().routing() + 1e-9);
    }

    #[test]
    fn test_failing_solver_degrades_to_heuristic() {
        let p = problem();
        let plain = Engine::new(config()).plan(&p);
        let failing = Engine::new(config())
            .with_solver(Arc::new(FixedSolver(SolveReport::without_solution(SolveStatus::TimedOut))))
            .plan(&p);
        assert_eq!(plain, failing);
    }

    #[test]
    fn test_solve_rejects_invalid_record() {
        let mut record = problem().to_record();
        record.orders[0] = record.orders[0].clone().with_demand(-1);
        let err = Engine::new(config()).solve(record).expect_err("invalid");
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_schedule_uses_solver_when_present() {
        use crate::scheduling::{Resource, ResourceKind, ScheduleMethod, SlotWindow, Task};
        let request = ScheduleRequest {
            tasks: vec![
                Task::new("pallets", 2, SlotWindow::new(0, 4)).with_priority(2.0),
                Task::new("express", 1, SlotWindow::new(0, 1)),
            ],
            resources: vec![Resource::new("dock-a", ResourceKind::DockSlot)],
        };
        let greedy = Engine::new(config()).schedule(&request).expect("valid");
        assert_eq!(greedy.method, ScheduleMethod::Heuristic);
        assert_eq!(greedy.unscheduled, vec!["express".to_string()]);

        let exact = Engine::new(config())
            .with_solver(Arc::new(EnumerationSolver))
            .schedule(&request)
            .expect("valid");
        assert_eq!(exact.method, ScheduleMethod::Exact);
        assert!(exact.unscheduled.is_empty());

        let mut invalid = request;
        invalid.resources.push(Resource::new("dock-a", ResourceKind::DockSlot));
        assert_eq!(Engine::new(config()).schedule(&invalid).expect_err("duplicate").len(), 1);
    }

    #[test]
    fn test_reoptimize_empty_disruption() {
        let engine = Engine::new(config());
        let p = problem();
        let plan = engine.plan(&p);
        let result = engine.reoptimize(&p, &plan, &Disruption::default()).expect("valid");
        assert_eq!(result.outcome, ReoptOutcome::Unchanged);
        assert_eq!(result.plan, plan);
    }

    #[test]
    fn test_reoptimize_escalates() {
        let engine = Engine::new(config());
        let tw = TimeWindow::new(0.0, 1000.0).expect("valid");
        let p = ProblemModel::new(
            vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
            vec![Vehicle::new("v0", "d0", 4), Vehicle::new("v1", "d0", 4)],
            vec![
                Order::new("a", Location::new(10.0, 0.0), 4, tw),
                Order::new("b", Location::new(-10.0, 0.0), 1, tw),
            ],
            vec![],
        )
        .expect("valid");
        let plan = engine.plan(&p);
        assert_eq!(plan.num_unassigned(), 0);
        let a_vehicle = plan
            .routes()
            .find(|r| r.order_ids().contains(&"a"))
            .map(|r| r.vehicle_id().to_string())
            .expect("a routed");
        let b_vehicle = plan
            .routes()
            .find(|r| r.order_ids().contains(&"b"))
            .map(|r| r.vehicle_id().to_string())
            .expect("b routed");
        // a and b share no route: a fills its vehicle
        assert_ne!(a_vehicle, b_vehicle);

        // b grows to fill a vehicle and its own vehicle disappears, so the
        // bounded scope has no room and the full replan strands one order
        let disruption = Disruption {
            demand_updates: vec![crate::reoptimize::DemandUpdate {
                order_id: "b".into(),
                demand: 4,
            }],
            unavailable_vehicles: vec![b_vehicle],
            ..Disruption::default()
        };
        let result = engine.reoptimize(&p, &plan, &disruption).expect("valid");
        assert_eq!(
            result.outcome,
            ReoptOutcome::Escalated {
                stranded: vec!["b".to_string()]
            }
        );
        assert_eq!(result.plan.num_unassigned(), 1);
        assert!(result.plan.is_feasible());
    }
}
