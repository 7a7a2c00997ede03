//! Builds formulations for small subproblems and decodes solver answers.

use std::collections::BTreeMap;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use super::formulation::{ExactSolver, Formulation, LinearExpr, Relation, SolveStatus, VariableKind};
use crate::config::SubsolverConfig;
use crate::evaluation::RouteEvaluator;
use crate::scheduling::ScheduleRequest;

const ASSIGNMENT_TOLERANCE: f64 = 1e-6;

/// Why a subproblem was not solved exactly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubsolverError {
    /// The solver proved the formulation infeasible.
    #[error("subproblem is infeasible")]
    SolverInfeasible,
    /// The solver gave up at its time limit.
    #[error("solver timed out after {elapsed_ms} ms")]
    SolverTimeout {
        /// Wall-clock time spent.
        elapsed_ms: u128,
    },
    /// The subproblem exceeds the configured size threshold.
    #[error("subproblem size {size} exceeds limit {limit}")]
    TooLarge {
        /// Requested size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
    /// The returned assignment does not satisfy the formulation.
    #[error("solver returned an invalid assignment: {0}")]
    InvalidAssignment(String),
    /// Nothing to choose from.
    #[error("no candidates given")]
    NoCandidates,
}

/// Bridges domain subproblems to an [`ExactSolver`].
///
/// Every answer is validated against the formulation before it is decoded,
/// so a misbehaving solver surfaces as [`SubsolverError::InvalidAssignment`]
/// rather than as a corrupt route.
#[derive(Clone, Copy)]
pub struct SubsolverAdapter<'a> {
    solver: &'a dyn ExactSolver,
    config: &'a SubsolverConfig,
}

impl std::fmt::Debug for SubsolverAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsolverAdapter")
            .field("solver", &self.solver.name())
            .field("config", self.config)
            .finish()
    }
}

impl<'a> SubsolverAdapter<'a> {
    /// Creates an adapter.
    pub fn new(solver: &'a dyn ExactSolver, config: &'a SubsolverConfig) -> Self {
        Self { solver, config }
    }

    /// Finds the distance-minimal visiting order of `stops` for `vehicle`.
    ///
    /// The order is modeled as an asymmetric TSP over the depot and the
    /// stops with Miller-Tucker-Zemlin subtour elimination. Time windows are
    /// not part of the model; callers re-check the returned sequence.
    pub fn route_order(
        &self,
        evaluator: &RouteEvaluator<'_>,
        vehicle: usize,
        stops: &[usize],
    ) -> Result<Vec<usize>, SubsolverError> {
        if stops.len() > self.config.max_route_size {
            return Err(SubsolverError::TooLarge {
                size: stops.len(),
                limit: self.config.max_route_size,
            });
        }
        if stops.len() < 2 {
            return Ok(stops.to_vec());
        }

        let problem = evaluator.problem();
        let mut nodes = Vec::with_capacity(stops.len() + 1);
        nodes.push(problem.depot_location(problem.vehicle_depot(vehicle)));
        nodes.extend(stops.iter().map(|&o| problem.order_location(o)));

        let model = TourModel::build(&nodes, |a, b| problem.distance(a, b));
        let values = self.solve(&model.formulation)?;
        let tour = model.decode(&values)?;
        Ok(tour.into_iter().map(|node| stops[node - 1]).collect())
    }

    /// Chooses the option with the smallest cost.
    ///
    /// Each option is a `(quantity, cost)` pair; the model is a single
    /// choose-one constraint over binaries.
    pub fn reorder_quantity(&self, options: &[(i32, f64)]) -> Result<i32, SubsolverError> {
        if options.is_empty() {
            return Err(SubsolverError::NoCandidates);
        }
        let mut f = Formulation::new();
        let mut pick = LinearExpr::new();
        let mut objective = LinearExpr::new();
        for (k, &(quantity, cost)) in options.iter().enumerate() {
            let y = f.add_variable(format!("y_{quantity}"), VariableKind::Binary, 0.0, 1.0);
            debug_assert_eq!(y, k);
            pick = pick.term(y, 1.0);
            objective = objective.term(y, cost);
        }
        f.add_constraint("choose_one", pick, Relation::Equal, 1.0);
        f.set_objective(objective);

        let values = self.solve(&f)?;
        let chosen = values
            .iter()
            .position(|&v| v > 0.5)
            .ok_or_else(|| SubsolverError::InvalidAssignment("no option selected".into()))?;
        Ok(options[chosen].0)
    }

    /// Places every task of `request` that has a feasible start somewhere,
    /// minimizing Σ priority × start.
    ///
    /// Binary `x[i][j][t]` starts task `i` on resource `j` at slot `t`. Each
    /// task starts exactly once and a resource runs at most one task per
    /// slot. Returns `(task, resource, start)` triples in task order.
    pub fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<(usize, usize, u32)>, SubsolverError> {
        let model = SlotModel::candidates(request);
        if model.starts.is_empty() {
            return Err(SubsolverError::NoCandidates);
        }
        if model.starts.len() > self.config.max_schedule_variables {
            return Err(SubsolverError::TooLarge {
                size: model.starts.len(),
                limit: self.config.max_schedule_variables,
            });
        }
        let formulation = model.build(request);
        let values = self.solve(&formulation)?;
        let placed: Vec<(usize, usize, u32)> = model
            .starts
            .iter()
            .zip(&values)
            .filter(|(_, &v)| v > 0.5)
            .map(|(&start, _)| start)
            .collect();
        Ok(placed)
    }

    fn solve(&self, formulation: &Formulation) -> Result<Vec<f64>, SubsolverError> {
        let started = Instant::now();
        let report = self.solver.solve(formulation, self.config.time_limit());
        let elapsed_ms = started.elapsed().as_millis();
        debug!(
            solver = self.solver.name(),
            variables = formulation.variables().len(),
            constraints = formulation.constraints().len(),
            status = ?report.status,
            elapsed_ms,
            "exact solve"
        );

        match report.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                if formulation.is_feasible(&report.assignment, ASSIGNMENT_TOLERANCE) {
                    Ok(report.assignment)
                } else {
                    Err(SubsolverError::InvalidAssignment(format!(
                        "{} values violate the formulation",
                        report.assignment.len()
                    )))
                }
            }
            SolveStatus::Infeasible => Err(SubsolverError::SolverInfeasible),
            SolveStatus::TimedOut => Err(SubsolverError::SolverTimeout { elapsed_ms }),
        }
    }
}

/// Time-indexed assignment of tasks to resources.
struct SlotModel {
    /// `(task, resource, start)` per variable, in variable order.
    starts: Vec<(usize, usize, u32)>,
}

impl SlotModel {
    fn candidates(request: &ScheduleRequest) -> Self {
        let mut starts = Vec::new();
        for (i, task) in request.tasks.iter().enumerate() {
            for (j, resource) in request.resources.iter().enumerate() {
                if let Some(window) = task.window_on(resource) {
                    starts.extend(window.starts_for(task.duration).map(|t| (i, j, t)));
                }
            }
        }
        Self { starts }
    }

    fn build(&self, request: &ScheduleRequest) -> Formulation {
        let mut f = Formulation::new();
        let mut objective = LinearExpr::new();
        let mut assign = vec![LinearExpr::new(); request.tasks.len()];
        // (resource, slot) -> variables occupying it
        let mut occupancy: BTreeMap<(usize, u32), LinearExpr> = BTreeMap::new();

        for &(i, j, t) in &self.starts {
            let x = f.add_variable(format!("x_{i}_{j}_{t}"), VariableKind::Binary, 0.0, 1.0);
            let task = &request.tasks[i];
            objective = objective.term(x, task.priority * f64::from(t));
            assign[i].terms.push((x, 1.0));
            for slot in t..t + task.duration {
                occupancy.entry((j, slot)).or_default().terms.push((x, 1.0));
            }
        }

        for (i, expr) in assign.into_iter().enumerate() {
            if !expr.terms.is_empty() {
                f.add_constraint(format!("assign_{i}"), expr, Relation::Equal, 1.0);
            }
        }
        for ((j, slot), expr) in occupancy {
            if expr.terms.len() > 1 {
                f.add_constraint(format!("busy_{j}_{slot}"), expr, Relation::LessEqual, 1.0);
            }
        }
        f.set_objective(objective);
        f
    }
}

/// ATSP with MTZ constraints. Node 0 is the depot.
struct TourModel {
    formulation: Formulation,
    n: usize,
    /// Index of arc variable x[i][j]; `usize::MAX` on the diagonal.
    arcs: Vec<Vec<usize>>,
}

impl TourModel {
    fn build(nodes: &[usize], distance: impl Fn(usize, usize) -> f64) -> Self {
        let n = nodes.len();
        let mut f = Formulation::new();
        let mut arcs = vec![vec![usize::MAX; n]; n];
        let mut objective = LinearExpr::new();

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let x = f.add_variable(format!("x_{i}_{j}"), VariableKind::Binary, 0.0, 1.0);
                    arcs[i][j] = x;
                    objective = objective.term(x, distance(nodes[i], nodes[j]));
                }
            }
        }

        for i in 0..n {
            let out = (0..n).filter(|&j| j != i).fold(LinearExpr::new(), |e, j| e.term(arcs[i][j], 1.0));
            f.add_constraint(format!("out_{i}"), out, Relation::Equal, 1.0);
            let inc = (0..n).filter(|&j| j != i).fold(LinearExpr::new(), |e, j| e.term(arcs[j][i], 1.0));
            f.add_constraint(format!("in_{i}"), inc, Relation::Equal, 1.0);
        }

        // u_i - u_j + (n-1) x_ij <= n-2 for stop nodes i != j
        let stops = (n - 1) as f64;
        let u: Vec<usize> = (1..n)
            .map(|i| f.add_variable(format!("u_{i}"), VariableKind::Integer, 1.0, stops))
            .collect();
        for i in 1..n {
            for j in 1..n {
                if i != j {
                    let expr = LinearExpr::new()
                        .term(u[i - 1], 1.0)
                        .term(u[j - 1], -1.0)
                        .term(arcs[i][j], stops);
                    f.add_constraint(format!("mtz_{i}_{j}"), expr, Relation::LessEqual, stops - 1.0);
                }
            }
        }

        f.set_objective(objective);
        Self {
            formulation: f,
            n,
            arcs,
        }
    }

    /// Follows successor arcs from the depot. Returns stop node indices.
    fn decode(&self, values: &[f64]) -> Result<Vec<usize>, SubsolverError> {
        let successor = |i: usize| (0..self.n).find(|&j| j != i && values[self.arcs[i][j]] > 0.5);
        let mut tour = Vec::with_capacity(self.n - 1);
        let mut current = 0;
        for _ in 0..self.n {
            let next = successor(current)
                .ok_or_else(|| SubsolverError::InvalidAssignment(format!("node {current} has no successor")))?;
            if next == 0 {
                break;
            }
            tour.push(next);
            current = next;
        }
        if tour.len() != self.n - 1 {
            return Err(SubsolverError::InvalidAssignment(format!(
                "tour visits {} of {} stops",
                tour.len(),
                self.n - 1
            )));
        }
        Ok(tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostConfig;
    use crate::models::{Depot, Location, Order, ProblemModel, TimeWindow, Vehicle};
    use crate::subsolver::formulation::SolveReport;
    use crate::subsolver::testing::{EnumerationSolver, FixedSolver};

    fn line_problem() -> ProblemModel {
        let tw = TimeWindow::new(0.0, 1000.0).expect("valid");
        ProblemModel::new(
            vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
            vec![Vehicle::new("v0", "d0", 100)],
            vec![
                Order::new("a", Location::new(10.0, 0.0), 1, tw),
                Order::new("b", Location::new(30.0, 0.0), 1, tw),
                Order::new("c", Location::new(20.0, 0.0), 1, tw),
            ],
            vec![],
        )
        .expect("valid")
    }

    #[test]
    fn test_route_order_optimal() {
        let problem = line_problem();
        let costs = CostConfig::default();
        let eval = RouteEvaluator::new(&problem, &costs);
        let config = SubsolverConfig::default();
        let solver = EnumerationSolver;
        let adapter = SubsolverAdapter::new(&solver, &config);
        let order = adapter.route_order(&eval, 0, &[1, 0, 2]).expect("solved");
        let cost = eval.route_cost(0, &order).expect("feasible");
        assert!((cost - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_large() {
        let problem = line_problem();
        let costs = CostConfig::default();
        let eval = RouteEvaluator::new(&problem, &costs);
        let config = SubsolverConfig::default().with_max_route_size(2);
        let solver = EnumerationSolver;
        let adapter = SubsolverAdapter::new(&solver, &config);
        assert_eq!(
            adapter.route_order(&eval, 0, &[0, 1, 2]),
            Err(SubsolverError::TooLarge { size: 3, limit: 2 })
        );
    }

    #[test]
    fn test_timeout_and_infeasible_surface() {
        let problem = line_problem();
        let costs = CostConfig::default();
        let eval = RouteEvaluator::new(&problem, &costs);
        let config = SubsolverConfig::default();

        let timeout = FixedSolver(SolveReport::without_solution(SolveStatus::TimedOut));
        let adapter = SubsolverAdapter::new(&timeout, &config);
        assert!(matches!(
            adapter.route_order(&eval, 0, &[0, 1]),
            Err(SubsolverError::SolverTimeout { .. })
        ));

        let infeasible = FixedSolver(SolveReport::without_solution(SolveStatus::Infeasible));
        let adapter = SubsolverAdapter::new(&infeasible, &config);
        assert_eq!(adapter.reorder_quantity(&[(5, 1.0)]), Err(SubsolverError::SolverInfeasible));
    }

    #[test]
    fn test_invalid_assignment_rejected() {
        let config = SubsolverConfig::default();
        let bogus = FixedSolver(SolveReport::solved(SolveStatus::Optimal, vec![1.0, 1.0]));
        let adapter = SubsolverAdapter::new(&bogus, &config);
        assert!(matches!(
            adapter.reorder_quantity(&[(5, 1.0), (10, 2.0)]),
            Err(SubsolverError::InvalidAssignment(_))
        ));
    }

    #[test]
    fn test_reorder_quantity() {
        let config = SubsolverConfig::default();
        let solver = EnumerationSolver;
        let adapter = SubsolverAdapter::new(&solver, &config);
        assert_eq!(adapter.reorder_quantity(&[(10, 9.0), (20, 4.0), (30, 6.0)]), Ok(20));
        assert_eq!(adapter.reorder_quantity(&[]), Err(SubsolverError::NoCandidates));
    }

    fn dock_request() -> ScheduleRequest {
        use crate::scheduling::{Resource, ResourceKind, SlotWindow, Task};
        ScheduleRequest {
            tasks: vec![
                Task::new("long", 2, SlotWindow::new(0, 4)).with_priority(2.0),
                Task::new("urgent", 1, SlotWindow::new(0, 1)),
            ],
            resources: vec![Resource::new("dock", ResourceKind::DockSlot)],
        }
    }

    #[test]
    fn test_schedule_model() {
        let request = dock_request();
        let model = SlotModel::candidates(&request);
        assert_eq!(model.starts, vec![(0, 0, 0), (0, 0, 1), (0, 0, 2), (1, 0, 0)]);
        let f = model.build(&request);
        // two assignment rows, slots 0..=2 shared by two variables each
        assert_eq!(f.constraints().len(), 5);

        let config = SubsolverConfig::default();
        let solver = EnumerationSolver;
        let adapter = SubsolverAdapter::new(&solver, &config);
        assert_eq!(adapter.schedule(&request), Ok(vec![(0, 0, 1), (1, 0, 0)]));
    }

    #[test]
    fn test_schedule_limits() {
        let request = dock_request();
        let config = SubsolverConfig::default().with_max_schedule_variables(3);
        let solver = EnumerationSolver;
        let adapter = SubsolverAdapter::new(&solver, &config);
        assert_eq!(
            adapter.schedule(&request),
            Err(SubsolverError::TooLarge { size: 4, limit: 3 })
        );
        assert_eq!(
            adapter.schedule(&ScheduleRequest::default()),
            Err(SubsolverError::NoCandidates)
        );
    }

    #[test]
    fn test_short_routes_pass_through() {
        let problem = line_problem();
        let costs = CostConfig::default();
        let eval = RouteEvaluator::new(&problem, &costs);
        let config = SubsolverConfig::default();
        let solver = FixedSolver(SolveReport::without_solution(SolveStatus::Infeasible));
        let adapter = SubsolverAdapter::new(&solver, &config);
        assert_eq!(adapter.route_order(&eval, 0, &[2]), Ok(vec![2]));
    }
}
