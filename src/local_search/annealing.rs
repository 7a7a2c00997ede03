//! Simulated annealing over plan drafts.
//!
//! # Algorithm
//!
//! Each iteration proposes a random [`Move`], applies it, and re-evaluates
//! only the routes it touched. Infeasible results are undone immediately.
//! Feasible results are accepted by the Metropolis rule:
//!
//! ```text
//! accept if Δ ≤ 0, otherwise with probability exp(−Δ / T)
//! ```
//!
//! The temperature cools geometrically from T₀ to T_f over the iteration
//! budget: α = (T_f / T₀)^(1 / iterations). The best draft seen is kept
//! and returned, so the result never costs more than the input.
//!
//! # Reference
//!
//! Kirkpatrick, S., Gelatt, C.D., Vecchi, M.P. (1983). "Optimization by
//! Simulated Annealing", *Science* 220(4598), 671-680.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::budget::{Budget, StopReason};
use super::moves::{propose, Move};
use crate::config::SearchConfig;
use crate::evaluation::RouteEvaluator;
use crate::models::{PlanDraft, RouteScope, UnassignedReason};

/// Relative tolerance for "strictly better".
const IMPROVEMENT_EPS: f64 = 1e-9;

/// Result of one search call.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best draft found.
    pub draft: PlanDraft,
    /// Cost of `draft` per [`RouteEvaluator::draft_cost`].
    pub cost: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Moves accepted.
    pub accepted: usize,
    /// Why the search stopped.
    pub stop: StopReason,
}

/// Simulated annealing improver restricted to a route scope.
#[derive(Debug, Clone, Copy)]
pub struct Annealer<'a> {
    evaluator: RouteEvaluator<'a>,
    config: &'a SearchConfig,
}

/// Saved state for undoing a rejected move.
struct Undo {
    routes: Vec<(usize, Vec<usize>)>,
    /// Pool slot, order and reason taken by a reinsert.
    pool_entry: Option<(usize, usize, UnassignedReason)>,
}

impl<'a> Annealer<'a> {
    /// Creates an annealer.
    pub fn new(evaluator: RouteEvaluator<'a>, config: &'a SearchConfig) -> Self {
        Self { evaluator, config }
    }

    /// Improves `draft` by moves among the routes in `scope`.
    ///
    /// Routes outside the scope, routes of unavailable vehicles and routes
    /// that are already infeasible are never modified. With
    /// `allow_reinsert`, unassigned orders may be moved onto routes.
    pub fn improve(
        &self,
        draft: PlanDraft,
        scope: &RouteScope,
        budget: &Budget,
        seed: u64,
        allow_reinsert: bool,
    ) -> SearchOutcome {
        let problem = self.evaluator.problem();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut draft = draft;

        let mut route_costs = self.evaluator.route_costs(&draft);
        let mut depot_loads = self.evaluator.depot_loads(&draft);
        let vehicles: Vec<usize> = scope
            .vehicles()
            .into_iter()
            .filter(|&v| problem.vehicles()[v].is_available() && route_costs[v].is_finite())
            .collect();

        let mut best = draft.clone();
        let mut best_delta = 0.0;
        let mut current_delta = 0.0;

        let iterations_budget = budget.max_iterations();
        let mut temperature = self.initial_temperature(&vehicles, &route_costs);
        let final_temperature = self.config.final_temperature.min(temperature);
        let alpha = if iterations_budget > 0 {
            (final_temperature / temperature).powf(1.0 / iterations_budget as f64)
        } else {
            1.0
        };

        let mut iterations = 0;
        let mut accepted = 0;
        let mut stop = StopReason::IterationsExhausted;

        while iterations < iterations_budget {
            if let Some(reason) = budget.interrupted() {
                stop = reason;
                break;
            }
            let Some(mv) = propose(&draft, &vehicles, allow_reinsert, &mut rng) else {
                stop = StopReason::NoMoves;
                break;
            };
            iterations += 1;

            let undo = self.snapshot(&draft, &mv);
            mv.apply(&mut draft);

            match self.evaluate(&draft, &undo, &route_costs, &depot_loads) {
                Some((delta, new_costs, load_changes)) => {
                    let accept = delta <= 0.0
                        || rng.random::<f64>() < (-delta / temperature.max(f64::MIN_POSITIVE)).exp();
                    if accept {
                        for (v, cost) in new_costs {
                            route_costs[v] = cost;
                        }
                        for (d, change) in load_changes {
                            depot_loads[d] += change;
                        }
                        current_delta += delta;
                        accepted += 1;
                        if current_delta < best_delta - IMPROVEMENT_EPS {
                            best_delta = current_delta;
                            best = draft.clone();
                        }
                    } else {
                        restore(&mut draft, undo);
                    }
                }
                None => restore(&mut draft, undo),
            }

            temperature *= alpha;
        }

        let cost = self.evaluator.draft_cost(&best);
        debug!(iterations, accepted, cost, ?stop, "annealing finished");
        SearchOutcome {
            draft: best,
            cost,
            iterations,
            accepted,
            stop,
        }
    }

    /// Configured T₀, or 5% of the mean non-empty route cost (at least 1).
    fn initial_temperature(&self, vehicles: &[usize], route_costs: &[f64]) -> f64 {
        if let Some(t0) = self.config.initial_temperature {
            return t0;
        }
        let costs: Vec<f64> = vehicles
            .iter()
            .map(|&v| route_costs[v])
            .filter(|&c| c > 0.0)
            .collect();
        if costs.is_empty() {
            return 1.0;
        }
        let mean = costs.iter().sum::<f64>() / costs.len() as f64;
        (0.05 * mean).max(1.0)
    }

    fn snapshot(&self, draft: &PlanDraft, mv: &Move) -> Undo {
        let (first, second) = mv.vehicles();
        let mut routes = vec![(first, draft.route(first).to_vec())];
        if let Some(second) = second {
            routes.push((second, draft.route(second).to_vec()));
        }
        let pool_entry = match *mv {
            Move::Reinsert { slot, .. } => {
                let (order, reason) = draft.unassigned()[slot];
                Some((slot, order, reason))
            }
            _ => None,
        };
        Undo { routes, pool_entry }
    }

    /// Cost change of an applied move, the new route costs and depot load
    /// changes, or `None` if a touched route or depot became infeasible.
    #[allow(clippy::type_complexity)]
    fn evaluate(
        &self,
        draft: &PlanDraft,
        undo: &Undo,
        route_costs: &[f64],
        depot_loads: &[i64],
    ) -> Option<(f64, Vec<(usize, f64)>, Vec<(usize, i64)>)> {
        let problem = self.evaluator.problem();
        let mut delta = 0.0;
        let mut new_costs = Vec::with_capacity(2);
        let mut load_changes: Vec<(usize, i64)> = Vec::with_capacity(2);

        for (vehicle, old_route) in &undo.routes {
            let cost = self.evaluator.route_cost(*vehicle, draft.route(*vehicle))?;
            delta += cost - route_costs[*vehicle];
            new_costs.push((*vehicle, cost));

            let change =
                self.evaluator.route_load(draft.route(*vehicle)) - self.evaluator.route_load(old_route);
            let depot = problem.vehicle_depot(*vehicle);
            match load_changes.iter_mut().find(|(d, _)| *d == depot) {
                Some((_, total)) => *total += change,
                None => load_changes.push((depot, change)),
            }
        }

        for &(depot, change) in &load_changes {
            if change > 0 && depot_loads[depot] + change > i64::from(problem.depots()[depot].capacity()) {
                return None;
            }
        }

        if undo.pool_entry.is_some() {
            delta -= self.evaluator.costs().unassigned_penalty;
        }
        Some((delta, new_costs, load_changes))
    }
}

fn restore(draft: &mut PlanDraft, undo: Undo) {
    for (vehicle, route) in undo.routes {
        draft.set_route(vehicle, route);
    }
    if let Some((slot, order, reason)) = undo.pool_entry {
        draft.restore_unassigned(slot, order, reason);
    }
}
