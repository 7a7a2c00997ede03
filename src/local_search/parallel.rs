//! Route-partitioned parallel search.
//!
//! # Algorithm
//!
//! The search runs in rounds. Each round shuffles the in-scope vehicles of
//! every depot and cuts them into groups. Every group is handed to a
//! separate worker that owns a copy of just those routes and anneals them
//! with same-group moves only. Since a group never spans depots, depot
//! loads cannot change during a round. Worker results are merged back in
//! group order at the round boundary.
//!
//! After the last round, orders still unassigned are offered to the
//! insertion builder and a short serial annealing pass runs over the whole
//! scope with cross-depot moves and reinsertion enabled.
//!
//! Each worker's RNG seed is derived from the configured seed, the round and
//! the group index, and results are collected in group order, so with an
//! iteration-only budget the outcome does not depend on thread scheduling.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use super::annealing::{Annealer, SearchOutcome};
use super::budget::{Budget, StopReason};
use crate::config::SearchConfig;
use crate::constructive::InsertionBuilder;
use crate::evaluation::RouteEvaluator;
use crate::models::{PlanDraft, RouteScope};

/// Share of the iteration budget kept for the final serial pass.
const SERIAL_SHARE: f64 = 0.2;

/// Local search driver: serial annealing, or partitioned rounds when more
/// than one worker is configured.
#[derive(Debug, Clone, Copy)]
pub struct RouteSearch<'a> {
    evaluator: RouteEvaluator<'a>,
    config: &'a SearchConfig,
}

impl<'a> RouteSearch<'a> {
    /// Creates a search driver.
    pub fn new(evaluator: RouteEvaluator<'a>, config: &'a SearchConfig) -> Self {
        Self { evaluator, config }
    }

    /// Improves the routes in `scope`.
    pub fn run(&self, draft: PlanDraft, scope: &RouteScope, budget: &Budget) -> SearchOutcome {
        let annealer = Annealer::new(self.evaluator, self.config);
        if self.config.workers <= 1 {
            return annealer.improve(draft, scope, budget, self.config.seed, true);
        }

        let pool = match ThreadPoolBuilder::new().num_threads(self.config.workers).build() {
            Ok(pool) => pool,
            Err(err) => {
                warn!(%err, "cannot build worker pool, searching serially");
                return annealer.improve(draft, scope, budget, self.config.seed, true);
            }
        };

        let total = budget.max_iterations();
        let serial_iterations = (total as f64 * SERIAL_SHARE).round() as usize;
        let rounds = self.config.rounds.max(1);
        let per_round = (total - serial_iterations) / rounds;

        let mut draft = draft;
        let mut iterations = 0;
        let mut accepted = 0;

        for round in 0..rounds {
            if budget.interrupted().is_some() {
                break;
            }
            let groups = self.partition(&draft, scope, round);
            let round_budget = budget.with_iterations(per_round);

            let outcomes: Vec<(Vec<usize>, SearchOutcome)> = pool.install(|| {
                groups
                    .into_par_iter()
                    .enumerate()
                    .map(|(index, group)| {
                        let mut local = PlanDraft::new(draft.num_routes());
                        for &v in &group {
                            local.set_route(v, draft.route(v).to_vec());
                        }
                        let local_scope = RouteScope::only(draft.num_routes(), group.iter().copied());
                        let seed = worker_seed(self.config.seed, round, index);
                        let outcome = annealer.improve(local, &local_scope, &round_budget, seed, false);
                        (group, outcome)
                    })
                    .collect()
            });

            for (group, outcome) in outcomes {
                iterations += outcome.iterations;
                accepted += outcome.accepted;
                for v in group {
                    draft.set_route(v, outcome.draft.route(v).to_vec());
                }
            }
            debug!(round, cost = self.evaluator.draft_cost(&draft), "partition round merged");
        }

        if !draft.unassigned().is_empty() {
            let pending = draft.drain_unassigned();
            InsertionBuilder::new(self.evaluator).insert_orders(&mut draft, &pending, scope);
        }

        let serial_budget = budget.with_iterations(serial_iterations);
        let serial_seed = worker_seed(self.config.seed, rounds, 0);
        let mut outcome = annealer.improve(draft, scope, &serial_budget, serial_seed, true);
        outcome.iterations += iterations;
        outcome.accepted += accepted;
        if let Some(reason) = budget.interrupted() {
            outcome.stop = reason;
        } else if outcome.stop == StopReason::NoMoves && iterations > 0 {
            outcome.stop = StopReason::IterationsExhausted;
        }
        outcome
    }

    /// Splits in-scope vehicles into same-depot groups of roughly equal
    /// size, one batch per worker.
    fn partition(&self, draft: &PlanDraft, scope: &RouteScope, round: usize) -> Vec<Vec<usize>> {
        let problem = self.evaluator.problem();
        let mut by_depot: Vec<Vec<usize>> = vec![Vec::new(); problem.depots().len()];
        for v in scope.vehicles() {
            if v < draft.num_routes() && problem.vehicles()[v].is_available() {
                by_depot[problem.vehicle_depot(v)].push(v);
            }
        }

        let in_scope: usize = by_depot.iter().map(Vec::len).sum();
        let group_size = in_scope.div_ceil(self.config.workers).max(2);
        let mut rng = StdRng::seed_from_u64(worker_seed(self.config.seed, round, usize::MAX));

        let mut groups = Vec::new();
        for mut vehicles in by_depot {
            vehicles.shuffle(&mut rng);
            for chunk in vehicles.chunks(group_size) {
                groups.push(chunk.to_vec());
            }
        }
        groups
    }
}

/// SplitMix64-style mixing of the base seed with round and group.
fn worker_seed(seed: u64, round: usize, group: usize) -> u64 {
    let mut z = seed
        .wrapping_add((round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((group as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
