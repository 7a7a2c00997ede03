//! Reference solvers for unit tests.

use std::time::{Duration, Instant};

use super::formulation::{ExactSolver, Formulation, SolveReport, SolveStatus, VariableKind};

/// Exhaustive search over integer domains. Only for tiny formulations.
pub(crate) struct EnumerationSolver;

impl ExactSolver for EnumerationSolver {
    fn name(&self) -> &str {
        "enumeration"
    }

    fn solve(&self, formulation: &Formulation, time_limit: Duration) -> SolveReport {
        let started = Instant::now();
        let domains: Option<Vec<(i64, i64)>> = formulation
            .variables()
            .iter()
            .map(|v| match v.kind {
                VariableKind::Continuous => None,
                _ => Some((v.lower.ceil() as i64, v.upper.floor() as i64)),
            })
            .collect();
        let Some(domains) = domains else {
            return SolveReport::without_solution(SolveStatus::Infeasible);
        };

        let mut values: Vec<f64> = domains.iter().map(|&(lo, _)| lo as f64).collect();
        let mut best: Option<(f64, Vec<f64>)> = None;
        loop {
            if started.elapsed() > time_limit {
                return SolveReport::without_solution(SolveStatus::TimedOut);
            }
            if formulation.is_feasible(&values, 1e-9) {
                let obj = formulation.objective_value(&values);
                if best.as_ref().is_none_or(|(b, _)| obj < *b) {
                    best = Some((obj, values.clone()));
                }
            }
            // odometer increment
            let mut k = 0;
            loop {
                if k == values.len() {
                    return match best {
                        Some((_, v)) => SolveReport::solved(SolveStatus::Optimal, v),
                        None => SolveReport::without_solution(SolveStatus::Infeasible),
                    };
                }
                if (values[k] as i64) < domains[k].1 {
                    values[k] += 1.0;
                    break;
                }
                values[k] = domains[k].0 as f64;
                k += 1;
            }
        }
    }
}

/// Always returns the same report.
pub(crate) struct FixedSolver(pub SolveReport);

impl ExactSolver for FixedSolver {
    fn name(&self) -> &str {
        "fixed"
    }

    fn solve(&self, _formulation: &Formulation, _time_limit: Duration) -> SolveReport {
        self.0.clone()
    }
}
