//! Task-to-resource slot scheduling.
//!
//! The heuristic is greedy list scheduling: tasks in order of priority
//! (highest first), then earliest window start, then identifier, each
//! placed at the earliest slot any resource can take it, ties going to the
//! resource listed first. With a subsolver the exact time-indexed model is
//! tried as well. Its answer replaces the heuristic one when it places more
//! tasks, or as many at a lower weighted start.

use tracing::{debug, warn};

use super::model::{Schedule, ScheduleMethod, ScheduleRequest, ScheduledTask};
use crate::subsolver::SubsolverAdapter;

/// Tolerance when comparing weighted starts.
const WEIGHT_EPS: f64 = 1e-9;

/// Assigns tasks to resources and start slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotScheduler<'a> {
    subsolver: Option<SubsolverAdapter<'a>>,
}

impl<'a> SlotScheduler<'a> {
    /// Heuristic-only scheduler.
    pub fn new() -> Self {
        Self { subsolver: None }
    }

    /// Also tries the exact model through `adapter`.
    pub fn with_subsolver(mut self, adapter: SubsolverAdapter<'a>) -> Self {
        self.subsolver = Some(adapter);
        self
    }

    /// Schedules a validated request.
    pub fn schedule(&self, request: &ScheduleRequest) -> Schedule {
        let greedy = list_schedule(request);
        let Some(adapter) = self.subsolver else {
            return greedy;
        };

        match adapter.schedule(request) {
            Ok(placed) => {
                let exact = to_schedule(request, &placed, ScheduleMethod::Exact);
                let better = exact.assignments.len() > greedy.assignments.len()
                    || (exact.assignments.len() == greedy.assignments.len()
                        && exact.weighted_start < greedy.weighted_start - WEIGHT_EPS);
                debug!(
                    greedy = greedy.weighted_start,
                    exact = exact.weighted_start,
                    better,
                    "exact schedule compared"
                );
                if better {
                    exact
                } else {
                    greedy
                }
            }
            Err(err) => {
                warn!(%err, "exact schedule unavailable, keeping list schedule");
                greedy
            }
        }
    }
}

/// Greedy list schedule.
pub fn list_schedule(request: &ScheduleRequest) -> Schedule {
    let mut queue: Vec<usize> = (0..request.tasks.len()).collect();
    queue.sort_by(|&a, &b| {
        let (ta, tb) = (&request.tasks[a], &request.tasks[b]);
        tb.priority
            .total_cmp(&ta.priority)
            .then(ta.window.earliest.cmp(&tb.window.earliest))
            .then_with(|| ta.id.cmp(&tb.id))
    });

    // busy intervals per resource, kept sorted by start
    let mut busy: Vec<Vec<(u32, u32)>> = vec![Vec::new(); request.resources.len()];
    let mut placed = Vec::with_capacity(request.tasks.len());

    for i in queue {
        let task = &request.tasks[i];
        let best = request
            .resources
            .iter()
            .enumerate()
            .filter_map(|(j, resource)| {
                let window = task.window_on(resource)?;
                earliest_gap(&busy[j], window.earliest, window.latest, task.duration).map(|t| (t, j))
            })
            .min();
        if let Some((start, j)) = best {
            let slot = busy[j].partition_point(|&(s, _)| s < start);
            busy[j].insert(slot, (start, start + task.duration));
            placed.push((i, j, start));
        }
    }

    to_schedule(request, &placed, ScheduleMethod::Heuristic)
}

/// Earliest start `≥ from` such that `[start, start + duration)` avoids
/// every busy interval and ends by `until`.
fn earliest_gap(busy: &[(u32, u32)], from: u32, until: u32, duration: u32) -> Option<u32> {
    let mut start = from;
    for &(s, e) in busy {
        if start.checked_add(duration)? <= s {
            break;
        }
        if e > start {
            start = e;
        }
    }
    (start.checked_add(duration)? <= until).then_some(start)
}

fn to_schedule(request: &ScheduleRequest, placed: &[(usize, usize, u32)], method: ScheduleMethod) -> Schedule {
    let mut scheduled = vec![false; request.tasks.len()];
    let mut weighted_start = 0.0;
    let mut assignments: Vec<(usize, ScheduledTask)> = placed
        .iter()
        .map(|&(i, j, start)| {
            let task = &request.tasks[i];
            scheduled[i] = true;
            weighted_start += task.priority * f64::from(start);
            (
                j,
                ScheduledTask {
                    task_id: task.id.clone(),
                    resource_id: request.resources[j].id.clone(),
                    start,
                    end: start + task.duration,
                },
            )
        })
        .collect();
    assignments.sort_by_key(|(j, a)| (*j, a.start));

    Schedule {
        assignments: assignments.into_iter().map(|(_, a)| a).collect(),
        unscheduled: request
            .tasks
            .iter()
            .zip(&scheduled)
            .filter(|(_, &done)| !done)
            .map(|(t, _)| t.id.clone())
            .collect(),
        weighted_start,
        method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubsolverConfig;
    use crate::scheduling::{Resource, ResourceKind, SlotWindow, Task};
    use crate::subsolver::testing::{EnumerationSolver, FixedSolver};
    use crate::subsolver::{SolveReport, SolveStatus};

    fn dock_request() -> ScheduleRequest {
        ScheduleRequest {
            tasks: vec![
                Task::new("long", 2, SlotWindow::new(0, 4)).with_priority(2.0),
                Task::new("urgent", 1, SlotWindow::new(0, 1)),
            ],
            resources: vec![Resource::new("dock", ResourceKind::DockSlot)],
        }
    }

    #[test]
    fn test_gap_search() {
        let busy = [(2, 4), (5, 7)];
        assert_eq!(earliest_gap(&busy, 0, 10, 2), Some(0));
        assert_eq!(earliest_gap(&busy, 1, 10, 2), Some(7));
        assert_eq!(earliest_gap(&busy, 0, 10, 1), Some(0));
        assert_eq!(earliest_gap(&busy, 3, 10, 1), Some(4));
        assert_eq!(earliest_gap(&busy, 3, 8, 2), None);
    }

    #[test]
    fn test_list_schedule_by_priority() {
        let request = ScheduleRequest {
            tasks: vec![
                Task::new("low", 2, SlotWindow::new(0, 10)),
                Task::new("high", 2, SlotWindow::new(0, 10)).with_priority(5.0),
                Task::new("mid", 2, SlotWindow::new(0, 10)).with_priority(3.0),
            ],
            resources: vec![
                Resource::new("v1", ResourceKind::Vehicle),
                Resource::new("d1", ResourceKind::Driver).with_availability(SlotWindow::new(1, 10)),
            ],
        };
        let schedule = list_schedule(&request);
        assert!(schedule.unscheduled.is_empty());
        assert_eq!(schedule.method, ScheduleMethod::Heuristic);
        let at = |id: &str| {
            let a = schedule.assignment(id).expect("scheduled");
            (a.resource_id.as_str(), a.start)
        };
        assert_eq!(at("high"), ("v1", 0));
        assert_eq!(at("mid"), ("d1", 1));
        assert_eq!(at("low"), ("v1", 2));
        assert_eq!(schedule.weighted_start, 3.0 + 2.0);
    }

    #[test]
    fn test_no_overlap_on_a_resource() {
        let request = ScheduleRequest {
            tasks: (0..4).map(|k| Task::new(format!("t{k}"), 3, SlotWindow::new(0, 20))).collect(),
            resources: vec![Resource::new("dock", ResourceKind::DockSlot)],
        };
        let schedule = list_schedule(&request);
        assert_eq!(schedule.assignments.len(), 4);
        for pair in schedule.assignments.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_greedy_strands_what_exact_places() {
        let request = dock_request();
        let greedy = SlotScheduler::new().schedule(&request);
        assert_eq!(greedy.unscheduled, vec!["urgent".to_string()]);

        let config = SubsolverConfig::default();
        let solver = EnumerationSolver;
        let exact = SlotScheduler::new()
            .with_subsolver(SubsolverAdapter::new(&solver, &config))
            .schedule(&request);
        assert_eq!(exact.method, ScheduleMethod::Exact);
        assert!(exact.unscheduled.is_empty());
        assert_eq!(exact.assignment("urgent").map(|a| a.start), Some(0));
        assert_eq!(exact.assignment("long").map(|a| a.start), Some(1));
        assert_eq!(exact.weighted_start, 2.0);
    }

    #[test]
    fn test_solver_failure_keeps_list_schedule() {
        let request = dock_request();
        let config = SubsolverConfig::default();
        let solver = FixedSolver(SolveReport::without_solution(SolveStatus::TimedOut));
        let schedule = SlotScheduler::new()
            .with_subsolver(SubsolverAdapter::new(&solver, &config))
            .schedule(&request);
        assert_eq!(schedule, list_schedule(&request));
    }
}
