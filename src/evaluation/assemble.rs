//! Conversion between drafts and finished plans.

use super::RouteEvaluator;
use crate::models::{
    CostBreakdown, Plan, PlanAction, PlanDraft, ProblemModel, ReorderAction, UnassignedOrder,
};

impl RouteEvaluator<'_> {
    /// Builds a [`Plan`] from a draft and a set of reorder actions.
    ///
    /// Every route is re-evaluated from scratch; any failed check ends up
    /// in [`Plan::violations`] and marks the plan infeasible. Dispatches are
    /// emitted in vehicle order, followed by reorders.
    pub fn assemble(&self, draft: &PlanDraft, reorders: Vec<ReorderAction>) -> Plan {
        let problem = self.problem();
        let mut cost = CostBreakdown::default();
        let mut actions = Vec::new();
        let mut violations = Vec::new();

        for (vehicle, stops) in draft.routes().iter().enumerate() {
            if stops.is_empty() {
                continue;
            }
            let (route, issues) = self.build_route(vehicle, stops);
            cost.add_route(route.cost());
            let id = problem.vehicles()[vehicle].id();
            violations.extend(issues.iter().map(|i| format!("vehicle `{id}`: {i}")));
            actions.push(PlanAction::Dispatch(route));
        }

        for issue in self.depot_violations(draft) {
            violations.push(issue.to_string());
        }

        let unassigned: Vec<UnassignedOrder> = draft
            .unassigned()
            .iter()
            .map(|&(order, reason)| UnassignedOrder {
                order_id: problem.orders()[order].id().to_string(),
                reason,
            })
            .collect();
        cost.unassigned_penalty = self.unassigned_cost(unassigned.len());

        for action in reorders {
            cost.inventory += action.expected_cost;
            actions.push(PlanAction::Reorder(action));
        }

        Plan::new(actions, unassigned, cost, violations)
    }
}

/// Rebuilds a draft from a plan against a (possibly revised) problem.
///
/// Stops whose order no longer exists are dropped, as are routes whose
/// vehicle is gone. Unassigned orders keep their recorded reason; orders
/// unknown to the plan are returned separately so the caller can place
/// them.
pub fn draft_from_plan(problem: &ProblemModel, plan: &Plan) -> (PlanDraft, Vec<usize>) {
    let mut draft = PlanDraft::new(problem.num_vehicles());
    let mut seen = vec![false; problem.num_orders()];

    for route in plan.routes() {
        let Some(vehicle) = problem.vehicle_index(route.vehicle_id()) else {
            continue;
        };
        let stops: Vec<usize> = route
            .stops()
            .iter()
            .filter_map(|s| problem.order_index(&s.order_id))
            .filter(|&o| !std::mem::replace(&mut seen[o], true))
            .collect();
        draft.set_route(vehicle, stops);
    }

    for entry in plan.unassigned() {
        if let Some(order) = problem.order_index(&entry.order_id) {
            if !std::mem::replace(&mut seen[order], true) {
                draft.mark_unassigned(order, entry.reason);
            }
        }
    }

    let fresh = (0..problem.num_orders()).filter(|&o| !seen[o]).collect();
    (draft, fresh)
}
