//! Neighborhood moves over a [`PlanDraft`].
//!
//! | Move | Effect |
//! |------|--------|
//! | [`Move::TwoOpt`] | Reverses a segment of one route (Croes, 1958) |
//! | [`Move::Relocate`] | Moves one order to another position, possibly on another route (Or, 1976) |
//! | [`Move::Swap`] | Exchanges two orders, within or across routes |
//! | [`Move::Reinsert`] | Places an unassigned order on a route |
//!
//! Moves are proposed uniformly at random among the kinds that are
//! structurally possible for the current draft. Feasibility is not checked
//! here; the caller applies the move and evaluates the touched routes.

use rand::Rng;

use crate::models::PlanDraft;

/// A single neighborhood move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Reverse `route[from..=to]` of one vehicle.
    TwoOpt {
        /// Vehicle index.
        vehicle: usize,
        /// First position of the reversed segment.
        from: usize,
        /// Last position of the reversed segment.
        to: usize,
    },
    /// Remove an order and insert it elsewhere.
    Relocate {
        /// Source vehicle.
        from_vehicle: usize,
        /// Position in the source route.
        from_pos: usize,
        /// Target vehicle.
        to_vehicle: usize,
        /// Position in the target route, after removal.
        to_pos: usize,
    },
    /// Exchange two orders.
    Swap {
        /// First vehicle.
        first_vehicle: usize,
        /// Position in the first route.
        first_pos: usize,
        /// Second vehicle.
        second_vehicle: usize,
        /// Position in the second route.
        second_pos: usize,
    },
    /// Take an order from the unassigned pool and insert it.
    Reinsert {
        /// Slot in the unassigned pool.
        slot: usize,
        /// Target vehicle.
        vehicle: usize,
        /// Position in the target route.
        position: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum MoveKind {
    TwoOpt,
    Relocate,
    Swap,
    Reinsert,
}

impl Move {
    /// Vehicles whose routes the move changes.
    pub fn vehicles(&self) -> (usize, Option<usize>) {
        let pair = |a: usize, b: usize| (a, (a != b).then_some(b));
        match *self {
            Move::TwoOpt { vehicle, .. } => (vehicle, None),
            Move::Relocate {
                from_vehicle,
                to_vehicle,
                ..
            } => pair(from_vehicle, to_vehicle),
            Move::Swap {
                first_vehicle,
                second_vehicle,
                ..
            } => pair(first_vehicle, second_vehicle),
            Move::Reinsert { vehicle, .. } => (vehicle, None),
        }
    }

    /// Applies the move to `draft`.
    ///
    /// # Panics
    ///
    /// Panics if a position is out of range for the draft.
    pub fn apply(&self, draft: &mut PlanDraft) {
        match *self {
            Move::TwoOpt { vehicle, from, to } => {
                let mut route = draft.take_route(vehicle);
                route[from..=to].reverse();
                draft.set_route(vehicle, route);
            }
            Move::Relocate {
                from_vehicle,
                from_pos,
                to_vehicle,
                to_pos,
            } => {
                let order = draft.remove(from_vehicle, from_pos);
                draft.insert(to_vehicle, to_pos, order);
            }
            Move::Swap {
                first_vehicle,
                first_pos,
                second_vehicle,
                second_pos,
            } => {
                if first_vehicle == second_vehicle {
                    let mut route = draft.take_route(first_vehicle);
                    route.swap(first_pos, second_pos);
                    draft.set_route(first_vehicle, route);
                } else {
                    let mut first = draft.take_route(first_vehicle);
                    let mut second = draft.take_route(second_vehicle);
                    std::mem::swap(&mut first[first_pos], &mut second[second_pos]);
                    draft.set_route(first_vehicle, first);
                    draft.set_route(second_vehicle, second);
                }
            }
            Move::Reinsert {
                slot,
                vehicle,
                position,
            } => {
                let order = draft.take_unassigned(slot);
                draft.insert(vehicle, position, order);
            }
        }
    }
}

/// Proposes a random move over the routes of `vehicles`.
///
/// Returns `None` only when no move of any kind exists, e.g. every route
/// is empty and there is nothing to reinsert.
pub fn propose<R: Rng>(
    draft: &PlanDraft,
    vehicles: &[usize],
    allow_reinsert: bool,
    rng: &mut R,
) -> Option<Move> {
    let non_empty: Vec<usize> = vehicles
        .iter()
        .copied()
        .filter(|&v| !draft.route(v).is_empty())
        .collect();
    let long: Vec<usize> = non_empty
        .iter()
        .copied()
        .filter(|&v| draft.route(v).len() >= 2)
        .collect();

    let mut kinds = Vec::with_capacity(4);
    if !long.is_empty() {
        kinds.push(MoveKind::TwoOpt);
    }
    if !non_empty.is_empty() && (vehicles.len() >= 2 || !long.is_empty()) {
        kinds.push(MoveKind::Relocate);
    }
    if non_empty.len() >= 2 || !long.is_empty() {
        kinds.push(MoveKind::Swap);
    }
    if allow_reinsert && !draft.unassigned().is_empty() && !vehicles.is_empty() {
        kinds.push(MoveKind::Reinsert);
    }
    if kinds.is_empty() {
        return None;
    }

    let mv = match kinds[rng.random_range(0..kinds.len())] {
        MoveKind::TwoOpt => {
            let vehicle = long[rng.random_range(0..long.len())];
            let len = draft.route(vehicle).len();
            let from = rng.random_range(0..len - 1);
            let to = rng.random_range(from + 1..len);
            Move::TwoOpt { vehicle, from, to }
        }
        MoveKind::Relocate => {
            let from_vehicle = non_empty[rng.random_range(0..non_empty.len())];
            let from_len = draft.route(from_vehicle).len();
            let from_pos = rng.random_range(0..from_len);
            let to_vehicle = if from_len < 2 {
                pick_other(vehicles, from_vehicle, rng)
            } else {
                vehicles[rng.random_range(0..vehicles.len())]
            };
            let to_len = if to_vehicle == from_vehicle {
                from_len - 1
            } else {
                draft.route(to_vehicle).len()
            };
            Move::Relocate {
                from_vehicle,
                from_pos,
                to_vehicle,
                to_pos: rng.random_range(0..=to_len),
            }
        }
        MoveKind::Swap => {
            if non_empty.len() >= 2 && (long.is_empty() || rng.random::<f64>() < 0.5) {
                let first_vehicle = non_empty[rng.random_range(0..non_empty.len())];
                let second_vehicle = pick_other(&non_empty, first_vehicle, rng);
                Move::Swap {
                    first_vehicle,
                    first_pos: rng.random_range(0..draft.route(first_vehicle).len()),
                    second_vehicle,
                    second_pos: rng.random_range(0..draft.route(second_vehicle).len()),
                }
            } else {
                let vehicle = long[rng.random_range(0..long.len())];
                let len = draft.route(vehicle).len();
                let first_pos = rng.random_range(0..len - 1);
                let second_pos = rng.random_range(first_pos + 1..len);
                Move::Swap {
                    first_vehicle: vehicle,
                    first_pos,
                    second_vehicle: vehicle,
                    second_pos,
                }
            }
        }
        MoveKind::Reinsert => {
            let vehicle = vehicles[rng.random_range(0..vehicles.len())];
            Move::Reinsert {
                slot: rng.random_range(0..draft.unassigned().len()),
                vehicle,
                position: rng.random_range(0..=draft.route(vehicle).len()),
            }
        }
    };
    Some(mv)
}

/// Picks a member of `pool` other than `exclude`. `pool` must hold at
/// least two distinct entries.
fn pick_other<R: Rng>(pool: &[usize], exclude: usize, rng: &mut R) -> usize {
    let idx = rng.random_range(0..pool.len() - 1);
    let candidate = pool[idx];
    if candidate == exclude {
        pool[pool.len() - 1]
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnassignedReason;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_two_opt_reverses_segment() {
        let mut draft = PlanDraft::from_routes(vec![vec![1, 2, 3, 4]]);
        Move::TwoOpt {
            vehicle: 0,
            from: 1,
            to: 3,
        }
        .apply(&mut draft);
        assert_eq!(draft.route(0), &[1, 4, 3, 2]);
    }

    #[test]
    fn test_relocate_between_routes() {
        let mut draft = PlanDraft::from_routes(vec![vec![1, 2], vec![3]]);
        let mv = Move::Relocate {
            from_vehicle: 0,
            from_pos: 0,
            to_vehicle: 1,
            to_pos: 1,
        };
        assert_eq!(mv.vehicles(), (0, Some(1)));
        mv.apply(&mut draft);
        assert_eq!(draft.route(0), &[2]);
        assert_eq!(draft.route(1), &[3, 1]);
    }

    #[test]
    fn test_swap_within_and_across() {
        let mut draft = PlanDraft::from_routes(vec![vec![1, 2], vec![3]]);
        Move::Swap {
            first_vehicle: 0,
            first_pos: 1,
            second_vehicle: 1,
            second_pos: 0,
        }
        .apply(&mut draft);
        assert_eq!(draft.routes(), &[vec![1, 3], vec![2]]);
        Move::Swap {
            first_vehicle: 0,
            first_pos: 0,
            second_vehicle: 0,
            second_pos: 1,
        }
        .apply(&mut draft);
        assert_eq!(draft.route(0), &[3, 1]);
    }

    #[test]
    fn test_reinsert_takes_from_pool() {
        let mut draft = PlanDraft::from_routes(vec![vec![1]]);
        draft.mark_unassigned(5, UnassignedReason::TimeWindow);
        Move::Reinsert {
            slot: 0,
            vehicle: 0,
            position: 0,
        }
        .apply(&mut draft);
        assert_eq!(draft.route(0), &[5, 1]);
        assert!(draft.unassigned().is_empty());
    }

    #[test]
    fn test_no_moves_on_empty_draft() {
        let draft = PlanDraft::new(3);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(propose(&draft, &[0, 1, 2], true, &mut rng).is_none());
    }

    #[test]
    fn test_proposals_stay_in_bounds() {
        let mut draft = PlanDraft::from_routes(vec![vec![0], vec![1, 2, 3], vec![]]);
        draft.mark_unassigned(4, UnassignedReason::CapacityExceeded);
        let vehicles = [0, 1, 2];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let mv = propose(&draft, &vehicles, true, &mut rng).expect("moves exist");
            let mut trial = draft.clone();
            mv.apply(&mut trial);
            assert_eq!(trial.num_assigned() + trial.unassigned().len(), 5);
        }
    }

    #[test]
    fn test_single_route_single_order() {
        let draft = PlanDraft::from_routes(vec![vec![0]]);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(propose(&draft, &[0], false, &mut rng).is_none());
    }
}
