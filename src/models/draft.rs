//! Plan-under-construction.
//!
//! Routes are stored as order index sequences, one per vehicle index, with
//! a separate unassigned pool. This allows cheap insertion and removal
//! without rebuilding full [`Route`](super::Route) objects; a
//! [`Plan`](super::Plan) is assembled once the search is done.

use super::UnassignedReason;

/// Mutable plan state owned by whoever is building or improving it.
///
/// # Examples
///
/// ```
/// use u_logistics::models::{PlanDraft, UnassignedReason};
///
/// let mut draft = PlanDraft::new(2);
/// draft.insert(0, 0, 3);
/// draft.insert(0, 0, 1);
/// draft.mark_unassigned(2, UnassignedReason::CapacityExceeded);
/// assert_eq!(draft.route(0), &[1, 3]);
/// assert_eq!(draft.num_assigned(), 2);
/// assert_eq!(draft.locate(3), Some((0, 1)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    routes: Vec<Vec<usize>>,
    unassigned: Vec<(usize, UnassignedReason)>,
}

impl PlanDraft {
    /// Creates a draft with an empty route per vehicle.
    pub fn new(num_vehicles: usize) -> Self {
        Self {
            routes: vec![Vec::new(); num_vehicles],
            unassigned: Vec::new(),
        }
    }

    /// Creates a draft from per-vehicle order sequences.
    pub fn from_routes(routes: Vec<Vec<usize>>) -> Self {
        Self {
            routes,
            unassigned: Vec::new(),
        }
    }

    /// Per-vehicle order sequences.
    pub fn routes(&self) -> &[Vec<usize>] {
        &self.routes
    }

    /// Order sequence of vehicle `vehicle`.
    pub fn route(&self, vehicle: usize) -> &[usize] {
        &self.routes[vehicle]
    }

    /// Replaces the sequence of vehicle `vehicle`.
    pub fn set_route(&mut self, vehicle: usize, stops: Vec<usize>) {
        self.routes[vehicle] = stops;
    }

    /// Takes the sequence of vehicle `vehicle`, leaving it empty.
    pub fn take_route(&mut self, vehicle: usize) -> Vec<usize> {
        std::mem::take(&mut self.routes[vehicle])
    }

    /// Inserts `order` at `position` in vehicle `vehicle`'s route.
    pub fn insert(&mut self, vehicle: usize, position: usize, order: usize) {
        self.routes[vehicle].insert(position, order);
    }

    /// Removes and returns the order at `position` of vehicle `vehicle`.
    pub fn remove(&mut self, vehicle: usize, position: usize) -> usize {
        self.routes[vehicle].remove(position)
    }

    /// Number of vehicle slots.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Number of orders placed on routes.
    pub fn num_assigned(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    /// Unassigned orders with their reasons.
    pub fn unassigned(&self) -> &[(usize, UnassignedReason)] {
        &self.unassigned
    }

    /// Adds an order to the unassigned pool.
    pub fn mark_unassigned(&mut self, order: usize, reason: UnassignedReason) {
        self.unassigned.push((order, reason));
    }

    /// Removes the entry at `slot` of the unassigned pool.
    pub fn take_unassigned(&mut self, slot: usize) -> usize {
        self.unassigned.remove(slot).0
    }

    /// Puts an entry back at `slot` of the unassigned pool, undoing
    /// [`PlanDraft::take_unassigned`].
    pub fn restore_unassigned(&mut self, slot: usize, order: usize, reason: UnassignedReason) {
        let slot = slot.min(self.unassigned.len());
        self.unassigned.insert(slot, (order, reason));
    }

    /// Empties the unassigned pool.
    pub fn drain_unassigned(&mut self) -> Vec<usize> {
        self.unassigned.drain(..).map(|(order, _)| order).collect()
    }

    /// Finds `(vehicle, position)` of an assigned order.
    pub fn locate(&self, order: usize) -> Option<(usize, usize)> {
        self.routes.iter().enumerate().find_map(|(v, route)| {
            route.iter().position(|&o| o == order).map(|pos| (v, pos))
        })
    }
}

/// The set of vehicle routes an operation may touch.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteScope {
    allowed: Vec<bool>,
}

impl RouteScope {
    /// Every route.
    pub fn all(num_vehicles: usize) -> Self {
        Self {
            allowed: vec![true; num_vehicles],
        }
    }

    /// Only the listed vehicles.
    pub fn only(num_vehicles: usize, vehicles: impl IntoIterator<Item = usize>) -> Self {
        let mut allowed = vec![false; num_vehicles];
        for v in vehicles {
            allowed[v] = true;
        }
        Self { allowed }
    }

    /// Returns `true` if vehicle `vehicle` is in scope.
    pub fn contains(&self, vehicle: usize) -> bool {
        self.allowed.get(vehicle).copied().unwrap_or(false)
    }

    /// Vehicle indices in scope, ascending.
    pub fn vehicles(&self) -> Vec<usize> {
        self.allowed
            .iter()
            .enumerate()
            .filter_map(|(v, &ok)| ok.then_some(v))
            .collect()
    }

    /// Number of vehicles in scope.
    pub fn len(&self) -> usize {
        self.allowed.iter().filter(|&&ok| ok).count()
    }

    /// Returns `true` if no vehicle is in scope.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_insert_remove() {
        let mut draft = PlanDraft::new(2);
        draft.insert(1, 0, 7);
        draft.insert(1, 1, 8);
        assert_eq!(draft.remove(1, 0), 7);
        assert_eq!(draft.route(1), &[8]);
        assert_eq!(draft.num_assigned(), 1);
        assert_eq!(draft.locate(7), None);
    }

    #[test]
    fn test_unassigned_pool() {
        let mut draft = PlanDraft::new(1);
        draft.mark_unassigned(4, UnassignedReason::TimeWindow);
        draft.mark_unassigned(5, UnassignedReason::CapacityExceeded);
        assert_eq!(draft.take_unassigned(0), 4);
        draft.restore_unassigned(0, 4, UnassignedReason::TimeWindow);
        assert_eq!(
            draft.unassigned(),
            &[(4, UnassignedReason::TimeWindow), (5, UnassignedReason::CapacityExceeded)]
        );
        assert_eq!(draft.take_unassigned(0), 4);
        assert_eq!(draft.drain_unassigned(), vec![5]);
        assert!(draft.unassigned().is_empty());
    }

    #[test]
    fn test_scope() {
        let scope = RouteScope::only(4, [3, 1]);
        assert!(scope.contains(1));
        assert!(!scope.contains(0));
        assert!(!scope.contains(9));
        assert_eq!(scope.vehicles(), vec![1, 3]);
        assert_eq!(scope.len(), 2);
        assert_eq!(RouteScope::all(3).len(), 3);
    }
}
