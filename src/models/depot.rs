//! Depot type.

use serde::{Deserialize, Serialize};

use super::{Location, TimeWindow};

/// A depot where vehicles start and end their routes.
///
/// `capacity` bounds the total demand dispatched from the depot in one
/// planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    id: String,
    location: Location,
    capacity: i32,
    #[serde(default)]
    hours: Option<TimeWindow>,
}

impl Depot {
    /// Creates a depot that is always open.
    pub fn new(id: impl Into<String>, location: Location, capacity: i32) -> Self {
        Self {
            id: id.into(),
            location,
            capacity,
            hours: None,
        }
    }

    /// Sets operating hours.
    pub fn with_hours(mut self, hours: TimeWindow) -> Self {
        self.hours = Some(hours);
        self
    }

    /// Depot identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Depot location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Dispatch capacity in units.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Operating hours, if restricted.
    pub fn hours(&self) -> Option<&TimeWindow> {
        self.hours.as_ref()
    }
}
