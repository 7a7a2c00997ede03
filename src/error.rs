//! Error types.
//!
//! Only [`ValidationError`] aborts a planning cycle. Infeasible insertions,
//! subsolver failures and exhausted budgets all degrade to a usable plan and
//! are reported through values ([`crate::constructive::InsertionOutcome`],
//! [`crate::local_search::StopReason`]) or logged.

use std::fmt;

use thiserror::Error;

/// Kind of entity a validation issue refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A depot.
    Depot,
    /// A vehicle.
    Vehicle,
    /// An order.
    Order,
    /// An inventory position.
    Inventory,
    /// A schedulable task.
    Task,
    /// A schedulable resource (vehicle, driver or dock slot).
    Resource,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Depot => "depot",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Order => "order",
            EntityKind::Inventory => "inventory position",
            EntityKind::Task => "task",
            EntityKind::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// A single problem found while validating a problem snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    /// Two entities of the same kind share an identifier.
    #[error("duplicate {kind} identifier `{id}`")]
    DuplicateId {
        /// Entity kind.
        kind: EntityKind,
        /// Duplicated identifier.
        id: String,
    },
    /// A quantity, capacity or cost that must be non-negative is negative.
    #[error("{kind} `{id}` has negative {field}: {value}")]
    NegativeValue {
        /// Entity kind.
        kind: EntityKind,
        /// Entity identifier.
        id: String,
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A time window whose earliest bound is after its latest bound, or
    /// whose bounds are not finite.
    #[error("{kind} `{id}` has malformed {field} [{earliest}, {latest}]")]
    MalformedTimeWindow {
        /// Entity kind.
        kind: EntityKind,
        /// Entity identifier.
        id: String,
        /// Which window (e.g. `time_window`, `availability`).
        field: &'static str,
        /// Earliest bound.
        earliest: f64,
        /// Latest bound.
        latest: f64,
    },
    /// An entity references a depot that does not exist.
    #[error("{kind} `{id}` references unknown depot `{depot_id}`")]
    UnknownDepot {
        /// Entity kind.
        kind: EntityKind,
        /// Entity identifier.
        id: String,
        /// Missing depot identifier.
        depot_id: String,
    },
    /// A value outside its allowed range (risk score, speed, factor).
    #[error("{kind} `{id}` has {field} out of range: {value}")]
    OutOfRange {
        /// Entity kind.
        kind: EntityKind,
        /// Entity identifier.
        id: String,
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// An update names an entity that is not part of the snapshot.
    #[error("update references unknown {kind} `{id}`")]
    UnknownEntity {
        /// Entity kind.
        kind: EntityKind,
        /// Missing identifier.
        id: String,
    },
}

/// A malformed or inconsistent problem snapshot.
///
/// Carries every issue found, not just the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Creates an error from a non-empty list of issues.
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// All issues found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of issues found.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if no issue was recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "problem validation failed with {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// Top-level error of the engine's fallible entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The problem snapshot is invalid; no plan is produced.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A record could not be (de)serialized.
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading or writing a record failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
