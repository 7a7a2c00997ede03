//! Tasks, resources and the schedules assigned to them.

use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, ValidationError, ValidationIssue};
use crate::models::{check_non_negative, check_range, index_ids};

/// Half-open range of integer time slots `[earliest, latest)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    /// First usable slot.
    pub earliest: u32,
    /// One past the last usable slot.
    pub latest: u32,
}

impl SlotWindow {
    /// Creates a window.
    pub fn new(earliest: u32, latest: u32) -> Self {
        Self { earliest, latest }
    }

    /// Intersection with another window; `None` if empty.
    pub fn intersect(&self, other: &SlotWindow) -> Option<SlotWindow> {
        let earliest = self.earliest.max(other.earliest);
        let latest = self.latest.min(other.latest);
        (earliest < latest).then_some(SlotWindow { earliest, latest })
    }

    /// Start slots at which a task of `duration` slots fits inside.
    pub fn starts_for(&self, duration: u32) -> std::ops::RangeInclusive<u32> {
        match self.latest.checked_sub(duration) {
            Some(last) if last >= self.earliest => self.earliest..=last,
            // empty
            _ => 1..=0,
        }
    }
}

/// What a resource is. Only informs reporting; all kinds serve one task at
/// a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A vehicle.
    #[default]
    Vehicle,
    /// A driver.
    Driver,
    /// A warehouse loading dock.
    DockSlot,
}

/// A resource that serves one task at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier.
    pub id: String,
    /// Resource kind.
    #[serde(default)]
    pub kind: ResourceKind,
    /// Slots during which the resource can work; always if absent.
    #[serde(default)]
    pub availability: Option<SlotWindow>,
}

impl Resource {
    /// An always-available resource.
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            availability: None,
        }
    }

    /// Restricts availability.
    pub fn with_availability(mut self, window: SlotWindow) -> Self {
        self.availability = Some(window);
        self
    }
}

/// A delivery task that occupies one resource for `duration` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier.
    pub id: String,
    /// Slots of work.
    pub duration: u32,
    /// Weight of the start slot in the objective.
    #[serde(default = "default_priority")]
    pub priority: f64,
    /// The task must start and finish inside this window.
    pub window: SlotWindow,
}

fn default_priority() -> f64 {
    1.0
}

impl Task {
    /// Creates a task with priority 1.
    pub fn new(id: impl Into<String>, duration: u32, window: SlotWindow) -> Self {
        Self {
            id: id.into(),
            duration,
            priority: default_priority(),
            window,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Window in which this task may run on `resource`.
    pub fn window_on(&self, resource: &Resource) -> Option<SlotWindow> {
        match &resource.availability {
            Some(available) => self.window.intersect(available),
            None => Some(self.window),
        }
    }
}

/// Tasks to place on resources.
///
/// # Examples
///
/// ```
/// use u_logistics::scheduling::{Resource, ResourceKind, ScheduleRequest, SlotWindow, Task};
///
/// let request = ScheduleRequest {
///     tasks: vec![Task::new("t1", 2, SlotWindow::new(0, 8))],
///     resources: vec![Resource::new("driver-1", ResourceKind::Driver)],
/// };
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Tasks.
    pub tasks: Vec<Task>,
    /// Resources.
    pub resources: Vec<Resource>,
}

impl ScheduleRequest {
    /// Checks identifiers, durations, priorities and windows, collecting
    /// every issue.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        index_ids(EntityKind::Task, self.tasks.iter().map(|t| t.id.as_str()), &mut issues);
        index_ids(
            EntityKind::Resource,
            self.resources.iter().map(|r| r.id.as_str()),
            &mut issues,
        );

        for task in &self.tasks {
            let kind = EntityKind::Task;
            check_range(kind, &task.id, "duration", f64::from(task.duration), task.duration > 0, &mut issues);
            check_non_negative(kind, &task.id, "priority", task.priority, &mut issues);
            check_range(kind, &task.id, "priority", task.priority, task.priority.is_finite(), &mut issues);
            check_slots(kind, &task.id, "window", &task.window, &mut issues);
        }
        for resource in &self.resources {
            if let Some(window) = &resource.availability {
                check_slots(EntityKind::Resource, &resource.id, "availability", window, &mut issues);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

fn check_slots(
    kind: EntityKind,
    id: &str,
    field: &'static str,
    window: &SlotWindow,
    issues: &mut Vec<ValidationIssue>,
) {
    if window.earliest > window.latest {
        issues.push(ValidationIssue::MalformedTimeWindow {
            kind,
            id: id.to_string(),
            field,
            earliest: f64::from(window.earliest),
            latest: f64::from(window.latest),
        });
    }
}

/// How a schedule was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMethod {
    /// Greedy list scheduling.
    Heuristic,
    /// Exact slot-indexed model.
    Exact,
}

/// One task placed on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Task identifier.
    pub task_id: String,
    /// Resource identifier.
    pub resource_id: String,
    /// First occupied slot.
    pub start: u32,
    /// One past the last occupied slot.
    pub end: u32,
}

/// Result of scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Placed tasks, by resource then start.
    pub assignments: Vec<ScheduledTask>,
    /// Tasks that fit nowhere, in input order.
    pub unscheduled: Vec<String>,
    /// Σ priority × start over placed tasks.
    pub weighted_start: f64,
    /// Producer.
    pub method: ScheduleMethod,
}

impl Schedule {
    /// Placement of a task, if scheduled.
    pub fn assignment(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.assignments.iter().find(|a| a.task_id == task_id)
    }
}
