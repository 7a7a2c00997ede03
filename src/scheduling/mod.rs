//! Delivery scheduling on vehicles, drivers and dock slots.
//!
//! - [`ScheduleRequest`] — tasks with durations, priorities and slot
//!   windows, and the resources that serve them
//! - [`SlotScheduler`] — list scheduling, refined by the exact model when a
//!   solver is available
//! - [`Schedule`] — placed tasks, unscheduled tasks and the weighted start

mod model;
mod scheduler;

pub use model::{
    Resource, ResourceKind, Schedule, ScheduleMethod, ScheduleRequest, ScheduledTask, SlotWindow,
    Task,
};
pub use scheduler::{list_schedule, SlotScheduler};
