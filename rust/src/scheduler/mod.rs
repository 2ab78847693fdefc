//! Resource-constrained dual-timeline scheduler.
//!
//! One topological pass places every task on a deterministic planned timeline
//! and a stochastic real timeline, serializing tasks that share a role.

mod core;
mod resource_schedule;
mod state;

pub use core::{build_schedule, TimelineScheduler};
pub use resource_schedule::ResourceSchedule;
pub use state::{
    calculate_planned_duration, calculate_project_duration, Schedule, TaskTiming,
};

pub(crate) use state::scheduled_tasks;
