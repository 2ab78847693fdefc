//! Per-trial schedule record.

use crate::idle::{calculate_idle_time, IdleAttribution, IdleTime};
use crate::models::ScheduledTask;
use crate::project::Project;

/// Planned and real placement of one task in one trial.
///
/// Invariants: `planned_end = planned_start + planned_duration` and
/// `real_end = real_start + real_duration`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TaskTiming {
    pub planned_duration: f64,
    pub planned_start: f64,
    pub planned_end: f64,
    pub real_duration: f64,
    pub real_start: f64,
    pub real_end: f64,
}

/// Project finish in a trial: the latest real end of any task.
pub fn calculate_project_duration(timings: &[TaskTiming]) -> f64 {
    timings.iter().map(|t| t.real_end).fold(0.0, f64::max)
}

/// Planned finish: the latest planned end of any task.
pub fn calculate_planned_duration(timings: &[TaskTiming]) -> f64 {
    timings.iter().map(|t| t.planned_end).fold(0.0, f64::max)
}

/// A fully populated schedule for one trial.
///
/// Owns its timing arena (slot-indexed, parallel to `project.tasks()`) and
/// only borrows the static topology, so trials never share mutable state.
#[derive(Clone, Debug)]
pub struct Schedule<'p> {
    project: &'p Project,
    /// Seed the real durations were drawn with.
    seed: u64,
    /// Target percentile the planned durations were taken at.
    percentile: f64,
    timings: Vec<TaskTiming>,
}

impl<'p> Schedule<'p> {
    pub(crate) fn new(
        project: &'p Project,
        seed: u64,
        percentile: f64,
        timings: Vec<TaskTiming>,
    ) -> Self {
        Self {
            project,
            seed,
            percentile,
            timings,
        }
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Slot-indexed timings.
    pub fn timings(&self) -> &[TaskTiming] {
        &self.timings
    }

    /// Timing of a task by id.
    pub fn timing_of(&self, task_id: u32) -> Option<&TaskTiming> {
        self.project
            .slot_of(task_id)
            .map(|slot| &self.timings[slot])
    }

    pub fn into_timings(self) -> Vec<TaskTiming> {
        self.timings
    }

    pub fn project_duration(&self) -> f64 {
        calculate_project_duration(&self.timings)
    }

    pub fn planned_duration(&self) -> f64 {
        calculate_planned_duration(&self.timings)
    }

    pub fn idle_time(&self, attribution: IdleAttribution) -> IdleTime {
        calculate_idle_time(self.project, &self.timings, attribution)
    }

    /// Export records in input order.
    pub fn to_scheduled_tasks(&self) -> Vec<ScheduledTask> {
        scheduled_tasks(self.project, &self.timings)
    }
}

/// Join input records with their timings.
pub(crate) fn scheduled_tasks(project: &Project, timings: &[TaskTiming]) -> Vec<ScheduledTask> {
    project
        .tasks()
        .iter()
        .zip(timings)
        .map(|(task, t)| ScheduledTask {
            task_id: task.task_id,
            role: task.role.clone(),
            dependencies: task.dependencies.clone(),
            mean: task.mean,
            stddev: task.stddev,
            planned_duration: t.planned_duration,
            planned_start_time: t.planned_start,
            planned_end_time: t.planned_end,
            real_duration: t.real_duration,
            real_start_time: t.real_start,
            real_end_time: t.real_end,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(planned_end: f64, real_end: f64) -> TaskTiming {
        TaskTiming {
            planned_end,
            real_end,
            ..TaskTiming::default()
        }
    }

    #[test]
    fn test_durations_are_latest_ends() {
        let timings = vec![timing(3.0, 4.0), timing(9.0, 7.0), timing(5.0, 11.0)];
        assert_eq!(calculate_project_duration(&timings), 11.0);
        assert_eq!(calculate_planned_duration(&timings), 9.0);
    }

    #[test]
    fn test_empty_schedule_has_zero_duration() {
        assert_eq!(calculate_project_duration(&[]), 0.0);
        assert_eq!(calculate_planned_duration(&[]), 0.0);
    }
}
