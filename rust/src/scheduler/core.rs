//! Core dual-timeline scheduling pass.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimulationConfig;
use crate::error::{SimulationError, TrialExecutionError};
use crate::project::Project;
use crate::sampler::planned_durations;
use crate::log_debug;

use super::resource_schedule::ResourceSchedule;
use super::state::{calculate_planned_duration, Schedule, TaskTiming};

/// Place every task on both timelines in one topological pass.
///
/// For each task, in `project.order()`:
/// - `planned_start = max(dependency planned ends, role planned ready time)`
/// - `real_start = max(planned_start, dependency real ends, role real ready time)`,
///   where the `planned_start` floor only applies when `hold_to_planned_start`
///
/// Both durations slices are slot-indexed.
pub(crate) fn place_tasks(
    project: &Project,
    planned: &[f64],
    real: &[f64],
    hold_to_planned_start: bool,
    verbosity: u8,
) -> Vec<TaskTiming> {
    let mut timings = vec![TaskTiming::default(); project.len()];
    let mut planned_roles = ResourceSchedule::new(project.role_count());
    let mut real_roles = ResourceSchedule::new(project.role_count());

    for &slot in project.order() {
        let role = project.role_of(slot);
        let deps = project.dependencies_of(slot);

        // Planned timeline
        let planned_dep_end = deps
            .iter()
            .map(|&dep| timings[dep].planned_end)
            .fold(0.0, f64::max);
        let planned_start = planned_dep_end.max(planned_roles.next_available_time(role));
        let planned_end = planned_start + planned[slot];
        planned_roles.reserve_until(role, planned_end);

        // Real timeline
        let real_dep_end = deps
            .iter()
            .map(|&dep| timings[dep].real_end)
            .fold(0.0, f64::max);
        let kickoff = if hold_to_planned_start {
            planned_start
        } else {
            0.0
        };
        let real_start = kickoff
            .max(real_dep_end)
            .max(real_roles.next_available_time(role));
        let real_end = real_start + real[slot];
        real_roles.reserve_until(role, real_end);

        timings[slot] = TaskTiming {
            planned_duration: planned[slot],
            planned_start,
            planned_end,
            real_duration: real[slot],
            real_start,
            real_end,
        };

        log_debug!(
            verbosity,
            "task {} ({}): planned [{:.2}, {:.2}] real [{:.2}, {:.2}]",
            project.task(slot).task_id,
            project.task(slot).role,
            planned_start,
            planned_end,
            real_start,
            real_end
        );
    }

    timings
}

/// Scheduler bound to one project and one target percentile.
///
/// Planned durations are computed once here and reused by every trial.
#[derive(Clone, Debug)]
pub struct TimelineScheduler<'p> {
    project: &'p Project,
    percentile: f64,
    planned: Vec<f64>,
    hold_to_planned_start: bool,
    verbosity: u8,
}

impl<'p> TimelineScheduler<'p> {
    /// Create a scheduler for `percentile` (must lie in (0, 1)).
    pub fn new(
        project: &'p Project,
        percentile: f64,
        config: &SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let planned = planned_durations(project.samplers(), percentile)?;
        Ok(Self {
            project,
            percentile,
            planned,
            hold_to_planned_start: config.hold_to_planned_start,
            verbosity: config.verbosity,
        })
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Slot-indexed planned durations.
    pub fn planned_durations(&self) -> &[f64] {
        &self.planned
    }

    /// Draw one real duration per task from a generator seeded with `seed`.
    ///
    /// Draws happen in slot order, so the result depends only on the seed.
    pub fn sample_real_durations(&self, seed: u64) -> Result<Vec<f64>, TrialExecutionError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut real = Vec::with_capacity(self.project.len());

        for (slot, sampler) in self.project.samplers().iter().enumerate() {
            let duration = sampler.sample(&mut rng);
            self.check_real_duration(slot, duration, seed)?;
            real.push(duration);
        }

        Ok(real)
    }

    fn check_real_duration(
        &self,
        slot: usize,
        duration: f64,
        seed: u64,
    ) -> Result<(), TrialExecutionError> {
        if duration.is_finite() && duration > 0.0 {
            return Ok(());
        }
        Err(TrialExecutionError {
            seed,
            percentile: self.percentile,
            task_id: self.project.task(slot).task_id,
            reason: format!("sampled duration {duration} is not a positive number"),
        })
    }

    /// Build one trial's schedule from freshly sampled real durations.
    pub fn schedule(&self, seed: u64) -> Result<Schedule<'p>, TrialExecutionError> {
        let real = self.sample_real_durations(seed)?;
        Ok(self.place(&real, seed))
    }

    /// Build a schedule from caller-supplied real durations (slot-indexed).
    ///
    /// # Errors
    /// `InvalidConfig` if `real` does not hold one duration per task, and
    /// `TrialExecution` if any duration is not a positive number.
    pub fn schedule_with_durations(
        &self,
        real: &[f64],
        seed: u64,
    ) -> Result<Schedule<'p>, SimulationError> {
        if real.len() != self.project.len() {
            return Err(SimulationError::InvalidConfig(format!(
                "expected {} real durations, got {}",
                self.project.len(),
                real.len()
            )));
        }
        for (slot, &duration) in real.iter().enumerate() {
            self.check_real_duration(slot, duration, seed)?;
        }
        Ok(self.place(real, seed))
    }

    fn place(&self, real: &[f64], seed: u64) -> Schedule<'p> {
        let timings = place_tasks(
            self.project,
            &self.planned,
            real,
            self.hold_to_planned_start,
            self.verbosity,
        );
        Schedule::new(self.project, seed, self.percentile, timings)
    }

    /// Planned finish of the deterministic baseline, `max(planned_end)`.
    ///
    /// The planned timeline does not depend on real durations, so the planned
    /// durations stand in for them here.
    pub fn planned_project_duration(&self) -> f64 {
        let timings = place_tasks(
            self.project,
            &self.planned,
            &self.planned,
            self.hold_to_planned_start,
            self.verbosity,
        );
        calculate_planned_duration(&timings)
    }
}

/// Sample durations for `project` and schedule it once.
///
/// # Arguments
/// * `project` - Validated task set
/// * `percentile` - Target percentile for planned durations, in (0, 1)
/// * `seed` - Seed for the real duration draws
/// * `config` - Kickoff policy and verbosity
pub fn build_schedule<'p>(
    project: &'p Project,
    percentile: f64,
    seed: u64,
    config: &SimulationConfig,
) -> Result<Schedule<'p>, SimulationError> {
    let scheduler = TimelineScheduler::new(project, percentile, config)?;
    Ok(scheduler.schedule(seed)?)
}
