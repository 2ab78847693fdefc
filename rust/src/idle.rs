//! Idle-time attribution.
//!
//! After a schedule is complete, slippage of a task's real start behind its
//! planned start is charged to roles as idle days.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::SimulationError;
use crate::project::{Project, RoleId, RoleTable};
use crate::scheduler::TaskTiming;

/// How slippage is turned into idle days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleAttribution {
    /// A delayed task's role is charged only when the dependency that finished
    /// last belongs to a different role.
    #[default]
    CrossRole,
    /// Every task charges `real_start - planned_start` to its own role.
    TotalLag,
}

impl IdleAttribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrossRole => "cross_role",
            Self::TotalLag => "total_lag",
        }
    }
}

impl FromStr for IdleAttribution {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cross_role" => Ok(Self::CrossRole),
            "total_lag" => Ok(Self::TotalLag),
            other => Err(SimulationError::InvalidConfig(format!(
                "Unknown idle attribution strategy: {other}"
            ))),
        }
    }
}

/// Idle days per role, indexed by `RoleId`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdleTime {
    by_role: Vec<f64>,
}

impl IdleTime {
    /// All-zero accumulator for `role_count` roles.
    pub fn zeros(role_count: usize) -> Self {
        Self {
            by_role: vec![0.0; role_count],
        }
    }

    #[inline]
    fn add(&mut self, role: RoleId, days: f64) {
        self.by_role[role as usize] += days;
    }

    /// Idle days of one role (zero if the role never idled).
    pub fn get(&self, role: RoleId) -> f64 {
        self.by_role.get(role as usize).copied().unwrap_or(0.0)
    }

    /// Raw per-role vector.
    pub fn by_role(&self) -> &[f64] {
        &self.by_role
    }

    /// Sum over all roles.
    pub fn total(&self) -> f64 {
        self.by_role.iter().sum()
    }

    /// Role name -> idle days, containing only roles with nonzero idle time.
    pub fn to_map(&self, roles: &RoleTable) -> HashMap<String, f64> {
        self.by_role
            .iter()
            .enumerate()
            .filter(|(_, &days)| days != 0.0)
            .filter_map(|(id, &days)| {
                roles
                    .name(id as RoleId)
                    .map(|name| (name.to_string(), days))
            })
            .collect()
    }
}

/// Attribute idle time for a fully scheduled task set.
///
/// `timings` must be slot-indexed and belong to `project`.
pub fn calculate_idle_time(
    project: &Project,
    timings: &[TaskTiming],
    attribution: IdleAttribution,
) -> IdleTime {
    let mut idle = IdleTime::zeros(project.role_count());

    for (slot, timing) in timings.iter().enumerate() {
        let role = project.role_of(slot);
        let delay = timing.real_start - timing.planned_start;

        match attribution {
            IdleAttribution::TotalLag => idle.add(role, delay),
            IdleAttribution::CrossRole => {
                if delay <= 0.0 {
                    continue;
                }
                // Latest real finish among dependencies; first one wins ties
                let mut blocker: Option<usize> = None;
                for &dep in project.dependencies_of(slot) {
                    match blocker {
                        Some(b) if timings[dep].real_end <= timings[b].real_end => {}
                        _ => blocker = Some(dep),
                    }
                }
                if let Some(blocker) = blocker {
                    if project.role_of(blocker) != role {
                        idle.add(role, delay);
                    }
                }
            }
        }
    }

    idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn timing(planned_start: f64, real_start: f64, real_end: f64) -> TaskTiming {
        TaskTiming {
            planned_duration: 1.0,
            planned_start,
            planned_end: planned_start + 1.0,
            real_duration: real_end - real_start,
            real_start,
            real_end,
        }
    }

    fn project(tasks: Vec<(u32, &str, Vec<u32>)>) -> Project {
        Project::new(
            tasks
                .into_iter()
                .map(|(id, role, deps)| Task::new(id, role, deps, 1.0, 0.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_strategies() {
        assert_eq!(
            "cross_role".parse::<IdleAttribution>().unwrap(),
            IdleAttribution::CrossRole
        );
        assert_eq!(
            "total_lag".parse::<IdleAttribution>().unwrap(),
            IdleAttribution::TotalLag
        );
        assert!("naive".parse::<IdleAttribution>().is_err());
        assert_eq!(IdleAttribution::TotalLag.as_str(), "total_lag");
    }

    #[test]
    fn test_cross_role_delay_charged_to_waiting_role() {
        // qa task 2 waits on dev task 1 which overran by 3 days
        let project = project(vec![(1, "dev", vec![]), (2, "qa", vec![1])]);
        let timings = vec![timing(0.0, 0.0, 4.0), timing(1.0, 4.0, 5.0)];

        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        let qa = project.roles().id("qa").unwrap();
        let dev = project.roles().id("dev").unwrap();

        assert!((idle.get(qa) - 3.0).abs() < 1e-9);
        assert_eq!(idle.get(dev), 0.0);

        let map = idle.to_map(project.roles());
        assert_eq!(map.len(), 1);
        assert!((map["qa"] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_role_blocker_charges_nothing() {
        let project = project(vec![(1, "dev", vec![]), (2, "dev", vec![1])]);
        let timings = vec![timing(0.0, 0.0, 4.0), timing(1.0, 4.0, 5.0)];

        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        assert_eq!(idle.total(), 0.0);
        assert!(idle.to_map(project.roles()).is_empty());
    }

    #[test]
    fn test_latest_dependency_decides_blame() {
        // Task 3 (dev) depends on 1 (dev, finished late) and 2 (qa, finished earlier)
        let project = project(vec![
            (1, "dev", vec![]),
            (2, "qa", vec![]),
            (3, "dev", vec![1, 2]),
        ]);
        let timings = vec![
            timing(0.0, 0.0, 6.0),
            timing(0.0, 0.0, 2.0),
            timing(1.0, 6.0, 7.0),
        ];
        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        assert_eq!(idle.total(), 0.0);

        // Swap which dependency is late: now qa is to blame
        let timings = vec![
            timing(0.0, 0.0, 2.0),
            timing(0.0, 0.0, 6.0),
            timing(1.0, 6.0, 7.0),
        ];
        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        let dev = project.roles().id("dev").unwrap();
        assert!((idle.get(dev) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_listed_dependency() {
        let project = project(vec![
            (1, "dev", vec![]),
            (2, "qa", vec![]),
            (3, "dev", vec![1, 2]),
        ]);
        let timings = vec![
            timing(0.0, 0.0, 5.0),
            timing(0.0, 0.0, 5.0),
            timing(1.0, 5.0, 6.0),
        ];
        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        assert_eq!(idle.total(), 0.0);
    }

    #[test]
    fn test_tasks_without_dependencies_never_idle_cross_role() {
        let project = project(vec![(1, "dev", vec![])]);
        let timings = vec![timing(0.0, 2.0, 3.0)];
        let idle = calculate_idle_time(&project, &timings, IdleAttribution::CrossRole);
        assert_eq!(idle.total(), 0.0);
    }

    #[test]
    fn test_total_lag_sums_every_task() {
        let project = project(vec![
            (1, "dev", vec![]),
            (2, "dev", vec![1]),
            (3, "qa", vec![1]),
        ]);
        let timings = vec![
            timing(0.0, 1.0, 2.0),
            timing(1.0, 3.0, 4.0),
            timing(1.0, 2.5, 3.5),
        ];
        let idle = calculate_idle_time(&project, &timings, IdleAttribution::TotalLag);
        let dev = project.roles().id("dev").unwrap();
        let qa = project.roles().id("qa").unwrap();
        assert!((idle.get(dev) - 3.0).abs() < 1e-9);
        assert!((idle.get(qa) - 1.5).abs() < 1e-9);
    }
}
