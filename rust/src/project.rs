//! Validated static project topology.
//!
//! Everything that does not change between Monte Carlo trials is computed here
//! once: the task-id -> slot map, the role table, dependency slots, duration
//! samplers and the topological processing order. Trials only borrow it.

use rustc_hash::FxHashMap;

use crate::error::{InvalidTaskError, SimulationError};
use crate::graph::DependencyGraph;
use crate::models::Task;
use crate::sampler::DurationSampler;

/// Dense role id, used directly as an index into per-role vectors.
pub type RoleId = u32;

/// Distinct roles of a project, numbered in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    ids: FxHashMap<String, RoleId>,
    names: Vec<String>,
}

impl RoleTable {
    fn assign(&mut self, role: &str) -> RoleId {
        let names = &mut self.names;
        *self.ids.entry(role.to_owned()).or_insert_with(|| {
            names.push(role.to_owned());
            (names.len() - 1) as RoleId
        })
    }

    /// Id of a role name, if any task has that role.
    pub fn id(&self, role: &str) -> Option<RoleId> {
        self.ids.get(role).copied()
    }

    pub fn name(&self, id: RoleId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Role names indexed by `RoleId`.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Immutable, validated task set ready for scheduling.
#[derive(Debug, Clone)]
pub struct Project {
    /// Input records, slot-indexed (slot = input position).
    tasks: Vec<Task>,
    /// task_id -> slot
    slots: FxHashMap<u32, usize>,
    roles: RoleTable,
    /// slot -> role id
    task_roles: Vec<RoleId>,
    /// slot -> dependency slots, in input order
    dependencies: Vec<Vec<usize>>,
    /// slot -> duration distribution
    samplers: Vec<DurationSampler>,
    /// Topological order of slots.
    order: Vec<usize>,
}

impl Project {
    /// Validate the task records and build the static topology.
    ///
    /// # Errors
    /// * `InvalidTask` for non-positive ids, duplicate ids, unknown or self
    ///   dependencies, empty roles and bad distribution parameters
    /// * `CyclicDependency` if the dependency relation has a cycle
    pub fn new(tasks: Vec<Task>) -> Result<Self, SimulationError> {
        let n = tasks.len();
        let mut slots: FxHashMap<u32, usize> =
            FxHashMap::with_capacity_and_hasher(n, Default::default());

        for (slot, task) in tasks.iter().enumerate() {
            if task.task_id == 0 {
                return Err(InvalidTaskError::NonPositiveTaskId(task.task_id).into());
            }
            if slots.insert(task.task_id, slot).is_some() {
                return Err(InvalidTaskError::DuplicateTaskId(task.task_id).into());
            }
        }

        let mut roles = RoleTable::default();
        let mut task_roles = Vec::with_capacity(n);
        let mut dependencies = Vec::with_capacity(n);
        let mut samplers = Vec::with_capacity(n);

        for task in &tasks {
            if task.role.trim().is_empty() {
                return Err(InvalidTaskError::EmptyRole(task.task_id).into());
            }
            task_roles.push(roles.assign(&task.role));

            let mut deps = Vec::with_capacity(task.dependencies.len());
            for &dep_id in &task.dependencies {
                if dep_id == task.task_id {
                    return Err(InvalidTaskError::SelfDependency(task.task_id).into());
                }
                let Some(&dep_slot) = slots.get(&dep_id) else {
                    return Err(InvalidTaskError::UnknownDependency {
                        task_id: task.task_id,
                        dependency: dep_id,
                    }
                    .into());
                };
                // Repeated ids in a dependency list are one edge
                if !deps.contains(&dep_slot) {
                    deps.push(dep_slot);
                }
            }
            dependencies.push(deps);

            samplers.push(DurationSampler::new(task.task_id, task.mean, task.stddev)?);
        }

        let ids: Vec<u32> = tasks.iter().map(|t| t.task_id).collect();
        let order = DependencyGraph::new(&dependencies).topological_order(&ids)?;

        Ok(Self {
            tasks,
            slots,
            roles,
            task_roles,
            dependencies,
            samplers,
            order,
        })
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Input records in slot order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Input record at a slot.
    #[inline]
    pub fn task(&self, slot: usize) -> &Task {
        &self.tasks[slot]
    }

    /// Slot of a task id.
    pub fn slot_of(&self, task_id: u32) -> Option<usize> {
        self.slots.get(&task_id).copied()
    }

    /// Role table.
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// Number of distinct roles.
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Role id of the task at a slot.
    #[inline]
    pub fn role_of(&self, slot: usize) -> RoleId {
        self.task_roles[slot]
    }

    /// Dependency slots of the task at a slot.
    #[inline]
    pub fn dependencies_of(&self, slot: usize) -> &[usize] {
        &self.dependencies[slot]
    }

    /// Duration distributions in slot order.
    pub fn samplers(&self) -> &[DurationSampler] {
        &self.samplers
    }

    /// Topological processing order of slots.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CyclicDependencyError;

    fn make_task(id: u32, role: &str, deps: Vec<u32>) -> Task {
        Task::new(id, role, deps, 5.0, 1.0)
    }

    #[test]
    fn test_builds_slots_roles_and_order() {
        let project = Project::new(vec![
            make_task(3, "qa", vec![1, 2]),
            make_task(1, "dev", vec![]),
            make_task(2, "dev", vec![1]),
        ])
        .unwrap();

        assert_eq!(project.len(), 3);
        assert_eq!(project.slot_of(1), Some(1));
        assert_eq!(project.slot_of(9), None);
        assert_eq!(project.role_count(), 2);
        assert_eq!(project.role_of(1), project.role_of(2));
        assert_ne!(project.role_of(0), project.role_of(1));
        assert_eq!(project.dependencies_of(0), &[1, 2]);
        assert_eq!(project.order(), &[1, 2, 0]);
    }

    #[test]
    fn test_roles_numbered_by_first_appearance() {
        let project = Project::new(vec![
            make_task(1, "qa", vec![]),
            make_task(2, "dev", vec![]),
            make_task(3, "qa", vec![]),
            make_task(4, "analyst", vec![]),
        ])
        .unwrap();
        let roles = project.roles();

        assert_eq!(roles.names(), &["qa", "dev", "analyst"]);
        assert_eq!(roles.id("qa"), Some(0));
        assert_eq!(roles.id("pm"), None);
        assert_eq!(roles.name(2), Some("analyst"));
        assert_eq!(roles.name(3), None);
        assert_eq!(project.role_of(2), project.role_of(0));
        assert!(RoleTable::default().is_empty());
    }

    #[test]
    fn test_duplicate_dependency_is_one_edge() {
        let project = Project::new(vec![
            make_task(1, "dev", vec![]),
            make_task(2, "dev", vec![1, 1]),
        ])
        .unwrap();
        assert_eq!(project.dependencies_of(1), &[0]);
    }

    #[test]
    fn test_duplicate_task_id() {
        let err = Project::new(vec![make_task(1, "dev", vec![]), make_task(1, "qa", vec![])])
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidTask(InvalidTaskError::DuplicateTaskId(1))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let err = Project::new(vec![make_task(1, "dev", vec![42])]).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidTask(InvalidTaskError::UnknownDependency {
                task_id: 1,
                dependency: 42
            })
        );
    }

    #[test]
    fn test_self_dependency() {
        let err = Project::new(vec![make_task(1, "dev", vec![1])]).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidTask(InvalidTaskError::SelfDependency(1))
        );
    }

    #[test]
    fn test_zero_task_id_and_empty_role() {
        assert!(matches!(
            Project::new(vec![make_task(0, "dev", vec![])]),
            Err(SimulationError::InvalidTask(
                InvalidTaskError::NonPositiveTaskId(0)
            ))
        ));
        assert!(matches!(
            Project::new(vec![make_task(1, "  ", vec![])]),
            Err(SimulationError::InvalidTask(InvalidTaskError::EmptyRole(1)))
        ));
    }

    #[test]
    fn test_zero_mean_rejected() {
        let err = Project::new(vec![Task::new(1, "dev", vec![], 0.0, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidTask(InvalidTaskError::NonPositiveMean { task_id: 1, .. })
        ));
    }

    #[test]
    fn test_cycle_is_fatal() {
        let err = Project::new(vec![
            make_task(1, "dev", vec![2]),
            make_task(2, "qa", vec![1]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SimulationError::CyclicDependency(CyclicDependencyError {
                blocked: vec![1, 2]
            })
        );
    }
}
