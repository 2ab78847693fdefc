//! Precedence graph and topological ordering.

use std::collections::VecDeque;

use crate::error::CyclicDependencyError;

/// Precedence DAG over task slots.
///
/// Slots are dense indices `0..n` assigned by the caller; `ids[slot]` is only
/// used to report blocked tasks when a cycle is found.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// slot -> slots that depend on it
    dependents: Vec<Vec<usize>>,
    /// slot -> number of dependencies
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// Build dependents adjacency and in-degree counts from per-slot dependency lists.
    pub fn new(dependencies: &[Vec<usize>]) -> Self {
        let n = dependencies.len();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        for (slot, deps) in dependencies.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(slot);
                in_degree[slot] += 1;
            }
        }

        Self {
            dependents,
            in_degree,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.in_degree.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.in_degree.is_empty()
    }

    /// Slots that list `slot` as a dependency.
    pub fn dependents(&self, slot: usize) -> &[usize] {
        &self.dependents[slot]
    }

    /// Produce one topological order using Kahn's algorithm.
    ///
    /// Ready tasks are taken in FIFO order, seeded in slot order, so the result
    /// is deterministic for a given input.
    ///
    /// # Returns
    /// * `Ok(order)` with every slot exactly once, dependencies first
    /// * `Err(CyclicDependencyError)` listing the ids still blocked when the queue empties
    pub fn topological_order(&self, ids: &[u32]) -> Result<Vec<usize>, CyclicDependencyError> {
        let mut in_degree = self.in_degree.clone();

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(slot, _)| slot)
            .collect();

        let mut order: Vec<usize> = Vec::with_capacity(self.len());

        while let Some(slot) = queue.pop_front() {
            order.push(slot);

            for &dependent in &self.dependents[slot] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != self.len() {
            let mut blocked: Vec<u32> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &degree)| degree > 0)
                .map(|(slot, _)| ids[slot])
                .collect();
            blocked.sort_unstable();
            return Err(CyclicDependencyError { blocked });
        }

        Ok(order)
    }
}
