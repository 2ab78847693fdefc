//! Per-role availability tracking for single-unit resources.

use crate::project::RoleId;

/// Earliest time each role's single resource unit becomes free.
///
/// One instance tracks one timeline (planned or real). Tasks are placed in
/// topological order and each placement only moves a role's ready time
/// forward, so no busy-period bookkeeping is needed.
#[derive(Clone, Debug)]
pub struct ResourceSchedule {
    /// role id -> ready time; every role starts free at time 0
    ready: Vec<f64>,
}

impl ResourceSchedule {
    /// Create a schedule for `role_count` roles, all free at time 0.
    pub fn new(role_count: usize) -> Self {
        Self {
            ready: vec![0.0; role_count],
        }
    }

    /// When `role` is next free.
    #[inline]
    pub fn next_available_time(&self, role: RoleId) -> f64 {
        self.ready[role as usize]
    }

    /// Occupy `role` exclusively until `end`.
    ///
    /// `end` must not precede the role's current ready time; a task never
    /// starts before the role is free and durations are positive.
    #[inline]
    pub fn reserve_until(&mut self, role: RoleId, end: f64) {
        let slot = &mut self.ready[role as usize];
        debug_assert!(end >= *slot, "role {role} would move back in time");
        *slot = end;
    }

    /// Number of tracked roles.
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}
