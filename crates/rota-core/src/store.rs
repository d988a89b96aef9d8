use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::model::{Assignment, Schedule};
use crate::mutation::AssignmentPatch;

/// Single-writer holder of the current schedule.
///
/// Every write publishes a fresh snapshot; readers holding an earlier
/// `Arc` keep seeing the data they were handed.
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    current: Arc<Schedule>,
}

impl ScheduleStore {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            current: Arc::new(schedule),
        }
    }

    pub fn snapshot(&self) -> Arc<Schedule> {
        Arc::clone(&self.current)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.current
    }

    /// Merges `patch` into the assignment with the same id. Returns
    /// `false`, leaving the store as it was, when no assignment matches.
    #[instrument(skip(self, patch), fields(assignment = %patch.id))]
    pub fn apply(&mut self, patch: &AssignmentPatch) -> bool {
        let Some(idx) = self
            .current
            .assignments
            .iter()
            .position(|a| a.id == patch.id)
        else {
            warn!("patch for unknown assignment ignored");
            return false;
        };

        let mut next = Schedule::clone(&self.current);
        next.assignments[idx] = patch.apply_to(&next.assignments[idx]);
        self.current = Arc::new(next);
        debug!("assignment patch applied");
        true
    }

    #[instrument(skip(self, assignment), fields(assignment = %assignment.id))]
    pub fn add_assignment(&mut self, assignment: Assignment) {
        let mut next = Schedule::clone(&self.current);
        next.assignments.push(assignment);
        self.current = Arc::new(next);
        debug!(total = self.current.assignments.len(), "assignment added");
    }

    /// Clears the update marker on the given assignments once the remote
    /// side has accepted them. Returns how many were cleared.
    #[instrument(skip(self, ids))]
    pub fn acknowledge_sync<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids = ids.into_iter().collect::<BTreeSet<_>>();
        let pending = self
            .current
            .assignments
            .iter()
            .filter(|a| a.is_updated && ids.contains(a.id.as_str()))
            .count();
        if pending == 0 {
            return 0;
        }

        let mut next = Schedule::clone(&self.current);
        for assignment in next
            .assignments
            .iter_mut()
            .filter(|a| ids.contains(a.id.as_str()))
        {
            assignment.is_updated = false;
        }
        self.current = Arc::new(next);
        debug!(cleared = pending, "sync acknowledged");
        pending
    }

    pub fn into_schedule(self) -> Schedule {
        Arc::unwrap_or_clone(self.current)
    }
}
