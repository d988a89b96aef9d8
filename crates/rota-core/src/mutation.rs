use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datetime::format_timestamp;
use crate::model::Assignment;

/// Partial update for one assignment. Absent fields leave the target
/// untouched when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_updated: Option<bool>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.staff_id.is_none()
            && self.shift_start.is_none()
            && self.shift_end.is_none()
            && self.tags.is_none()
            && self.is_updated.is_none()
    }

    /// Shallow merge into a copy of `assignment`.
    pub fn apply_to(&self, assignment: &Assignment) -> Assignment {
        let mut merged = assignment.clone();
        if let Some(staff_id) = self.staff_id.as_ref() {
            merged.staff_id = staff_id.clone();
        }
        if let Some(shift_start) = self.shift_start.as_ref() {
            merged.shift_start = shift_start.clone();
        }
        if let Some(shift_end) = self.shift_end.as_ref() {
            merged.shift_end = shift_end.clone();
        }
        if let Some(tags) = self.tags.as_ref() {
            merged.tags = tags.clone();
        }
        if let Some(is_updated) = self.is_updated {
            merged.is_updated = is_updated;
        }
        merged
    }
}

/// Moves an assignment to another staff member. Dropping onto the current
/// owner is not a change.
pub fn reassign_staff(assignment: &Assignment, new_staff_id: &str) -> Option<AssignmentPatch> {
    if assignment.staff_id == new_staff_id {
        debug!(assignment = %assignment.id, staff = new_staff_id, "drop on current staff ignored");
        return None;
    }

    debug!(
        assignment = %assignment.id,
        from = %assignment.staff_id,
        to = new_staff_id,
        "assignment reassigned"
    );
    Some(AssignmentPatch {
        id: assignment.id.clone(),
        staff_id: Some(new_staff_id.to_string()),
        is_updated: Some(true),
        ..AssignmentPatch::default()
    })
}

/// New start/end after a calendar drag. A missing end collapses onto the
/// start.
pub fn reschedule_assignment(
    assignment: &Assignment,
    new_start: DateTime<Utc>,
    new_end: Option<DateTime<Utc>>,
) -> AssignmentPatch {
    let end = new_end.unwrap_or(new_start);
    debug!(
        assignment = %assignment.id,
        start = %new_start,
        end = %end,
        "assignment rescheduled"
    );
    AssignmentPatch {
        id: assignment.id.clone(),
        shift_start: Some(format_timestamp(new_start)),
        shift_end: Some(format_timestamp(end)),
        is_updated: Some(true),
        ..AssignmentPatch::default()
    }
}

pub fn toggle_tag(assignment: &Assignment, tag: &str) -> AssignmentPatch {
    AssignmentPatch {
        id: assignment.id.clone(),
        tags: Some(toggled(&assignment.tags, tag)),
        ..AssignmentPatch::default()
    }
}

pub(crate) fn toggled(tags: &[String], tag: &str) -> Vec<String> {
    let mut next = tags.to_vec();
    match next.iter().position(|t| t == tag) {
        Some(idx) => {
            next.remove(idx);
        }
        None => next.push(tag.to_string()),
    }
    next
}
