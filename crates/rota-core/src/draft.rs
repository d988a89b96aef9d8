use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono::NaiveTime;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  info,
  warn
};

use crate::datetime::{
  DayKeyFormat,
  parse_day
};
use crate::model::{
  Assignment,
  Schedule
};
use crate::mutation::toggled;

const DRAFT_TIME_FORMAT: &str = "%H:%M";

/// Form state for a new assignment
/// before it is committed.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentDraft {
  pub title:           String,
  pub staff_id:        String,
  pub shift_id:        String,
  pub date:            String,
  pub start_time:      String,
  pub end_time:        String,
  pub location:        String,
  pub description:     String,
  pub is_recurring:    bool,
  pub recurrence_rule: String,
  pub tags:            Vec<String>
}

impl AssignmentDraft {
  pub fn toggle_tag(&mut self, tag: &str) {
    self.tags = toggled(&self.tags, tag);
  }

  /// Validates the draft and turns it
  /// into an assignment marked as
  /// updated.
  #[tracing::instrument(skip(
    self, schedule
  ))]
  pub fn into_assignment(
    self,
    schedule: &Schedule,
    id: String
  ) -> anyhow::Result<Assignment> {
    let mut missing = Vec::new();
    if self.title.trim().is_empty() {
      missing.push("title");
    }
    if self.staff_id.trim().is_empty() {
      missing.push("staffId");
    }
    if !missing.is_empty() {
      bail!(
        "missing required fields: {}",
        missing.join(", ")
      );
    }

    let date = parse_day(&self.date)
      .ok_or_else(|| {
        anyhow!(
          "invalid date: {:?}",
          self.date
        )
      })?;
    let start =
      parse_clock(&self.start_time)
        .context("invalid start time")?;
    let end = parse_clock(&self.end_time)
      .context("invalid end time")?;

    if schedule.staff(&self.staff_id).is_none()
    {
      warn!(staff = %self.staff_id, "draft references unknown staff");
    }
    if !self.shift_id.is_empty()
      && schedule
        .shift(&self.shift_id)
        .is_none()
    {
      warn!(shift = %self.shift_id, "draft references unknown shift");
    }

    let day = DayKeyFormat::Iso.format(date);
    let assignment = Assignment {
      id,
      staff_id: self.staff_id,
      shift_id: self.shift_id,
      shift_start: format!(
        "{day}T{}:00",
        start.format(DRAFT_TIME_FORMAT)
      ),
      shift_end: format!(
        "{day}T{}:00",
        end.format(DRAFT_TIME_FORMAT)
      ),
      is_updated: true,
      title: Some(self.title),
      location: non_blank(self.location),
      description: non_blank(
        self.description
      ),
      is_recurring: Some(
        self.is_recurring
      ),
      recurrence_rule: non_blank(
        self.recurrence_rule
      ),
      reminders: Vec::new(),
      tags: self.tags
    };

    info!(
      assignment = %assignment.id,
      staff = %assignment.staff_id,
      start = %assignment.shift_start,
      "assignment drafted"
    );
    Ok(assignment)
  }
}

fn parse_clock(
  raw: &str
) -> anyhow::Result<NaiveTime> {
  NaiveTime::parse_from_str(
    raw.trim(),
    DRAFT_TIME_FORMAT
  )
  .with_context(|| {
    format!("expected HH:MM, got {raw:?}")
  })
}

fn non_blank(
  value: String
) -> Option<String> {
  if value.trim().is_empty() {
    None
  } else {
    Some(value)
  }
}
