use std::collections::BTreeSet;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};

use crate::datetime::parse_day;

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct PairWindow {
  #[serde(default)]
  pub partner_id: String,
  #[serde(default)]
  pub start_date: String,
  #[serde(default)]
  pub end_date:   String
}

impl PairWindow {
  /// Parsed inclusive range, or `None`
  /// when the partner or either bound
  /// is missing or unreadable.
  pub fn range(
    &self
  ) -> Option<(NaiveDate, NaiveDate)> {
    if self.partner_id.trim().is_empty()
    {
      return None;
    }
    let start =
      parse_day(&self.start_date)?;
    let end = parse_day(&self.end_date)?;
    Some((start, end))
  }

  /// Whether both bounds parse and
  /// enclose `date`. The partner is not
  /// consulted.
  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    match (
      parse_day(&self.start_date),
      parse_day(&self.end_date)
    ) {
      | (Some(start), Some(end)) => {
        start <= date && date <= end
      }
      | _ => false
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
  pub id:        String,
  #[serde(default)]
  pub name:      String,
  #[serde(default)]
  pub pair_list: Vec<PairWindow>,
  #[serde(default)]
  pub off_days:  Vec<String>
}

impl Staff {
  /// Off days normalized to dates;
  /// unreadable entries are dropped.
  pub fn off_day_set(
    &self
  ) -> BTreeSet<NaiveDate> {
    self
      .off_days
      .iter()
      .filter_map(|raw| parse_day(raw))
      .collect()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
  pub id:         String,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub start_time: String,
  #[serde(default)]
  pub end_time:   String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub color:      Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
  Notification,
  Email
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Reminder {
  pub id:   String,
  /// Minutes before the shift start.
  pub time: i64,
  #[serde(rename = "type")]
  pub kind: ReminderKind
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub id:              String,
  #[serde(default)]
  pub staff_id:        String,
  #[serde(default)]
  pub shift_id:        String,
  #[serde(default)]
  pub shift_start:     String,
  #[serde(default)]
  pub shift_end:       String,
  #[serde(default)]
  pub is_updated:      bool,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub title:           Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub location:        Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub description:     Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub is_recurring:    Option<bool>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub recurrence_rule: Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Vec::is_empty"
  )]
  pub reminders:       Vec<Reminder>,
  #[serde(default)]
  pub tags:            Vec<String>
}

impl Assignment {
  pub fn has_tag(
    &self,
    tag: &str
  ) -> bool {
    self.tags.iter().any(|t| t == tag)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
  #[serde(default)]
  pub id:                  String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub name:                Option<String>,
  #[serde(default, alias = "startDate")]
  pub schedule_start_date: String,
  #[serde(default, alias = "endDate")]
  pub schedule_end_date:   String,
  #[serde(default)]
  pub staffs:              Vec<Staff>,
  #[serde(default)]
  pub shifts:              Vec<Shift>,
  #[serde(default)]
  pub assignments:         Vec<Assignment>
}

impl Schedule {
  #[tracing::instrument(skip_all)]
  pub fn from_json(
    raw: &str
  ) -> anyhow::Result<Self> {
    let schedule =
      serde_json::from_str::<Schedule>(
        raw
      )
      .context(
        "failed to parse schedule JSON"
      )?;
    tracing::debug!(
      id = %schedule.id,
      staffs = schedule.staffs.len(),
      shifts = schedule.shifts.len(),
      assignments = schedule.assignments.len(),
      "schedule parsed"
    );
    Ok(schedule)
  }

  pub fn to_json_pretty(
    &self
  ) -> anyhow::Result<String> {
    serde_json::to_string_pretty(self)
      .context(
        "failed to serialize schedule"
      )
  }

  /// Display window, or `None` while
  /// either bound is missing or
  /// unreadable.
  pub fn valid_window(
    &self
  ) -> Option<(NaiveDate, NaiveDate)> {
    let start = parse_day(
      &self.schedule_start_date
    )?;
    let end =
      parse_day(&self.schedule_end_date)?;
    Some((start, end))
  }

  pub fn staff(
    &self,
    id: &str
  ) -> Option<&Staff> {
    self
      .staffs
      .iter()
      .find(|staff| staff.id == id)
  }

  pub fn staff_index(
    &self,
    id: &str
  ) -> Option<usize> {
    self
      .staffs
      .iter()
      .position(|staff| staff.id == id)
  }

  pub fn staff_name(
    &self,
    id: &str
  ) -> Option<&str> {
    self
      .staff(id)
      .map(|staff| staff.name.as_str())
  }

  pub fn shift(
    &self,
    id: &str
  ) -> Option<&Shift> {
    self
      .shifts
      .iter()
      .find(|shift| shift.id == id)
  }

  pub fn shift_index(
    &self,
    id: &str
  ) -> Option<usize> {
    self
      .shifts
      .iter()
      .position(|shift| shift.id == id)
  }

  pub fn assignment(
    &self,
    id: &str
  ) -> Option<&Assignment> {
    self
      .assignments
      .iter()
      .find(|assignment| {
        assignment.id == id
      })
  }

  /// Assignments of one staff member,
  /// or all of them when no staff is
  /// selected. Input order.
  pub fn assignments_for<'a>(
    &'a self,
    staff_id: Option<&'a str>
  ) -> impl Iterator<Item = &'a Assignment>
  + 'a {
    self.assignments.iter().filter(
      move |assignment| {
        staff_id.is_none_or(|id| {
          assignment.staff_id == id
        })
      }
    )
  }
}
