use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::config::{
  Labels,
  Palette
};
use crate::datetime::{
  DayKeyFormat,
  format_clock,
  is_within_schedule_range,
  parse_timestamp,
  to_display_date
};
use crate::model::{
  Assignment,
  Schedule
};

const UPDATED_CLASS: &str = "highlight";
const INVALID_CLASS: &str =
  "invalid-date";

/// Calendar-ready view of one
/// assignment.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
  pub id:             String,
  pub staff_id:       String,
  pub shift_id:       String,
  pub title:          String,
  pub date:           Option<NaiveDate>,
  pub start:          Option<DateTime<Utc>>,
  pub end:            Option<DateTime<Utc>>,
  /// Position of the shift in the
  /// catalog; `None` when the shift id
  /// does not resolve.
  pub shift_index:    Option<usize>,
  pub color_class:    Option<String>,
  pub in_valid_range: bool,
  pub is_updated:     bool
}

impl DisplayEvent {
  pub fn class_names(&self) -> String {
    let mut classes =
      vec!["event".to_string()];
    if let Some(color) =
      self.color_class.as_ref()
    {
      classes.push(color.clone());
    }
    if self.is_updated {
      classes
        .push(UPDATED_CLASS.to_string());
    }
    if !self.in_valid_range {
      classes
        .push(INVALID_CLASS.to_string());
    }
    classes.join(" ")
  }

  pub fn falls_on(
    &self,
    date: NaiveDate
  ) -> bool {
    self.date == Some(date)
  }
}

/// Contents of the detail popup shown
/// when an event is clicked.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
  pub id:         String,
  pub staff_name: String,
  pub shift_name: String,
  pub date:       String,
  pub start_time: String,
  pub end_time:   String
}

/// Projects the assignments of the
/// selected staff (all staff when none
/// is selected) into display events.
///
/// Output follows assignment order.
/// Events outside the schedule window
/// are kept and flagged, not dropped.
#[tracing::instrument(skip(
  schedule, palette, labels, tz
))]
pub fn project_events(
  schedule: &Schedule,
  selected_staff_id: Option<&str>,
  palette: &Palette,
  labels: &Labels,
  tz: Tz
) -> Vec<DisplayEvent> {
  let events = schedule
    .assignments_for(selected_staff_id)
    .map(|assignment| {
      project_one(
        schedule, assignment, palette,
        labels, tz
      )
    })
    .collect::<Vec<_>>();

  debug!(
    events = events.len(),
    invalid = events
      .iter()
      .filter(|e| !e.in_valid_range)
      .count(),
    "events projected"
  );
  events
}

fn project_one(
  schedule: &Schedule,
  assignment: &Assignment,
  palette: &Palette,
  labels: &Labels,
  tz: Tz
) -> DisplayEvent {
  let shift =
    schedule.shift(&assignment.shift_id);
  let shift_index = schedule
    .shift_index(&assignment.shift_id);

  let title = shift
    .map(|shift| shift.name.clone())
    .filter(|name| !name.trim().is_empty())
    .or_else(|| {
      assignment
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
    })
    .unwrap_or_else(|| {
      labels.unknown_shift.clone()
    });

  let start =
    parse_timestamp(&assignment.shift_start);
  let end =
    parse_timestamp(&assignment.shift_end);
  let date =
    start.map(|ts| to_display_date(ts, tz));
  let in_valid_range = date
    .map(|day| {
      is_within_schedule_range(
        day, schedule
      )
    })
    .unwrap_or(false);

  DisplayEvent {
    id: assignment.id.clone(),
    staff_id: assignment.staff_id.clone(),
    shift_id: assignment.shift_id.clone(),
    title,
    date,
    start,
    end,
    shift_index,
    color_class: shift_index
      .map(|idx| palette.color_at(idx)),
    in_valid_range,
    is_updated: assignment.is_updated
  }
}

/// Detail popup for a clicked event;
/// `None` when the id no longer
/// resolves.
pub fn event_details(
  schedule: &Schedule,
  assignment_id: &str,
  labels: &Labels,
  tz: Tz
) -> Option<EventDetails> {
  let assignment =
    schedule.assignment(assignment_id)?;

  let staff_name = schedule
    .staff_name(&assignment.staff_id)
    .map(ToString::to_string)
    .unwrap_or_else(|| {
      labels.unknown_staff.clone()
    });
  let shift_name = schedule
    .shift(&assignment.shift_id)
    .map(|shift| shift.name.clone())
    .unwrap_or_else(|| {
      labels.unknown_shift.clone()
    });
  let date = parse_timestamp(
    &assignment.shift_start
  )
  .map(|ts| {
    DayKeyFormat::Display
      .format(to_display_date(ts, tz))
  })
  .unwrap_or_else(|| {
    labels.not_available.clone()
  });

  Some(EventDetails {
    id: assignment.id.clone(),
    staff_name,
    shift_name,
    date,
    start_time: clock_or(
      &assignment.shift_start,
      labels,
      tz
    ),
    end_time: clock_or(
      &assignment.shift_end,
      labels,
      tz
    )
  })
}

pub(crate) fn clock_or(
  raw: &str,
  labels: &Labels,
  tz: Tz
) -> String {
  if parse_timestamp(raw).is_some() {
    format_clock(raw, tz)
  } else {
    labels.not_available.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{
    Shift,
    Staff
  };

  fn sample() -> Schedule {
    Schedule {
      id: "sched".to_string(),
      schedule_start_date: "2024-01-01"
        .to_string(),
      schedule_end_date: "2024-01-31"
        .to_string(),
      staffs: vec![Staff {
        id:        "S1".to_string(),
        name:      "Ada".to_string(),
        pair_list: vec![],
        off_days:  vec![]
      }],
      shifts: vec![
        Shift {
          id:         "early".to_string(),
          name:       "Early".to_string(),
          start_time: "06:00".to_string(),
          end_time:   "14:00".to_string(),
          color:      None
        },
        Shift {
          id:         "late".to_string(),
          name:       "Late".to_string(),
          start_time: "14:00".to_string(),
          end_time:   "22:00".to_string(),
          color:      None
        },
      ],
      assignments: vec![
        Assignment {
          id: "a1".to_string(),
          staff_id: "S1".to_string(),
          shift_id: "late".to_string(),
          shift_start: "2024-01-10T14:00:00Z"
            .to_string(),
          shift_end: "2024-01-10T22:00:00Z"
            .to_string(),
          is_updated: true,
          ..Assignment::default()
        },
        Assignment {
          id: "a2".to_string(),
          staff_id: "S2".to_string(),
          shift_id: "early".to_string(),
          shift_start: "2024-02-02T06:00:00Z"
            .to_string(),
          shift_end: "2024-02-02T14:00:00Z"
            .to_string(),
          ..Assignment::default()
        },
        Assignment {
          id: "a3".to_string(),
          staff_id: "S1".to_string(),
          shift_id: "gone".to_string(),
          shift_start: "2024-01-03T06:00:00Z"
            .to_string(),
          shift_end: "broken".to_string(),
          title: Some("Cover".to_string()),
          ..Assignment::default()
        },
      ],
      ..Schedule::default()
    }
  }

  #[test]
  fn keeps_assignment_order_and_flags() {
    let events = project_events(
      &sample(),
      None,
      &Palette::default(),
      &Labels::default(),
      chrono_tz::UTC
    );
    let ids = events
      .iter()
      .map(|e| e.id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(ids, vec!["a1", "a2", "a3"]);

    assert_eq!(events[0].title, "Late");
    assert_eq!(events[0].shift_index, Some(1));
    assert!(events[0].in_valid_range);
    assert_eq!(
      events[0].class_names(),
      "event bg-two highlight"
    );

    assert!(!events[1].in_valid_range);
    assert_eq!(
      events[1].class_names(),
      "event bg-one invalid-date"
    );

    assert_eq!(events[2].title, "Cover");
    assert_eq!(events[2].shift_index, None);
    assert!(events[2].end.is_none());
  }

  #[test]
  fn filters_to_selected_staff() {
    let events = project_events(
      &sample(),
      Some("S1"),
      &Palette::default(),
      &Labels::default(),
      chrono_tz::UTC
    );
    assert_eq!(events.len(), 2);
    assert!(
      events.iter().all(|e| e.staff_id == "S1")
    );
  }

  #[test]
  fn empty_schedule_projects_nothing() {
    assert!(
      project_events(
        &Schedule::default(),
        None,
        &Palette::default(),
        &Labels::default(),
        chrono_tz::UTC
      )
      .is_empty()
    );
  }

  #[test]
  fn details_fall_back_to_unknown_labels() {
    let schedule = sample();
    let labels = Labels::default();

    let known = event_details(
      &schedule,
      "a1",
      &labels,
      chrono_tz::UTC
    )
    .expect("a1 exists");
    assert_eq!(known.staff_name, "Ada");
    assert_eq!(known.shift_name, "Late");
    assert_eq!(known.date, "10.01.2024");
    assert_eq!(known.start_time, "14:00");
    assert_eq!(known.end_time, "22:00");

    let dangling = event_details(
      &schedule,
      "a2",
      &labels,
      chrono_tz::UTC
    )
    .expect("a2 exists");
    assert_eq!(
      dangling.staff_name,
      "Unknown Staff"
    );

    let broken = event_details(
      &schedule,
      "a3",
      &labels,
      chrono_tz::UTC
    )
    .expect("a3 exists");
    assert_eq!(
      broken.shift_name,
      "Unknown Shift"
    );
    assert_eq!(broken.end_time, "N/A");

    assert!(
      event_details(
        &schedule,
        "missing",
        &labels,
        chrono_tz::UTC
      )
      .is_none()
    );
  }
}
