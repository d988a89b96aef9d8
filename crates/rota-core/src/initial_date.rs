use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use tracing::debug;

use crate::datetime::{
  first_day_of_month,
  parse_day,
  parse_timestamp,
  to_display_date
};
use crate::model::Schedule;

/// Date the calendar should open on.
///
/// Earliest pairing window start of
/// the selected staff, else the
/// earliest shift start among the
/// relevant assignments, both
/// truncated to the first of their
/// month; `today` when neither yields
/// a readable date.
#[tracing::instrument(skip(schedule, today, tz))]
pub fn resolve_initial_date(
  schedule: &Schedule,
  selected_staff_id: Option<&str>,
  today: NaiveDate,
  tz: Tz
) -> NaiveDate {
  if let Some(date) =
    selected_staff_id.and_then(|id| {
      earliest_pair_start(schedule, id)
    })
  {
    debug!(%date, "opening on first pairing month");
    return first_day_of_month(date);
  }

  if let Some(ts) =
    earliest_shift_start(
      schedule,
      selected_staff_id
    )
  {
    let date = to_display_date(ts, tz);
    debug!(%date, "opening on first shift month");
    return first_day_of_month(date);
  }

  debug!(%today, "no dated entries; opening on today");
  today
}

fn earliest_pair_start(
  schedule: &Schedule,
  staff_id: &str
) -> Option<NaiveDate> {
  let staff = schedule.staff(staff_id)?;

  let mut starts = staff
    .pair_list
    .iter()
    .filter_map(|window| {
      let parsed =
        parse_day(&window.start_date);
      if parsed.is_none() {
        debug!(
          partner = %window.partner_id,
          start = %window.start_date,
          "skipping pairing window with unreadable start"
        );
      }
      parsed
    })
    .collect::<Vec<_>>();

  starts.sort();
  starts.first().copied()
}

fn earliest_shift_start(
  schedule: &Schedule,
  staff_id: Option<&str>
) -> Option<DateTime<Utc>> {
  let mut starts = schedule
    .assignments_for(staff_id)
    .filter_map(|assignment| {
      let parsed = parse_timestamp(
        &assignment.shift_start
      );
      if parsed.is_none() {
        debug!(
          assignment = %assignment.id,
          start = %assignment.shift_start,
          "skipping assignment with unreadable start"
        );
      }
      parsed
    })
    .collect::<Vec<_>>();

  starts.sort();
  starts.first().copied()
}
