use std::collections::BTreeSet;

use chrono::{
  DateTime,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::config::{
  Labels,
  RotaConfig
};
use crate::datetime::{
  CLOCK_FORMAT,
  first_day_of_month,
  is_within_schedule_range,
  last_day_of_month,
  month_grid,
  shift_months
};
use crate::events::{
  DisplayEvent,
  project_events
};
use crate::initial_date::resolve_initial_date;
use crate::model::Schedule;
use crate::pairing::{
  PairHighlight,
  active_pair_window,
  generate_pair_highlights,
  highlight_on
};

const DISABLED_CLASS: &str =
  "date-range-disabled";
const OFF_DAY_CLASS: &str =
  "highlighted-date-orange";
const PAIR_CLASS: &str =
  "highlightedPair";

/// Everything a calendar cell needs to
/// render one day.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct DayAnnotation {
  pub date:           NaiveDate,
  pub in_valid_range: bool,
  pub is_off_day:     bool,
  pub pair_color:     Option<String>,
  pub tooltip_text:   String
}

impl DayAnnotation {
  pub fn class_names(&self) -> String {
    let mut classes = Vec::new();
    if !self.in_valid_range {
      classes.push(DISABLED_CLASS);
    }
    if self.is_off_day {
      classes.push(OFF_DAY_CLASS);
    }
    if let Some(color) =
      self.pair_color.as_deref()
    {
      classes.push(PAIR_CLASS);
      classes.push(color);
    }
    classes.join(" ")
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct NavigationBounds {
  pub prev_enabled: bool,
  pub next_enabled: bool
}

/// Off days of the selected staff that
/// fall inside the schedule window.
pub fn collect_off_days(
  schedule: &Schedule,
  selected_staff_id: Option<&str>
) -> BTreeSet<NaiveDate> {
  let Some(staff) = selected_staff_id
    .and_then(|id| schedule.staff(id))
  else {
    return BTreeSet::new();
  };

  staff
    .off_day_set()
    .into_iter()
    .filter(|day| {
      is_within_schedule_range(
        *day, schedule
      )
    })
    .collect()
}

/// Builds the annotation for one day.
///
/// Tooltip lines accumulate: a pair
/// line when the day is highlighted,
/// then the shift and time of the
/// first event on the day. A
/// highlighted day whose
/// covering window or partner cannot be
/// found again still gets the generic
/// pair line.
#[allow(clippy::too_many_arguments)]
pub fn annotate_day(
  date: NaiveDate,
  schedule: &Schedule,
  selected_staff_id: Option<&str>,
  highlighted_off_days: &BTreeSet<
    NaiveDate
  >,
  pair_highlights: &[PairHighlight],
  events: &[DisplayEvent],
  labels: &Labels,
  tz: Tz
) -> DayAnnotation {
  let highlight =
    highlight_on(pair_highlights, date);
  let mut lines = Vec::new();

  if highlight.is_some() {
    lines.push(pair_line(
      date,
      schedule,
      selected_staff_id,
      labels
    ));
  }

  if let Some(event) = events
    .iter()
    .find(|event| event.falls_on(date))
  {
    lines.push(format!(
      "{}: {}",
      labels.shift, event.title
    ));
    lines.push(format!(
      "{}: {} - {}",
      labels.time,
      event_clock(event.start, labels, tz),
      event_clock(event.end, labels, tz)
    ));
  }

  let tooltip_text = if lines.is_empty()
  {
    labels.no_events.clone()
  } else {
    lines.join("\n")
  };

  DayAnnotation {
    date,
    in_valid_range:
      is_within_schedule_range(
        date, schedule
      ),
    is_off_day: highlighted_off_days
      .contains(&date),
    pair_color: highlight
      .map(|h| h.color.clone()),
    tooltip_text
  }
}

fn pair_line(
  date: NaiveDate,
  schedule: &Schedule,
  selected_staff_id: Option<&str>,
  labels: &Labels
) -> String {
  let partner = selected_staff_id
    .and_then(|id| schedule.staff(id))
    .and_then(|staff| {
      active_pair_window(staff, date)
    })
    .and_then(|window| {
      schedule.staff_name(
        &window.partner_id
      )
    });

  match partner {
    | Some(name) => {
      format!(
        "{}: {name}",
        labels.pair_day
      )
    }
    | None => {
      debug!(
        %date,
        "highlighted day without resolvable partner"
      );
      labels.pair_day_unknown.clone()
    }
  }
}

fn event_clock(
  ts: Option<DateTime<Utc>>,
  labels: &Labels,
  tz: Tz
) -> String {
  ts.map(|ts| {
    ts.with_timezone(&tz)
      .format(CLOCK_FORMAT)
      .to_string()
  })
  .unwrap_or_else(|| {
    labels.not_available.clone()
  })
}

/// Whether the month before and after
/// `focus` still overlap the schedule
/// window.
pub fn navigation_bounds(
  focus: NaiveDate,
  schedule: &Schedule
) -> NavigationBounds {
  let Some((start, end)) =
    schedule.valid_window()
  else {
    return NavigationBounds {
      prev_enabled: false,
      next_enabled: false
    };
  };

  let month_start =
    first_day_of_month(focus);
  let month_end =
    last_day_of_month(focus);

  NavigationBounds {
    prev_enabled: start < month_start,
    next_enabled: end > month_end
  }
}

/// One render pass worth of derived
/// calendar data for a schedule and an
/// optional staff selection.
#[derive(Debug, Clone)]
pub struct CalendarProjection<'a> {
  schedule:        &'a Schedule,
  selected:        Option<&'a str>,
  labels:          &'a Labels,
  tz:              Tz,
  week_start:      Weekday,
  pub initial_date: NaiveDate,
  pub events:      Vec<DisplayEvent>,
  pub highlights:  Vec<PairHighlight>,
  pub off_days:    BTreeSet<NaiveDate>
}

impl<'a> CalendarProjection<'a> {
  #[tracing::instrument(skip(
    schedule, config, today
  ))]
  pub fn build(
    schedule: &'a Schedule,
    selected: Option<&'a str>,
    config: &'a RotaConfig,
    today: NaiveDate
  ) -> Self {
    let tz = config.timezone();
    let projection = Self {
      schedule,
      selected,
      labels: &config.labels,
      tz,
      week_start: config.week_start(),
      initial_date: resolve_initial_date(
        schedule, selected, today, tz
      ),
      events: project_events(
        schedule,
        selected,
        &config.palette,
        &config.labels,
        tz
      ),
      highlights:
        generate_pair_highlights(
          schedule,
          selected,
          &config.palette
        ),
      off_days: collect_off_days(
        schedule, selected
      )
    };

    debug!(
      initial = %projection.initial_date,
      events = projection.events.len(),
      highlights = projection.highlights.len(),
      off_days = projection.off_days.len(),
      "calendar projection built"
    );
    projection
  }

  pub fn annotate(
    &self,
    date: NaiveDate
  ) -> DayAnnotation {
    annotate_day(
      date,
      self.schedule,
      self.selected,
      &self.off_days,
      &self.highlights,
      &self.events,
      self.labels,
      self.tz
    )
  }

  /// The 42 cells of the month grid
  /// containing `focus`.
  pub fn month_view(
    &self,
    focus: NaiveDate
  ) -> Vec<DayAnnotation> {
    month_grid(focus, self.week_start)
      .into_iter()
      .map(|day| self.annotate(day))
      .collect()
  }

  pub fn navigation(
    &self,
    focus: NaiveDate
  ) -> NavigationBounds {
    navigation_bounds(focus, self.schedule)
  }

  pub fn previous_month(
    focus: NaiveDate
  ) -> NaiveDate {
    first_day_of_month(shift_months(
      focus, -1
    ))
  }

  pub fn next_month(
    focus: NaiveDate
  ) -> NaiveDate {
    first_day_of_month(shift_months(
      focus, 1
    ))
  }
}
