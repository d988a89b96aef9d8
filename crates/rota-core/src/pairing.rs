use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::config::Palette;
use crate::datetime::enumerate_days;
use crate::model::{
  PairWindow,
  Schedule,
  Staff
};

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct PairHighlight {
  pub date:  NaiveDate,
  pub color: String
}

/// One highlight per day covered by a
/// pairing window of the selected
/// staff, ordered by date.
///
/// The color depends only on where the
/// partner sits in `schedule.staffs`,
/// so it is stable across renders. When
/// windows overlap, the later window in
/// the list wins the day.
#[tracing::instrument(skip(
  schedule, palette
))]
pub fn generate_pair_highlights(
  schedule: &Schedule,
  selected_staff_id: Option<&str>,
  palette: &Palette
) -> Vec<PairHighlight> {
  let Some(staff) = selected_staff_id
    .and_then(|id| schedule.staff(id))
  else {
    return Vec::new();
  };

  let mut by_date =
    BTreeMap::<NaiveDate, String>::new();

  for window in &staff.pair_list {
    let Some((start, end)) =
      window.range()
    else {
      debug!(
        staff = %staff.id,
        partner = %window.partner_id,
        "skipping incomplete pairing window"
      );
      continue;
    };

    let color = palette.color_for(
      schedule
        .staff_index(&window.partner_id)
    );
    for day in enumerate_days(start, end) {
      by_date.insert(day, color.clone());
    }
  }

  debug!(
    staff = %staff.id,
    days = by_date.len(),
    "pair highlights generated"
  );

  by_date
    .into_iter()
    .map(|(date, color)| PairHighlight {
      date,
      color
    })
    .collect()
}

/// First window, in list order, whose
/// dates cover `date`, even when its
/// partner is blank.
pub fn active_pair_window(
  staff: &Staff,
  date: NaiveDate
) -> Option<&PairWindow> {
  staff
    .pair_list
    .iter()
    .find(|window| window.contains(date))
}

pub fn highlight_on(
  highlights: &[PairHighlight],
  date: NaiveDate
) -> Option<&PairHighlight> {
  highlights
    .iter()
    .find(|h| h.date == date)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn window(
    partner: &str,
    start: &str,
    end: &str
  ) -> PairWindow {
    PairWindow {
      partner_id: partner.to_string(),
      start_date: start.to_string(),
      end_date:   end.to_string()
    }
  }

  fn person(
    id: &str,
    pairs: Vec<PairWindow>
  ) -> Staff {
    Staff {
      id:        id.to_string(),
      name:      format!("name-{id}"),
      pair_list: pairs,
      off_days:  vec![]
    }
  }

  fn schedule(
    pairs: Vec<PairWindow>
  ) -> Schedule {
    Schedule {
      schedule_start_date: "2024-01-01"
        .to_string(),
      schedule_end_date: "2024-01-31"
        .to_string(),
      staffs: vec![
        person("S1", pairs),
        person("S2", vec![]),
        person("S3", vec![]),
      ],
      ..Schedule::default()
    }
  }

  #[test]
  fn single_window_covers_exactly_its_days(
  ) {
    let palette = Palette::default();
    let schedule = schedule(vec![window(
      "S2",
      "05.01.2024",
      "07.01.2024"
    )]);

    let highlights =
      generate_pair_highlights(
        &schedule,
        Some("S1"),
        &palette
      );

    let dates = highlights
      .iter()
      .map(|h| h.date)
      .collect::<Vec<_>>();
    assert_eq!(dates, vec![
      day(2024, 1, 5),
      day(2024, 1, 6),
      day(2024, 1, 7)
    ]);
    assert!(
      highlights
        .iter()
        .all(|h| h.color == palette.color_at(1))
    );
  }

  #[test]
  fn nothing_without_selection() {
    let schedule = schedule(vec![window(
      "S2",
      "05.01.2024",
      "07.01.2024"
    )]);
    assert!(
      generate_pair_highlights(
        &schedule,
        None,
        &Palette::default()
      )
      .is_empty()
    );
    assert!(
      generate_pair_highlights(
        &schedule,
        Some("nobody"),
        &Palette::default()
      )
      .is_empty()
    );
  }

  #[test]
  fn incomplete_windows_are_skipped() {
    let schedule = schedule(vec![
      window("", "05.01.2024", "06.01.2024"),
      window("S2", "", "06.01.2024"),
      window("S2", "10.01.2024", "bad"),
      window("S3", "12.01.2024", "11.01.2024"),
    ]);
    assert!(
      generate_pair_highlights(
        &schedule,
        Some("S1"),
        &Palette::default()
      )
      .is_empty()
    );
  }

  #[test]
  fn later_window_wins_overlapping_days() {
    let palette = Palette::default();
    let schedule = schedule(vec![
      window("S2", "05.01.2024", "08.01.2024"),
      window("S3", "2024-01-07", "2024-01-09"),
    ]);

    let highlights =
      generate_pair_highlights(
        &schedule,
        Some("S1"),
        &palette
      );
    assert_eq!(highlights.len(), 5);

    let on = |d| {
      highlight_on(&highlights, d)
        .map(|h| h.color.clone())
    };
    assert_eq!(
      on(day(2024, 1, 6)),
      Some(palette.color_at(1))
    );
    assert_eq!(
      on(day(2024, 1, 7)),
      Some(palette.color_at(2))
    );
    assert_eq!(on(day(2024, 1, 10)), None);
  }

  #[test]
  fn unknown_partner_uses_fallback_color() {
    let palette = Palette::default();
    let schedule = schedule(vec![window(
      "ghost",
      "05.01.2024",
      "05.01.2024"
    )]);
    let highlights =
      generate_pair_highlights(
        &schedule,
        Some("S1"),
        &palette
      );
    assert_eq!(
      highlights[0].color,
      palette.fallback
    );
  }

  #[test]
  fn active_window_is_first_match() {
    let staff = person("S1", vec![
      window("S2", "05.01.2024", "08.01.2024"),
      window("S3", "07.01.2024", "09.01.2024"),
    ]);
    assert_eq!(
      active_pair_window(&staff, day(2024, 1, 7))
        .map(|w| w.partner_id.as_str()),
      Some("S2")
    );
    assert_eq!(
      active_pair_window(&staff, day(2024, 1, 9))
        .map(|w| w.partner_id.as_str()),
      Some("S3")
    );
    assert!(
      active_pair_window(&staff, day(2024, 1, 10))
        .is_none()
    );
  }

  #[test]
  fn blank_partner_window_still_matches_first(
  ) {
    let staff = person("S1", vec![
      window("", "05.01.2024", "07.01.2024"),
      window("S2", "06.01.2024", "08.01.2024"),
    ]);
    assert_eq!(
      active_pair_window(&staff, day(2024, 1, 6))
        .map(|w| w.partner_id.as_str()),
      Some("")
    );
    assert_eq!(
      active_pair_window(&staff, day(2024, 1, 8))
        .map(|w| w.partner_id.as_str()),
      Some("S2")
    );
  }
}
