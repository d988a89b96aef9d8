use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::config::{
  Labels,
  RotaConfig,
  TagCatalog,
  TagStyle
};
use crate::datetime::{
  DayKeyFormat,
  parse_timestamp,
  to_display_date
};
use crate::events::clock_or;
use crate::model::{
  Assignment,
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
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
  pub staff_id:   String,
  pub staff_name: String,
  pub color:      String,
  pub cards:      Vec<BoardCard>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
  pub assignment_id: String,
  pub title:         String,
  pub time_label:    String,
  pub accent:        String,
  pub is_updated:    bool,
  pub tags:          Vec<TagStyle>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TagMenuEntry {
  pub tag:     TagStyle,
  pub checked: bool
}

/// Staff whose name contains `query`,
/// ignoring case. A blank query keeps
/// everyone.
pub fn filter_staffs<'a>(
  schedule: &'a Schedule,
  query: &str
) -> Vec<&'a Staff> {
  let needle =
    query.trim().to_lowercase();
  schedule
    .staffs
    .iter()
    .filter(|staff| {
      needle.is_empty()
        || staff
          .name
          .to_lowercase()
          .contains(&needle)
    })
    .collect()
}

/// One column per visible staff in
/// schedule order, each holding that
/// staff's assignments in input order.
#[tracing::instrument(skip(
  schedule, config
))]
pub fn build_board(
  schedule: &Schedule,
  config: &RotaConfig,
  query: Option<&str>
) -> Vec<BoardColumn> {
  let tz = config.timezone();
  let columns = filter_staffs(
    schedule,
    query.unwrap_or_default()
  )
  .into_iter()
  .map(|staff| {
    let color = config
      .staff_colors
      .color_for(&staff.id)
      .to_string();
    let cards = schedule
      .assignments_for(Some(
        staff.id.as_str()
      ))
      .map(|assignment| {
        build_card(
          assignment, &color, config, tz
        )
      })
      .collect();

    BoardColumn {
      staff_id: staff.id.clone(),
      staff_name: staff.name.clone(),
      color,
      cards
    }
  })
  .collect::<Vec<_>>();

  debug!(
    columns = columns.len(),
    "board built"
  );
  columns
}

fn build_card(
  assignment: &Assignment,
  column_color: &str,
  config: &RotaConfig,
  tz: Tz
) -> BoardCard {
  let accent = if assignment.is_updated
  {
    config.staff_colors.updated.clone()
  } else {
    column_color.to_string()
  };

  BoardCard {
    assignment_id: assignment.id.clone(),
    title: card_title(
      assignment,
      &config.labels
    ),
    time_label: time_label(
      assignment,
      &config.labels,
      tz
    ),
    accent,
    is_updated: assignment.is_updated,
    tags: assignment
      .tags
      .iter()
      .map(|tag| {
        config.tags.style_or_plain(tag)
      })
      .collect()
  }
}

fn card_title(
  assignment: &Assignment,
  labels: &Labels
) -> String {
  assignment
    .title
    .as_deref()
    .map(str::trim)
    .filter(|title| !title.is_empty())
    .map(ToString::to_string)
    .unwrap_or_else(|| {
      labels.card_title.clone()
    })
}

/// `DD.MM.YYYY HH:MM - HH:MM` in the
/// display timezone.
pub fn time_label(
  assignment: &Assignment,
  labels: &Labels,
  tz: Tz
) -> String {
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

  format!(
    "{date} {} - {}",
    clock_or(
      &assignment.shift_start,
      labels,
      tz
    ),
    clock_or(
      &assignment.shift_end,
      labels,
      tz
    )
  )
}

/// Every catalog tag, in catalog
/// order, with whether the assignment
/// carries it.
pub fn tag_menu_entries(
  catalog: &TagCatalog,
  assignment: &Assignment
) -> Vec<TagMenuEntry> {
  catalog
    .iter()
    .map(|tag| TagMenuEntry {
      tag:     tag.clone(),
      checked: assignment.has_tag(&tag.id)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn staff(
    id: &str,
    name: &str
  ) -> Staff {
    Staff {
      id:        id.to_string(),
      name:      name.to_string(),
      pair_list: vec![],
      off_days:  vec![]
    }
  }

  fn sample() -> Schedule {
    Schedule {
      staffs: vec![
        staff("staff-1", "Ada Lovelace"),
        staff("staff-9", "Grace Hopper"),
        staff("staff-3", "Alan Turing"),
      ],
      assignments: vec![
        Assignment {
          id: "a1".to_string(),
          staff_id: "staff-9".to_string(),
          shift_start: "2024-01-10T06:00:00Z"
            .to_string(),
          shift_end: "2024-01-10T14:00:00Z"
            .to_string(),
          tags: vec![
            "evening".to_string(),
            "custom".to_string(),
          ],
          ..Assignment::default()
        },
        Assignment {
          id: "a2".to_string(),
          staff_id: "staff-1".to_string(),
          title: Some("Inventory".to_string()),
          shift_start: "2024-01-11T08:15:00Z"
            .to_string(),
          shift_end: "nope".to_string(),
          is_updated: true,
          ..Assignment::default()
        },
        Assignment {
          id: "a3".to_string(),
          staff_id: "staff-9".to_string(),
          ..Assignment::default()
        },
      ],
      ..Schedule::default()
    }
  }

  #[test]
  fn columns_follow_staff_order() {
    let config = RotaConfig::embedded();
    let board =
      build_board(&sample(), &config, None);

    let ids = board
      .iter()
      .map(|c| c.staff_id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(ids, vec![
      "staff-1", "staff-9", "staff-3"
    ]);
    assert_eq!(board[1].color, "#19979c");
    assert_eq!(
      board[1]
        .cards
        .iter()
        .map(|c| c.assignment_id.as_str())
        .collect::<Vec<_>>(),
      vec!["a1", "a3"]
    );
    assert!(board[2].cards.is_empty());
  }

  #[test]
  fn cards_carry_labels_and_accent() {
    let config = RotaConfig::embedded();
    let board =
      build_board(&sample(), &config, None);

    let plain = &board[1].cards[0];
    assert_eq!(plain.title, "Shift");
    assert_eq!(
      plain.time_label,
      "10.01.2024 06:00 - 14:00"
    );
    assert_eq!(plain.accent, "#19979c");
    assert_eq!(plain.tags[0].id, "evening");
    assert_eq!(plain.tags[1].text, "custom");
    assert_eq!(plain.tags[1].bg, "#f5f7fa");

    let updated = &board[0].cards[0];
    assert_eq!(updated.title, "Inventory");
    assert_eq!(updated.accent, "#ff8847");
    assert_eq!(
      updated.time_label,
      "11.01.2024 08:15 - N/A"
    );
  }

  #[test]
  fn search_is_case_insensitive() {
    let schedule = sample();
    let names = |q: &str| {
      filter_staffs(&schedule, q)
        .iter()
        .map(|s| s.id.clone())
        .collect::<Vec<_>>()
    };
    assert_eq!(names("AL"), vec!["staff-3"]);
    assert_eq!(names("LOVE"), vec!["staff-1"]);
    assert_eq!(names("a"), vec![
      "staff-1", "staff-9", "staff-3"
    ]);
    assert_eq!(names("  "), vec![
      "staff-1", "staff-9", "staff-3"
    ]);
    assert!(names("zzz").is_empty());

    let board = build_board(
      &schedule,
      &RotaConfig::embedded(),
      Some("hopper")
    );
    assert_eq!(board.len(), 1);
  }

  #[test]
  fn tag_menu_lists_whole_catalog() {
    let config = RotaConfig::embedded();
    let schedule = sample();
    let entries = tag_menu_entries(
      &config.tags,
      &schedule.assignments[0]
    );
    assert_eq!(entries.len(), config.tags.len());
    let checked = entries
      .iter()
      .filter(|e| e.checked)
      .map(|e| e.tag.id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(checked, vec!["evening"]);
  }
}
