use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use tracing::debug;

use crate::config::RotaConfig;
use crate::events::{
  EventDetails,
  event_details
};
use crate::initial_date::resolve_initial_date;
use crate::model::{
  Assignment,
  Schedule
};
use crate::mutation::{
  AssignmentPatch,
  reassign_staff,
  reschedule_assignment,
  toggle_tag
};

#[derive(
  Debug, Clone, Copy, PartialEq,
)]
pub struct TagMenuAnchor<'a> {
  pub assignment_id: &'a str,
  pub x:             f64,
  pub y:             f64
}

#[derive(Debug, Clone, PartialEq)]
struct TagMenu {
  assignment_id: String,
  x:             f64,
  y:             f64
}

/// Ephemeral view state. Domain data
/// lives in the schedule; this only
/// tracks what the user is doing with
/// it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
  selected_staff_id: Option<String>,
  dragged:           Option<Assignment>,
  tag_menu:          Option<TagMenu>,
  details:           Option<String>,
  pending_focus:     Option<NaiveDate>
}

impl ViewState {
  pub fn selected_staff_id(
    &self
  ) -> Option<&str> {
    self.selected_staff_id.as_deref()
  }

  /// Changes the selection and queues a
  /// calendar jump for the next frame.
  /// The jump is only observable through
  /// [`ViewState::take_frame_focus`].
  pub fn select_staff(
    &mut self,
    schedule: &Schedule,
    staff_id: Option<&str>,
    config: &RotaConfig,
    today: NaiveDate
  ) {
    self.selected_staff_id =
      staff_id.map(ToString::to_string);
    let focus = resolve_initial_date(
      schedule,
      staff_id,
      today,
      config.timezone()
    );
    debug!(
      staff = ?staff_id,
      %focus,
      "selection changed; focus queued"
    );
    self.pending_focus = Some(focus);
  }

  pub fn take_frame_focus(
    &mut self
  ) -> Option<NaiveDate> {
    self.pending_focus.take()
  }

  pub fn begin_drag(
    &mut self,
    assignment: &Assignment
  ) {
    debug!(assignment = %assignment.id, "drag started");
    self.dragged = Some(assignment.clone());
  }

  pub fn dragged(
    &self
  ) -> Option<&Assignment> {
    self.dragged.as_ref()
  }

  pub fn cancel_drag(&mut self) {
    self.dragged = None;
  }

  /// Ends the drag over a staff column.
  /// The drag is cleared whether or not
  /// the drop changes anything.
  pub fn drop_on_column(
    &mut self,
    staff_id: &str
  ) -> Option<AssignmentPatch> {
    let dragged = self.dragged.take()?;
    reassign_staff(&dragged, staff_id)
  }

  pub fn drop_on_calendar(
    &mut self,
    schedule: &Schedule,
    assignment_id: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>
  ) -> Option<AssignmentPatch> {
    self.dragged = None;
    let Some(assignment) =
      schedule.assignment(assignment_id)
    else {
      debug!(
        assignment = assignment_id,
        "drop for unknown assignment"
      );
      return None;
    };
    Some(reschedule_assignment(
      assignment, start, end
    ))
  }

  pub fn open_tag_menu(
    &mut self,
    assignment_id: &str,
    x: f64,
    y: f64
  ) {
    self.tag_menu = Some(TagMenu {
      assignment_id: assignment_id
        .to_string(),
      x,
      y
    });
  }

  pub fn tag_menu(
    &self
  ) -> Option<TagMenuAnchor<'_>> {
    self.tag_menu.as_ref().map(|menu| {
      TagMenuAnchor {
        assignment_id: &menu
          .assignment_id,
        x: menu.x,
        y: menu.y
      }
    })
  }

  /// Toggles `tag` on the menu's
  /// assignment and closes the menu.
  pub fn choose_tag(
    &mut self,
    schedule: &Schedule,
    tag: &str
  ) -> Option<AssignmentPatch> {
    let menu = self.tag_menu.take()?;
    schedule
      .assignment(&menu.assignment_id)
      .map(|assignment| {
        toggle_tag(assignment, tag)
      })
  }

  pub fn close_tag_menu(&mut self) {
    self.tag_menu = None;
  }

  pub fn open_details(
    &mut self,
    assignment_id: &str
  ) {
    self.details =
      Some(assignment_id.to_string());
  }

  pub fn close_details(&mut self) {
    self.details = None;
  }

  /// Resolved details for the open
  /// panel, if any.
  pub fn details(
    &self,
    schedule: &Schedule,
    config: &RotaConfig
  ) -> Option<EventDetails> {
    let id = self.details.as_deref()?;
    event_details(
      schedule,
      id,
      &config.labels,
      config.timezone()
    )
  }
}
