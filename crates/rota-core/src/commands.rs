use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, anyhow};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::annotate::{CalendarProjection, DayAnnotation, NavigationBounds};
use crate::board::build_board;
use crate::cli::{AddArgs, Command};
use crate::config::RotaConfig;
use crate::draft::AssignmentDraft;
use crate::events::event_details;
use crate::model::{Assignment, Schedule};
use crate::mutation::{AssignmentPatch, reassign_staff, reschedule_assignment, toggle_tag};
use crate::pairing::generate_pair_highlights;
use crate::render::Renderer;
use crate::store::ScheduleStore;

const STDIN_SOURCE: &str = "-";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthOutput<'a> {
    focus: NaiveDate,
    navigation: NavigationBounds,
    cells: &'a [DayAnnotation],
}

#[derive(Debug, Serialize)]
struct MutationOutput<'a> {
    patch: Option<&'a AssignmentPatch>,
    schedule: &'a Schedule,
}

#[derive(Debug, Serialize)]
struct AddOutput<'a> {
    assignment: &'a Assignment,
    schedule: &'a Schedule,
}

/// Reads the schedule document from a file, or stdin for `-`.
#[instrument]
pub fn load_schedule(source: &str) -> anyhow::Result<Schedule> {
    let raw = if source == STDIN_SOURCE {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed reading schedule from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };

    if raw.trim().is_empty() {
        return Err(anyhow!("schedule input is empty"));
    }

    let schedule = Schedule::from_json(&raw).with_context(|| format!("failed to load schedule from {source}"))?;
    info!(
        staffs = schedule.staffs.len(),
        shifts = schedule.shifts.len(),
        assignments = schedule.assignments.len(),
        "schedule loaded"
    );
    Ok(schedule)
}

#[instrument(skip(store, cfg, renderer, out, command), fields(command = command.name()))]
pub fn dispatch<W: Write>(
    store: &mut ScheduleStore,
    cfg: &RotaConfig,
    renderer: &Renderer,
    json: bool,
    mut out: W,
    command: Command,
) -> anyhow::Result<()> {
    let today = Utc::now().with_timezone(&cfg.timezone()).date_naive();
    debug!(%today, json, "dispatching command");

    match command {
        Command::Calendar { staff, month } => {
            let schedule = store.schedule();
            let projection = CalendarProjection::build(schedule, staff.as_deref(), cfg, today);
            let focus = month.unwrap_or(projection.initial_date);
            let cells = projection.month_view(focus);
            let navigation = projection.navigation(focus);
            if json {
                renderer.write_json(
                    &mut out,
                    &MonthOutput {
                        focus,
                        navigation,
                        cells: &cells,
                    },
                )
            } else {
                renderer.write_month(&mut out, focus, &cells, &projection.events, navigation)
            }
        }
        Command::Day { date, staff } => {
            let projection = CalendarProjection::build(store.schedule(), staff.as_deref(), cfg, today);
            let cell = projection.annotate(date);
            if json {
                renderer.write_json(&mut out, &cell)
            } else {
                renderer.write_day(&mut out, &cell)
            }
        }
        Command::Events { staff } => {
            let projection = CalendarProjection::build(store.schedule(), staff.as_deref(), cfg, today);
            if json {
                renderer.write_json(&mut out, &projection.events)
            } else {
                renderer.write_events(&mut out, &projection.events)
            }
        }
        Command::Highlights { staff } => {
            let highlights = generate_pair_highlights(store.schedule(), Some(staff.as_str()), &cfg.palette);
            if json {
                renderer.write_json(&mut out, &highlights)
            } else {
                renderer.write_highlights(&mut out, &highlights)
            }
        }
        Command::Board { query } => {
            let columns = build_board(store.schedule(), cfg, query.as_deref());
            if json {
                renderer.write_json(&mut out, &columns)
            } else {
                renderer.write_board(&mut out, &columns)
            }
        }
        Command::Reassign { assignment, staff } => {
            let target = find_assignment(store, &assignment)?;
            let patch = reassign_staff(&target, &staff);
            commit_patch(store, renderer, &mut out, patch)
        }
        Command::Reschedule {
            assignment,
            start,
            end,
        } => {
            let target = find_assignment(store, &assignment)?;
            let patch = reschedule_assignment(&target, start, end);
            commit_patch(store, renderer, &mut out, Some(patch))
        }
        Command::Tag { assignment, tag } => {
            let target = find_assignment(store, &assignment)?;
            let patch = toggle_tag(&target, &tag);
            commit_patch(store, renderer, &mut out, Some(patch))
        }
        Command::Details { assignment } => {
            let details = event_details(store.schedule(), &assignment, &cfg.labels, cfg.timezone())
                .ok_or_else(|| anyhow!("assignment not found: {assignment}"))?;
            if json {
                renderer.write_json(&mut out, &details)
            } else {
                renderer.write_details(&mut out, &details)
            }
        }
        Command::Add(args) => cmd_add(store, renderer, &mut out, args),
    }
}

fn find_assignment(store: &ScheduleStore, id: &str) -> anyhow::Result<Assignment> {
    store
        .schedule()
        .assignment(id)
        .cloned()
        .ok_or_else(|| anyhow!("assignment not found: {id}"))
}

fn commit_patch<W: Write>(
    store: &mut ScheduleStore,
    renderer: &Renderer,
    out: W,
    patch: Option<AssignmentPatch>,
) -> anyhow::Result<()> {
    match patch.as_ref() {
        Some(patch) => {
            store.apply(patch);
            info!(assignment = %patch.id, "patch applied");
        }
        None => info!("no change"),
    }

    renderer.write_json(
        out,
        &MutationOutput {
            patch: patch.as_ref(),
            schedule: store.schedule(),
        },
    )
}

fn cmd_add<W: Write>(
    store: &mut ScheduleStore,
    renderer: &Renderer,
    out: W,
    args: AddArgs,
) -> anyhow::Result<()> {
    let draft = AssignmentDraft {
        title: args.title,
        staff_id: args.staff,
        shift_id: args.shift,
        date: args.date,
        start_time: args.start,
        end_time: args.end,
        location: args.location,
        description: args.description,
        is_recurring: args.recurrence.is_some(),
        recurrence_rule: args.recurrence.unwrap_or_default(),
        tags: args.tags,
    };

    let assignment = draft.into_assignment(store.schedule(), Uuid::new_v4().to_string())?;
    store.add_assignment(assignment.clone());

    renderer.write_json(
        out,
        &AddOutput {
            assignment: &assignment,
            schedule: store.schedule(),
        },
    )
}
