use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::datetime::{parse_day, parse_timestamp};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rota",
    version,
    about = "Rota: staff schedule calendar and board projections",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; overrides ROTA_CONFIG and the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Schedule JSON document, `-` for stdin.
    #[arg(long = "schedule", default_value = "-", global = true)]
    pub schedule: String,

    /// Print machine-readable JSON instead of tables.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Month grid with off days, pair highlights and events.
    Calendar {
        #[arg(long = "staff")]
        staff: Option<String>,
        #[arg(long = "month", value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Annotation of a single day.
    Day {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
        #[arg(long = "staff")]
        staff: Option<String>,
    },
    /// Display events in assignment order.
    Events {
        #[arg(long = "staff")]
        staff: Option<String>,
    },
    /// Pairing highlight days of one staff member.
    Highlights {
        #[arg(long = "staff")]
        staff: String,
    },
    /// Staff columns with assignment cards.
    Board {
        #[arg(long = "query")]
        query: Option<String>,
    },
    /// Move an assignment to another staff member.
    Reassign { assignment: String, staff: String },
    /// Move an assignment to a new start and end.
    Reschedule {
        assignment: String,
        #[arg(value_parser = parse_instant)]
        start: chrono::DateTime<chrono::Utc>,
        #[arg(value_parser = parse_instant)]
        end: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Add or remove a tag on an assignment.
    Tag { assignment: String, tag: String },
    /// Detail panel for one assignment.
    Details { assignment: String },
    /// Create an assignment from form fields.
    Add(AddArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long = "title")]
    pub title: String,
    #[arg(long = "staff")]
    pub staff: String,
    #[arg(long = "shift", default_value = "")]
    pub shift: String,
    /// Day of the shift, `YYYY-MM-DD` or `DD.MM.YYYY`.
    #[arg(long = "date")]
    pub date: String,
    #[arg(long = "start")]
    pub start: String,
    #[arg(long = "end")]
    pub end: String,
    #[arg(long = "location", default_value = "")]
    pub location: String,
    #[arg(long = "description", default_value = "")]
    pub description: String,
    #[arg(long = "recurrence")]
    pub recurrence: Option<String>,
    #[arg(long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calendar { .. } => "calendar",
            Self::Day { .. } => "day",
            Self::Events { .. } => "events",
            Self::Highlights { .. } => "highlights",
            Self::Board { .. } => "board",
            Self::Reassign { .. } => "reassign",
            Self::Reschedule { .. } => "reschedule",
            Self::Tag { .. } => "tag",
            Self::Details { .. } => "details",
            Self::Add(_) => "add",
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 || verbose == 0 {
        "warn"
    } else if verbose == 1 {
        "info"
    } else if verbose == 2 {
        "debug"
    } else {
        "trace"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// `YYYY-MM`, resolved to the first of that month.
pub fn parse_month(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM, got: {raw}"))
}

fn parse_date_arg(raw: &str) -> anyhow::Result<NaiveDate> {
    parse_day(raw).ok_or_else(|| anyhow!("unrecognized date: {raw}"))
}

fn parse_instant(raw: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(raw).ok_or_else(|| anyhow!("unrecognized timestamp: {raw}"))
}
