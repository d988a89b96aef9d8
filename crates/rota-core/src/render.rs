use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::annotate::{DayAnnotation, NavigationBounds};
use crate::board::BoardColumn;
use crate::config::RotaConfig;
use crate::datetime::{CLOCK_FORMAT, ISO_DAY_FORMAT};
use crate::events::{DisplayEvent, EventDetails};
use crate::pairing::PairHighlight;

const DIM: &str = "2";
const RED: &str = "31";
const YELLOW: &str = "33";
const BLUE: &str = "34";
const CYAN: &str = "36";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
    week_start: Weekday,
}

impl Renderer {
    pub fn new(cfg: &RotaConfig) -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self {
            color,
            tz: cfg.timezone(),
            week_start: cfg.week_start(),
        }
    }

    pub fn plain(cfg: &RotaConfig) -> Self {
        Self {
            color: false,
            ..Self::new(cfg)
        }
    }

    pub fn write_json<W: Write, T: Serialize + ?Sized>(
        &self,
        mut out: W,
        value: &T,
    ) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    /// Six-week grid. Markers: `o` off day, `+` pair day, `(n)` event
    /// count. Days outside the schedule window are dimmed.
    #[tracing::instrument(skip(self, out, cells, events, nav))]
    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        focus: NaiveDate,
        cells: &[DayAnnotation],
        events: &[DisplayEvent],
        nav: NavigationBounds,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} {} {}",
            if nav.prev_enabled { "<" } else { " " },
            focus.format("%B %Y"),
            if nav.next_enabled { ">" } else { " " }
        )?;

        let mut weekday = self.week_start;
        let mut headers = Vec::with_capacity(7);
        for _ in 0..7 {
            headers.push(weekday.to_string());
            weekday = weekday.succ();
        }

        let rows = cells
            .chunks(7)
            .map(|week| {
                week.iter()
                    .map(|cell| self.month_cell(cell, focus, events))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        write_table(&mut out, headers, rows)
    }

    fn month_cell(&self, cell: &DayAnnotation, focus: NaiveDate, events: &[DisplayEvent]) -> String {
        let mut text = format!("{:>2}", cell.date.day());
        if cell.is_off_day {
            text.push('o');
        }
        if cell.pair_color.is_some() {
            text.push('+');
        }
        let count = events.iter().filter(|e| e.falls_on(cell.date)).count();
        if count > 0 {
            text.push_str(&format!("({count})"));
        }

        if !cell.in_valid_range || cell.date.month() != focus.month() {
            self.paint(&text, DIM)
        } else if cell.is_off_day {
            self.paint(&text, YELLOW)
        } else if cell.pair_color.is_some() {
            self.paint(&text, CYAN)
        } else {
            text
        }
    }

    pub fn write_day<W: Write>(&self, mut out: W, cell: &DayAnnotation) -> anyhow::Result<()> {
        writeln!(out, "date      {}", cell.date.format(ISO_DAY_FORMAT))?;
        writeln!(out, "in range  {}", cell.in_valid_range)?;
        writeln!(out, "off day   {}", cell.is_off_day)?;
        writeln!(
            out,
            "pair      {}",
            cell.pair_color.as_deref().unwrap_or("-")
        )?;
        writeln!(out, "classes   {}", cell.class_names())?;
        writeln!(out)?;
        for line in cell.tooltip_text.lines() {
            writeln!(out, "  {line}")?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, events))]
    pub fn write_events<W: Write>(&self, mut out: W, events: &[DisplayEvent]) -> anyhow::Result<()> {
        let headers = ["ID", "Date", "Staff", "Title", "Start", "End", "Class"]
            .map(ToString::to_string)
            .to_vec();

        let rows = events
            .iter()
            .map(|event| {
                let date = event
                    .date
                    .map(|d| d.format(ISO_DAY_FORMAT).to_string())
                    .unwrap_or_else(|| "-".to_string());
                let date = if event.in_valid_range {
                    date
                } else {
                    self.paint(&date, RED)
                };
                let id = if event.is_updated {
                    self.paint(&event.id, YELLOW)
                } else {
                    event.id.clone()
                };
                vec![
                    id,
                    date,
                    event.staff_id.clone(),
                    event.title.clone(),
                    self.clock(event.start),
                    self.clock(event.end),
                    event.class_names(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    pub fn write_highlights<W: Write>(
        &self,
        mut out: W,
        highlights: &[PairHighlight],
    ) -> anyhow::Result<()> {
        let headers = vec!["Date".to_string(), "Color".to_string()];
        let rows = highlights
            .iter()
            .map(|h| vec![h.date.format(ISO_DAY_FORMAT).to_string(), h.color.clone()])
            .collect();
        write_table(&mut out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, columns))]
    pub fn write_board<W: Write>(&self, mut out: W, columns: &[BoardColumn]) -> anyhow::Result<()> {
        for (idx, column) in columns.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            writeln!(
                out,
                "{} ({}) {}",
                self.paint(&column.staff_name, BLUE),
                column.staff_id,
                column.color
            )?;

            let headers = ["ID", "Title", "Time", "Tags"]
                .map(ToString::to_string)
                .to_vec();
            let rows = column
                .cards
                .iter()
                .map(|card| {
                    let marker = if card.is_updated { "*" } else { "" };
                    vec![
                        format!("{}{marker}", card.assignment_id),
                        card.title.clone(),
                        card.time_label.clone(),
                        card.tags
                            .iter()
                            .map(|tag| format!("+{}", tag.text))
                            .collect::<Vec<_>>()
                            .join(" "),
                    ]
                })
                .collect();
            write_table(&mut out, headers, rows)?;
        }
        Ok(())
    }

    pub fn write_details<W: Write>(&self, mut out: W, details: &EventDetails) -> anyhow::Result<()> {
        writeln!(out, "id        {}", details.id)?;
        writeln!(out, "staff     {}", details.staff_name)?;
        writeln!(out, "shift     {}", details.shift_name)?;
        writeln!(out, "date      {}", details.date)?;
        writeln!(out, "time      {} - {}", details.start_time, details.end_time)?;
        Ok(())
    }

    fn clock(&self, ts: Option<DateTime<Utc>>) -> String {
        ts.map(|ts| ts.with_timezone(&self.tz).format(CLOCK_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect::<Vec<_>>();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            escaped = ch != 'm';
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}
