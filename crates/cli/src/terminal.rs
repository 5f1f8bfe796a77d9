use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use heartwatch_core::ScheduleRecord;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const WARNING: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Print one block per record, the way `show` lists events.
pub fn print_records(records: &[ScheduleRecord]) -> Result<()> {
    let mut stdout = io::stdout();
    for record in records {
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print(format!("{}\n---\n", record.name)),
            ResetColor,
        )?;
        if !record.enabled {
            execute!(
                stdout,
                SetForegroundColor(Colors::WARNING),
                Print("***DISABLED***\n"),
                ResetColor
            )?;
        }
        if record.error_count > 0 {
            execute!(
                stdout,
                SetForegroundColor(Colors::ERROR),
                Print(format!("***ERRORS ({})***\n", record.error_count)),
                ResetColor
            )?;
        }
        for line in detail_lines(record) {
            execute!(stdout, Print(line), Print("\n"))?;
        }
    }
    execute!(stdout, Print("\n"))?;
    stdout.flush()?;
    Ok(())
}

pub fn print_info(message: &str) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        SetForegroundColor(Colors::DIM),
        Print(message),
        Print("\n"),
        ResetColor
    )?;
    stdout.flush()?;
    Ok(())
}

/// Description, schedule and timing lines for one record.
fn detail_lines(record: &ScheduleRecord) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(description) = &record.description {
        lines.push(format!("Desc: {description}"));
    }
    match record.period_type {
        Some(period_type) => lines.push(format!("Type: {period_type}")),
        None => lines.push("Type: (not set)".to_string()),
    }
    match record.period_seconds {
        Some(seconds) => lines.push(format!("Period: {} ({seconds}s)", format_period(seconds))),
        None => lines.push("Period: (not set)".to_string()),
    }
    if let Some(due) = record.next_block_time {
        lines.push(format!("Due: {}", format_time(due)));
    }
    if let Some(last) = record.last_success_time {
        lines.push(format!("Last Ran: {}", format_time(last)));
    }
    lines
}

/// `1 day, 2:03:04` style duration.
fn format_period(seconds: u64) -> String {
    let days = seconds / 86_400;
    let rem = seconds % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

fn format_time(epoch: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%a %b %e %H:%M:%S %Y").to_string(),
        None => format!("{epoch} (out of range)"),
    }
}
