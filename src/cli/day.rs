use std::{fmt::Display, path::PathBuf};

use ansi_term::Colour;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::engine::breakdown::{
    build_day_breakdown, format_hours_minutes, DayBreakdown, SegmentRole,
    DEFAULT_MIN_SEGMENT_SECONDS,
};

use super::{build_service, open_color_store, Args};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct DayCommand {
    #[arg(
        long,
        short,
        help = "Day to display. Examples are \"today\", \"yesterday\", \"15/03/2025\""
    )]
    day: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        short = 'm',
        long = "min-seconds",
        default_value_t = DEFAULT_MIN_SEGMENT_SECONDS,
        help = "Drop process slices with at most this many seconds"
    )]
    min_segment_seconds: f64,
    #[arg(short, long, help = "Path to the tracker's export tool")]
    exporter: Option<PathBuf>,
}

/// Command to print the nested tag → process breakdown for a single day,
/// with each legend line tinted in its segment color.
pub async fn process_day_command(
    DayCommand {
        day,
        date_style,
        min_segment_seconds,
        exporter,
    }: DayCommand,
) -> Result<()> {
    let day = parse_day(day, date_style)?;

    let service = build_service(exporter)?;
    let colors = open_color_store()?;

    let records = service.merged_records(false).await?;
    let breakdown = build_day_breakdown(&records, day, min_segment_seconds, &colors);

    print_breakdown(day, &breakdown);
    Ok(())
}

fn parse_day(day: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let Some(day) = day else {
        return Ok(Local::now().date_naive());
    };
    match parse_date_string(&day, Local::now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate day {e}"),
            )
            .into()),
    }
}

fn print_breakdown(day: NaiveDate, breakdown: &DayBreakdown) {
    println!("{}", day.format("%a %d-%m-%Y"));

    if breakdown.legend.is_empty() {
        println!("No activity recorded for this day");
        return;
    }

    for entry in &breakdown.legend {
        let swatch = Colour::RGB(entry.color.r, entry.color.g, entry.color.b).paint("■");
        let indent = if entry.indented { "    " } else { "" };
        println!("{indent}{swatch} {}\t{}", entry.duration, entry.name);
    }

    // Both remaining slices carry the same seconds, one line covers them.
    if let Some(remaining) = breakdown
        .segments
        .iter()
        .find(|segment| segment.role == SegmentRole::Remaining)
    {
        let swatch = Colour::RGB(
            remaining.color.r,
            remaining.color.g,
            remaining.color.b,
        )
        .paint("■");
        println!(
            "{swatch} {}\t{}",
            format_hours_minutes(remaining.seconds),
            remaining.label
        );
    }
}
