use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::NaiveDate;

use crate::color::{store::TagColorStore, Color};

use super::entities::TaggedRecord;

/// Pseudo tag for the part of the day with no recorded activity. Its color
/// lives in the same store as user tags.
pub const REMAINING_TAG: &str = "Remaining";

/// Default noise floor in seconds. Process slices at or below it are dropped
/// from the process ring.
pub const DEFAULT_MIN_SEGMENT_SECONDS: f64 = 30.0;

const FULL_DAY_SECONDS: f64 = 86_400.0;

/// What a segment represents in the nested chart: the outer tag ring, the
/// inner process ring, or the padding up to 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Tag,
    Process,
    Remaining,
}

/// One colored slice of the nested breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSegment {
    pub label: Arc<str>,
    pub seconds: f64,
    pub color: Color,
    pub role: SegmentRole,
}

/// One line of the textual legend next to the chart. Process entries are
/// indented under their tag.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub name: Arc<str>,
    pub duration: String,
    pub color: Color,
    pub indented: bool,
}

#[derive(Debug, Default)]
pub struct DayBreakdown {
    pub segments: Vec<PieSegment>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug)]
struct TagUsage {
    total_seconds: f64,
    processes: Vec<ProcessUsage>,
}

#[derive(Debug)]
struct ProcessUsage {
    process: Arc<str>,
    seconds: f64,
}

/// Builds the nested tag → process breakdown for one day.
///
/// Tag totals count every record of the day, while the process list under a
/// tag drops slices at or below `min_segment_seconds`; the dropped noise
/// only shows up through the remaining-time padding. Tags come out ordered
/// by name, processes by seconds, largest first.
pub fn build_day_breakdown(
    records: &[TaggedRecord],
    day: NaiveDate,
    min_segment_seconds: f64,
    colors: &TagColorStore,
) -> DayBreakdown {
    let nested = nest_day_records(records, day, min_segment_seconds);
    if nested.is_empty() {
        return DayBreakdown::default();
    }

    let mut segments = vec![];
    let mut legend = vec![];
    let mut used_seconds = 0.0;

    for (tag, usage) in &nested {
        let base = colors.get_or_assign(tag);
        segments.push(PieSegment {
            label: tag.clone(),
            seconds: usage.total_seconds,
            color: base,
            role: SegmentRole::Tag,
        });
        legend.push(LegendEntry {
            name: tag.clone(),
            duration: format_hours_minutes(usage.total_seconds),
            color: base,
            indented: false,
        });

        let count = usage.processes.len();
        for (rank, process) in usage.processes.iter().enumerate() {
            // Brightness ramp over the descending order: the largest slice is
            // darkest, the smallest reaches 100, nothing goes below 20.
            let intensity = 20.0 + (rank as f32 + 1.0) / count as f32 * 80.0;
            let color = base.with_value(intensity);
            segments.push(PieSegment {
                label: process.process.clone(),
                seconds: process.seconds,
                color,
                role: SegmentRole::Process,
            });
            legend.push(LegendEntry {
                name: process.process.clone(),
                duration: format_hours_minutes(process.seconds),
                color,
                indented: true,
            });
            used_seconds += process.seconds;
        }
    }

    let remaining = (FULL_DAY_SECONDS - used_seconds).max(0.0);
    let remaining_color = colors.get_or_assign(REMAINING_TAG);
    // One remaining slice per ring, sharing the stored color.
    for _ in 0..2 {
        segments.push(PieSegment {
            label: REMAINING_TAG.into(),
            seconds: remaining,
            color: remaining_color,
            role: SegmentRole::Remaining,
        });
    }

    DayBreakdown { segments, legend }
}

/// Groups one day's records into per-tag totals with a filtered, sorted
/// process split. The map is keyed by tag name, which fixes the tag order.
fn nest_day_records(
    records: &[TaggedRecord],
    day: NaiveDate,
    min_segment_seconds: f64,
) -> BTreeMap<Arc<str>, TagUsage> {
    let mut grouped = BTreeMap::<Arc<str>, (f64, HashMap<Arc<str>, f64>)>::new();

    for tagged in records {
        if tagged.record.start.date() != day {
            continue;
        }
        let seconds = tagged.record.duration.num_milliseconds() as f64 / 1000.0;
        let (total, by_process) = grouped.entry(tagged.tag.clone()).or_default();
        *total += seconds;
        *by_process.entry(tagged.record.process.clone()).or_default() += seconds;
    }

    grouped
        .into_iter()
        .map(|(tag, (total_seconds, by_process))| {
            let mut survivors = by_process
                .into_iter()
                .filter(|(_, seconds)| *seconds > min_segment_seconds)
                .map(|(process, seconds)| ProcessUsage { process, seconds })
                .collect::<Vec<_>>();
            survivors.sort_by(|a, b| {
                b.seconds
                    .total_cmp(&a.seconds)
                    .then_with(|| a.process.cmp(&b.process))
            });
            (
                tag,
                TagUsage {
                    total_seconds,
                    processes: survivors,
                },
            )
        })
        .collect()
}

/// Whole `hh:mm`, seconds truncated.
pub fn format_hours_minutes(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor() as i64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
