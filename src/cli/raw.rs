use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::engine::entities::{format_timespan, TaggedRecord};

use super::build_service;

#[derive(Debug, Parser)]
pub struct RawCommand {
    #[arg(short, long, help = "Path to the tracker's export tool")]
    exporter: Option<PathBuf>,
}

/// Dumps the merged table the way the engine sees it. Useful when deciding
/// which processes still need tags.
pub async fn process_raw_command(RawCommand { exporter }: RawCommand) -> Result<()> {
    let service = build_service(exporter)?;
    let records = service.merged_records(false).await?;

    for tagged in records.iter() {
        println!("{}", format_row(tagged));
    }
    Ok(())
}

fn format_row(tagged: &TaggedRecord) -> String {
    let record = &tagged.record;
    format!(
        "{} | {} | {} | {} | {} | {}",
        record.name,
        record.start.format("%Y-%m-%dT%H:%M:%S"),
        record.end.format("%Y-%m-%dT%H:%M:%S"),
        format_timespan(&record.duration),
        record.process,
        tagged.tag
    )
}
