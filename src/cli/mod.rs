pub mod day;
pub mod raw;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    color::store::TagColorStore,
    engine::DataService,
    export::{tags::TagTableFile, CommandExport, DEFAULT_EXPORT_TABLE},
    utils::{dir::create_application_default_path, logging::enable_logging},
};

use day::{process_day_command, DayCommand};
use raw::{process_raw_command, RawCommand};

#[derive(Parser, Debug)]
#[command(name = "Tagtint", version, long_about = None)]
#[command(about = "Nested per-tag breakdown of daily application usage", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show the tag and process breakdown for a day")]
    Day {
        #[command(flatten)]
        command: DayCommand,
    },
    #[command(about = "Print the merged activity table")]
    Raw {
        #[command(flatten)]
        command: RawCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = create_application_default_path()?;
    enable_logging(&app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Day { command } => process_day_command(command).await,
        Commands::Raw { command } => process_raw_command(command).await,
    }
}

/// Wires the on-disk collaborators into a service rooted at the application
/// directory.
fn build_service(exporter: Option<PathBuf>) -> Result<DataService<CommandExport, TagTableFile>> {
    let app_dir = create_application_default_path()?;
    let export = CommandExport::new(
        exporter.unwrap_or_else(default_exporter),
        DEFAULT_EXPORT_TABLE.to_string(),
        app_dir.join("activity-export.csv"),
    );
    let tags = TagTableFile::new(app_dir.join("tags.csv"));
    Ok(DataService::new(export, tags))
}

fn default_exporter() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(r"C:\Program Files\ManicTime\mtc.exe")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("mtc")
    }
}

fn open_color_store() -> Result<TagColorStore> {
    Ok(TagColorStore::load(
        create_application_default_path()?.join("settings.json"),
    ))
}
