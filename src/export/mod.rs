//! External collaborators: the tracker's export tool and the user's tag
//! table. Both sit behind traits so the engine can be tested without either.

pub mod tags;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::engine::entities::ActivityRecord;

/// Produces the raw activity table, one row per application interval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityExport: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<ActivityRecord>>;
}

/// Table name understood by the ManicTime exporter.
pub const DEFAULT_EXPORT_TABLE: &str = "ManicTime/Applications";

/// Runs the external tracker cli to export the applications table into a
/// scratch csv, then reads it back.
pub struct CommandExport {
    program: PathBuf,
    table: String,
    csv_path: PathBuf,
}

impl CommandExport {
    pub fn new(program: PathBuf, table: String, csv_path: PathBuf) -> Self {
        Self {
            program,
            table,
            csv_path,
        }
    }
}

#[async_trait]
impl ActivityExport for CommandExport {
    async fn fetch_records(&self) -> Result<Vec<ActivityRecord>> {
        debug!("Exporting {} via {:?}", self.table, self.program);
        let status = Command::new(&self.program)
            .arg("export")
            .arg(&self.table)
            .arg(&self.csv_path)
            .status()
            .await
            .with_context(|| format!("Failed to start export tool {:?}", self.program))?;
        if !status.success() {
            bail!("Export tool {:?} exited with {status}", self.program);
        }

        read_records_csv(&self.csv_path)
    }
}

/// Reads an exported applications table. A bad row fails the whole read so a
/// partial table never passes for a complete one.
pub fn read_records_csv(path: &Path) -> Result<Vec<ActivityRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open export at {path:?}"))?;
    let mut records = vec![];
    for row in reader.deserialize() {
        records.push(row.with_context(|| format!("Malformed row in {path:?}"))?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::Duration;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_read_records_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Start,End,Duration,Process").unwrap();
        writeln!(
            file,
            "Google Chrome,2024-01-01T10:00:00,2024-01-01T11:00:00,01:00:00,chrome"
        )
        .unwrap();
        writeln!(
            file,
            "Visual Studio Code,2024-01-01 11:00:00,2024-01-01 11:30:00,00:30:00,code"
        )
        .unwrap();

        let records = read_records_csv(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(&*records[0].name, "Google Chrome");
        assert_eq!(&*records[0].process, "chrome");
        assert_eq!(records[0].duration, Duration::hours(1));
        assert_eq!(records[1].duration, Duration::minutes(30));
    }

    #[test]
    fn test_bad_row_fails_the_whole_read() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Start,End,Duration,Process").unwrap();
        writeln!(
            file,
            "Chrome,2024-01-01T10:00:00,2024-01-01T11:00:00,not a duration,chrome"
        )
        .unwrap();

        assert!(read_records_csv(file.path()).is_err());
    }

    #[test]
    fn test_missing_export_is_an_error() {
        assert!(read_records_csv(Path::new("/definitely/missing.csv")).is_err());
    }
}
