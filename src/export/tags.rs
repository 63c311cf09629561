use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::engine::entities::TagMapping;

/// Source of the user's process → tag table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn load_mapping(&self) -> Result<Vec<TagMapping>>;
}

const TAG_TABLE_HEADER: &str = "Process,Tag\n";

/// `tags.csv` in the application directory. Created with just the header
/// when missing so there is always a file for the user to edit.
pub struct TagTableFile {
    path: PathBuf,
}

impl TagTableFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TagSource for TagTableFile {
    async fn load_mapping(&self) -> Result<Vec<TagMapping>> {
        if !tokio::fs::try_exists(&self.path).await? {
            tokio::fs::write(&self.path, TAG_TABLE_HEADER)
                .await
                .with_context(|| format!("Failed to create tag table at {:?}", self.path))?;
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open tag table at {:?}", self.path))?;
        let mut mapping = vec![];
        for row in reader.deserialize() {
            mapping.push(row.with_context(|| format!("Malformed row in {:?}", self.path))?);
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_missing_table_is_created_with_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tags.csv");

        let table = TagTableFile::new(path.clone());
        let mapping = table.load_mapping().await?;

        assert!(mapping.is_empty());
        assert_eq!(std::fs::read_to_string(&path)?, "Process,Tag\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_loads_user_entries() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tags.csv");
        std::fs::write(&path, "Process,Tag\nchrome,Browsing\ncode,Work\n")?;

        let table = TagTableFile::new(path);
        let mapping = table.load_mapping().await?;

        assert_eq!(mapping.len(), 2);
        assert_eq!(&*mapping[0].process, "chrome");
        assert_eq!(&*mapping[0].tag, "Browsing");
        assert_eq!(&*mapping[1].tag, "Work");
        Ok(())
    }
}
