//! The aggregation engine: merged activity records behind a single-flight
//! cache, and the day breakdown built from them.

pub mod breakdown;
pub mod entities;
pub mod merge;

use std::sync::{Arc, RwLock};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::export::{tags::TagSource, ActivityExport};

use entities::TaggedRecord;
use merge::merge_tags;

#[derive(Default)]
struct CacheState {
    records: Arc<[TaggedRecord]>,
    generation: u64,
}

/// Owns the last successfully merged record set. Reads are served from the
/// cache; refreshes re-run the export and are serialized behind a single
/// gate, so at most one export is ever in flight.
pub struct DataService<E, T> {
    export: E,
    tags: T,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
}

impl<E: ActivityExport, T: TagSource> DataService<E, T> {
    pub fn new(export: E, tags: T) -> Self {
        Self {
            export,
            tags,
            state: RwLock::new(CacheState::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Returns the merged record set, re-running the export when forced or
    /// when nothing is cached yet. On failure the previous cache is kept
    /// untouched and the error returned.
    #[instrument(skip(self))]
    pub async fn merged_records(&self, force_reload: bool) -> Result<Arc<[TaggedRecord]>> {
        let seen_generation = {
            let state = self.state.read().unwrap();
            if !force_reload && !state.records.is_empty() {
                return Ok(state.records.clone());
            }
            state.generation
        };

        let _gate = self.refresh_gate.lock().await;

        {
            let state = self.state.read().unwrap();
            // A refresh that finished while we waited on the gate already
            // covers this request.
            if state.generation != seen_generation && !state.records.is_empty() {
                return Ok(state.records.clone());
            }
            if !force_reload && !state.records.is_empty() {
                return Ok(state.records.clone());
            }
        }

        debug!("Reloading activity data");
        let mapping = self.tags.load_mapping().await?;
        let records = self.export.fetch_records().await?;
        let merged: Arc<[TaggedRecord]> = merge_tags(records, &mapping).into();

        let mut state = self.state.write().unwrap();
        state.records = merged.clone();
        state.generation += 1;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    use crate::{
        engine::entities::{ActivityRecord, TagMapping},
        export::{tags::MockTagSource, ActivityExport, MockActivityExport},
        utils::logging::TEST_LOGGING,
    };

    use super::DataService;

    fn record(process: &str) -> ActivityRecord {
        let start: NaiveDateTime = "2024-01-01T10:00:00".parse().unwrap();
        ActivityRecord {
            name: process.into(),
            start,
            end: start + chrono::Duration::hours(1),
            duration: chrono::Duration::hours(1),
            process: process.into(),
        }
    }

    fn mapping() -> Vec<TagMapping> {
        vec![TagMapping {
            process: "chrome".into(),
            tag: "Browsing".into(),
        }]
    }

    #[tokio::test]
    async fn test_cache_hit_skips_export() -> Result<()> {
        let mut export = MockActivityExport::new();
        export
            .expect_fetch_records()
            .times(1)
            .returning(|| Ok(vec![record("chrome")]));
        let mut tags = MockTagSource::new();
        tags.expect_load_mapping().times(1).returning(|| Ok(mapping()));

        let service = DataService::new(export, tags);

        let first = service.merged_records(false).await?;
        let second = service.merged_records(false).await?;

        assert_eq!(first.len(), 1);
        assert_eq!(&*first[0].tag, "Browsing");
        assert!(Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[tokio::test]
    async fn test_force_reload_runs_export_again() -> Result<()> {
        let mut export = MockActivityExport::new();
        export
            .expect_fetch_records()
            .times(2)
            .returning(|| Ok(vec![record("chrome")]));
        let mut tags = MockTagSource::new();
        tags.expect_load_mapping().times(2).returning(|| Ok(mapping()));

        let service = DataService::new(export, tags);

        let first = service.merged_records(true).await?;
        let second = service.merged_records(true).await?;

        assert_eq!(first.len(), second.len());
        assert!(!Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache() -> Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut export = MockActivityExport::new();
        export
            .expect_fetch_records()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![record("chrome")]));
        export
            .expect_fetch_records()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(anyhow!("export tool is gone")));
        let mut tags = MockTagSource::new();
        tags.expect_load_mapping().returning(|| Ok(mapping()));

        let service = DataService::new(export, tags);

        let loaded = service.merged_records(true).await?;
        assert_eq!(loaded.len(), 1);

        assert!(service.merged_records(true).await.is_err());

        // Stale data is still served after the failure.
        let cached = service.merged_records(false).await?;
        assert_eq!(cached.len(), 1);
        Ok(())
    }

    struct SlowExport {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ActivityExport for SlowExport {
        async fn fetch_records(&self) -> Result<Vec<ActivityRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![record("chrome")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_forced_reloads_run_one_export() -> Result<()> {
        *TEST_LOGGING;
        let calls = Arc::new(AtomicUsize::new(0));
        let export = SlowExport {
            calls: calls.clone(),
        };
        let mut tags = MockTagSource::new();
        tags.expect_load_mapping().times(1).returning(|| Ok(mapping()));

        let service = DataService::new(export, tags);

        let (a, b, c) = tokio::join!(
            service.merged_records(true),
            service.merged_records(true),
            service.merged_records(true),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a?, b?, c?] {
            assert_eq!(result.len(), 1);
            assert_eq!(&*result[0].tag, "Browsing");
        }
        Ok(())
    }
}
