use std::{collections::HashMap, sync::Arc};

use super::entities::{ActivityRecord, TagMapping, TaggedRecord};

/// Tag given to processes the user hasn't mapped yet.
pub const UNTAGGED_TAG: &str = "No Clue";

/// Left outer join of the activity table against the tag table by process
/// name. One output row per input row, in input order; unmapped processes
/// get [UNTAGGED_TAG].
pub fn merge_tags(records: Vec<ActivityRecord>, mapping: &[TagMapping]) -> Vec<TaggedRecord> {
    let tags_by_process: HashMap<&str, &Arc<str>> = mapping
        .iter()
        .map(|entry| (&*entry.process, &entry.tag))
        .collect();

    let untagged: Arc<str> = Arc::from(UNTAGGED_TAG);

    records
        .into_iter()
        .map(|record| {
            let tag = tags_by_process
                .get(&*record.process)
                .map(|tag| Arc::clone(tag))
                .unwrap_or_else(|| untagged.clone());
            TaggedRecord { record, tag }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};

    use crate::engine::entities::{ActivityRecord, TagMapping};

    use super::*;

    fn record(process: &str) -> ActivityRecord {
        let start: NaiveDateTime = "2024-01-01T10:00:00".parse().unwrap();
        ActivityRecord {
            name: process.into(),
            start,
            end: start + Duration::minutes(5),
            duration: Duration::minutes(5),
            process: process.into(),
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> Vec<TagMapping> {
        pairs
            .iter()
            .map(|(process, tag)| TagMapping {
                process: (*process).into(),
                tag: (*tag).into(),
            })
            .collect()
    }

    #[test]
    fn test_merge_keeps_every_row_in_order() {
        let records = vec![record("chrome"), record("code"), record("chrome")];

        let merged = merge_tags(records.clone(), &mapping(&[("chrome", "Browsing")]));

        assert_eq!(merged.len(), records.len());
        let processes: Vec<&str> = merged.iter().map(|m| &*m.record.process).collect();
        assert_eq!(processes, vec!["chrome", "code", "chrome"]);
    }

    #[test]
    fn test_merge_resolves_known_and_sentinel_tags() {
        let merged = merge_tags(
            vec![record("chrome"), record("mystery")],
            &mapping(&[("chrome", "Browsing")]),
        );

        assert_eq!(&*merged[0].tag, "Browsing");
        assert_eq!(&*merged[1].tag, UNTAGGED_TAG);
    }

    #[test]
    fn test_merge_with_empty_mapping_tags_nothing() {
        let merged = merge_tags(vec![record("chrome")], &[]);

        assert_eq!(&*merged[0].tag, UNTAGGED_TAG);
        assert!(merged.iter().all(|m| !m.tag.is_empty()));
    }
}
