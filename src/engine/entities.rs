use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the activity export: a contiguous stretch of time the user
/// spent in one application window. Field names follow the columns the
/// export tool writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(rename = "Name")]
    pub name: Arc<str>,
    #[serde(rename = "Start", with = "datetime_ser")]
    pub start: NaiveDateTime,
    #[serde(rename = "End", with = "datetime_ser")]
    pub end: NaiveDateTime,
    #[serde(rename = "Duration", with = "duration_ser")]
    pub duration: Duration,
    #[serde(rename = "Process")]
    pub process: Arc<str>,
}

/// An activity record with its tag resolved. After merging every record has
/// one, if only the untagged sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRecord {
    pub record: ActivityRecord,
    pub tag: Arc<str>,
}

/// One row of the user's tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMapping {
    #[serde(rename = "Process")]
    pub process: Arc<str>,
    #[serde(rename = "Tag")]
    pub tag: Arc<str>,
}

/// Parses a TimeSpan style duration: `[d.]hh:mm:ss[.frac]`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let (days, clock) = match value.split_once('.') {
        Some((days, rest)) if !days.contains(':') && rest.contains(':') => {
            (days.parse::<i64>()?, rest)
        }
        _ => (0, value),
    };

    let mut parts = clock.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow!("Can't parse {value} as a duration"));
    };

    let hours = hours.parse::<i64>()?;
    let minutes = minutes.parse::<i64>()?;
    let seconds = seconds.parse::<f64>()?;
    if days < 0 || hours < 0 || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(anyhow!("Can't parse {value} as a duration"));
    }

    let millis =
        (days as f64 * 86_400.0 + hours as f64 * 3_600.0 + minutes as f64 * 60.0 + seconds)
            * 1000.0;
    Ok(Duration::milliseconds(millis.round() as i64))
}

/// `hh:mm:ss` with whole seconds, the way the export writes durations back.
pub fn format_timespan(duration: &Duration) -> String {
    let total = duration.num_seconds();
    format!("{:02}:{:02}:{:02}", total / 3600, total % 3600 / 60, total % 60)
}

mod duration_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::{format_timespan, parse_duration};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timespan(duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

mod datetime_ser {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    // The export writes local wall-clock times; both the T and the space
    // separated forms show up depending on the exporter version.
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&s, format).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("Can't parse {s} as a date time")))
    }
}
