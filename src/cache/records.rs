//! Persisted Record Formats
//!
//! Line formats of the file store's expire, data and info logs.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::cache::CounterSnapshot;
use crate::error::{Result, SmashError};

/// Expire log timestamp, minute precision.
pub const EXPIRE_TIME_FORMAT: &str = "%Y_%m_%d_%H_%M";
/// Expire log bucket file stem, hour precision.
pub const EXPIRE_BUCKET_FORMAT: &str = "%Y_%m_%d_%H";
/// Info log file stem, one file per day.
pub const INFO_LOG_DAY_FORMAT: &str = "%Y_%m_%d";
/// Timestamp inside JSON records.
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// == Expire Log ==
/// One expire log line: when `path` stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireRecord {
    pub expires_at: NaiveDateTime,
    pub path: String,
}

impl ExpireRecord {
    pub fn new(expires_at: DateTime<Local>, path: impl Into<String>) -> Self {
        Self {
            expires_at: expires_at.naive_local(),
            path: path.into(),
        }
    }

    /// `<YYYY_MM_DD_HH_MM>,<fullPath>`
    pub fn to_line(&self) -> String {
        format!("{},{}", self.expires_at.format(EXPIRE_TIME_FORMAT), self.path)
    }

    /// Name of the hourly bucket file this record belongs in.
    pub fn bucket(&self) -> String {
        self.expires_at.format(EXPIRE_BUCKET_FORMAT).to_string()
    }

    pub fn parse(line: &str) -> Option<Self> {
        let (stamp, path) = line.trim_end().split_once(',')?;
        // Minute precision has no seconds field; pad one so chrono accepts it.
        let expires_at =
            NaiveDateTime::parse_from_str(&format!("{}_00", stamp), "%Y_%m_%d_%H_%M_%S").ok()?;
        if path.is_empty() {
            return None;
        }
        Some(Self {
            expires_at,
            path: path.to_string(),
        })
    }
}

// == Data Log ==
/// `{"object_data":{"count":<int>,"time":"<YYYY-MM-DD HH:MM:SS>"}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataLogRecord {
    pub object_data: ObjectData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectData {
    pub count: u64,
    pub time: String,
}

impl DataLogRecord {
    pub fn new(count: u64, now: DateTime<Local>) -> Self {
        Self {
            object_data: ObjectData {
                count,
                time: now.format(RECORD_TIME_FORMAT).to_string(),
            },
        }
    }

    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses one data log line.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| {
            SmashError::MalformedPersistedState(format!("data log line '{}': {}", line.trim(), e))
        })
    }
}

// == Info Log ==
/// `{"counts":{"time":"...","<hit_key>":<int>,"<miss_key>":<int>}}`
#[derive(Debug, Clone, Serialize)]
pub struct InfoLogRecord {
    pub counts: InfoCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoCounts {
    pub time: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, u64>,
}

impl InfoLogRecord {
    /// Blank counter keys are left out of the record.
    pub fn new(hit_key: &str, miss_key: &str, snapshot: &CounterSnapshot, now: DateTime<Local>) -> Self {
        let mut values = BTreeMap::new();
        if !hit_key.trim().is_empty() {
            values.insert(hit_key.to_string(), snapshot.hits);
        }
        if !miss_key.trim().is_empty() {
            values.insert(miss_key.to_string(), snapshot.misses);
        }
        Self {
            counts: InfoCounts {
                time: now.format(RECORD_TIME_FORMAT).to_string(),
                values,
            },
        }
    }

    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn fixed_time() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 30)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_expire_record_line() {
        let record = ExpireRecord::new(fixed_time(), "/api/v1/dogs");
        assert_eq!(record.to_line(), "2024_03_09_14_05,/api/v1/dogs");
        assert_eq!(record.bucket(), "2024_03_09_14");
    }

    #[test]
    fn test_expire_record_parse() {
        let record = ExpireRecord::parse("2024_03_09_14_05,/api/v1/dogs/page=2\n").unwrap();
        assert_eq!(record.path, "/api/v1/dogs/page=2");
        assert_eq!(record.expires_at.format(EXPIRE_TIME_FORMAT).to_string(), "2024_03_09_14_05");

        assert!(ExpireRecord::parse("garbage").is_none());
        assert!(ExpireRecord::parse("2024_03_09_14_05,").is_none());
    }

    #[test]
    fn test_data_log_line() {
        let line = DataLogRecord::new(42, fixed_time()).to_line().unwrap();
        assert_eq!(line, r#"{"object_data":{"count":42,"time":"2024-03-09 14:05:30"}}"#);

        let parsed = DataLogRecord::parse(&line).unwrap();
        assert_eq!(parsed.object_data.count, 42);
    }

    #[test]
    fn test_data_log_malformed() {
        let result = DataLogRecord::parse(r#"{"type":"object_count"}"#);
        assert!(matches!(result, Err(SmashError::MalformedPersistedState(_))));
    }

    #[test]
    fn test_info_log_line() {
        let snapshot = CounterSnapshot {
            hits: 7,
            misses: 3,
            objects: 0,
        };
        let line = InfoLogRecord::new("/hits", "", &snapshot, fixed_time())
            .to_line()
            .unwrap();
        assert_eq!(line, r#"{"counts":{"time":"2024-03-09 14:05:30","/hits":7}}"#);
    }
}
