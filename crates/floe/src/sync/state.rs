//! Per-table bookmarks.
//!
//! Serialized as `{"bookmarks": {"<table>": {"modified_since": "<RFC 3339>"}}}`.
//! A missing or unreadable state is never an error: affected tables start
//! from the configured start date.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::time::{parse_timestamp, serde_timestamp};

/// Position of one table: files modified at or before this time are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(with = "serde_timestamp")]
    pub modified_since: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl SyncState {
    /// Load state left by a previous run.
    ///
    /// A missing file, invalid JSON, or a malformed bookmark is logged and
    /// skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read state, starting without bookmarks");
                Self::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Self {
        match serde_json::from_str::<Value>(contents) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "State is not valid JSON, starting without bookmarks");
                Self::default()
            }
        }
    }

    /// Extract every well-formed bookmark from a JSON value.
    pub fn from_value(value: &Value) -> Self {
        let Some(bookmarks) = value.get("bookmarks").and_then(Value::as_object) else {
            if !value.as_object().is_some_and(|o| o.is_empty()) {
                warn!("State has no bookmarks object, starting without bookmarks");
            }
            return Self::default();
        };

        let bookmarks = bookmarks
            .iter()
            .filter_map(|(table, bookmark)| {
                let parsed = bookmark
                    .get("modified_since")
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp);
                if parsed.is_none() {
                    warn!(target = %table, "Ignoring malformed bookmark");
                }
                parsed.map(|modified_since| (table.clone(), Bookmark { modified_since }))
            })
            .collect();

        Self { bookmarks }
    }

    pub fn bookmark(&self, table: &str) -> Option<DateTime<Utc>> {
        self.bookmarks.get(table).map(|b| b.modified_since)
    }

    /// Move a table's bookmark forward. Never moves it back.
    ///
    /// Returns whether the bookmark changed.
    pub fn advance(&mut self, table: &str, modified: DateTime<Utc>) -> bool {
        match self.bookmarks.get_mut(table) {
            Some(bookmark) if bookmark.modified_since >= modified => false,
            Some(bookmark) => {
                bookmark.modified_since = modified;
                true
            }
            None => {
                self.bookmarks.insert(
                    table.to_string(),
                    Bookmark {
                        modified_since: modified,
                    },
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 2, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut state = SyncState::default();

        assert!(state.advance("t", ts(2)));
        assert!(!state.advance("t", ts(1)));
        assert!(!state.advance("t", ts(2)));
        assert_eq!(state.bookmark("t"), Some(ts(2)));

        assert!(state.advance("t", ts(3)));
        assert_eq!(state.bookmark("t"), Some(ts(3)));
        assert_eq!(state.bookmark("other"), None);
    }

    #[test]
    fn test_serialized_form() {
        let mut state = SyncState::default();
        state.advance("t", ts(1));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"bookmarks": {"t": {"modified_since": "2020-02-01T00:00:00+00:00"}}})
        );
    }

    #[test]
    fn test_malformed_bookmarks_are_skipped() {
        let state = SyncState::from_value(&json!({
            "bookmarks": {
                "good": {"modified_since": "2020-02-01T00:00:00Z"},
                "bad_time": {"modified_since": "whenever"},
                "no_field": {"offset": 3},
                "wrong_shape": 7
            }
        }));

        assert_eq!(state.bookmarks.len(), 1);
        assert_eq!(state.bookmark("good"), Some(ts(1)));
    }

    #[test]
    fn test_invalid_inputs_mean_no_bookmarks() {
        assert_eq!(SyncState::from_json("{oops"), SyncState::default());
        assert_eq!(SyncState::from_json("[]"), SyncState::default());
        assert_eq!(SyncState::from_json("{}"), SyncState::default());
        assert_eq!(
            SyncState::from_file("/nonexistent/state.json"),
            SyncState::default()
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"bookmarks": {"t": {"modified_since": "2020-02-03T00:00:00+00:00"}}}"#,
        )
        .unwrap();

        assert_eq!(SyncState::from_file(&path).bookmark("t"), Some(ts(3)));
    }
}
