//! Query types.

use serde::Serialize;
use serde_json::{Map, Value};

/// Query parameter / JSON key carrying the range start.
pub const START_KEY: &str = "start_datetime";
/// Query parameter / JSON key carrying the range end.
pub const END_KEY: &str = "end_datetime";

/// Untyped candidate pair pulled out of a request.
///
/// Holds at most [`START_KEY`] and [`END_KEY`]; every other key the caller
/// sent is dropped on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery {
    start: Option<Value>,
    end: Option<Value>,
}

impl RawQuery {
    pub fn new(start: Option<Value>, end: Option<Value>) -> Self {
        Self { start, end }
    }

    /// Keep the two range keys of a JSON object.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        Self {
            start: object.remove(START_KEY),
            end: object.remove(END_KEY),
        }
    }

    /// Keep the two range keys of decoded query pairs. First occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                START_KEY => &mut query.start,
                END_KEY => &mut query.end,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(Value::String(value.into()));
            }
        }
        query
    }

    pub fn start(&self) -> Option<&Value> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&Value> {
        self.end.as_ref()
    }
}

/// A validated time range. `start <= end` always holds.
///
/// Serializes to exactly `{"start_datetime": .., "end_datetime": ..}`, which
/// is the body forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRangeQuery {
    #[serde(rename = "start_datetime")]
    start: i64,
    #[serde(rename = "end_datetime")]
    end: i64,
}

impl TimeRangeQuery {
    /// Returns `None` when `start > end`.
    pub(crate) fn new(start: i64, end: i64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Width of the range in seconds.
    pub fn span_secs(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_object_drops_extraneous_keys() {
        let body = json!({
            "start_datetime": 1,
            "end_datetime": 2,
            "sql": "' OR '1'='1",
            "__proto__": {"admin": true},
            "../../etc/passwd": "file"
        });
        let Value::Object(map) = body else { unreachable!() };

        let raw = RawQuery::from_object(map);
        assert_eq!(raw, RawQuery::new(Some(json!(1)), Some(json!(2))));
    }

    #[test]
    fn test_from_pairs_first_occurrence_wins() {
        let raw = RawQuery::from_pairs([
            ("end_datetime", "20"),
            ("start_datetime", "10"),
            ("start_datetime", "99"),
            ("other", "x"),
        ]);
        assert_eq!(raw.start(), Some(&json!("10")));
        assert_eq!(raw.end(), Some(&json!("20")));
    }

    #[test]
    fn test_time_range_serializes_to_allow_listed_fields() {
        let query = TimeRangeQuery::new(1000, 2000).unwrap();
        assert_eq!(
            serde_json::to_value(query).unwrap(),
            json!({"start_datetime": 1000, "end_datetime": 2000})
        );
    }

    #[test]
    fn test_span_does_not_overflow() {
        let query = TimeRangeQuery::new(i64::MIN, i64::MAX).unwrap();
        assert_eq!(query.span_secs(), u64::MAX);
        assert!(TimeRangeQuery::new(1, 0).is_none());
    }
}
