//! Time-range validation.
//!
//! Gates, in order, first failure wins:
//! 1. both keys present and non-null → `MissingParameter`
//! 2. both values losslessly convertible to `i64` → `InvalidParameterType`
//! 3. `start <= end` → `InvalidTimeRange`
//!
//! The timestamps themselves are not bounded. Zero, far past and far future
//! values are forwarded as-is.

use serde_json::Value;

use crate::error::{ProxyError, ProxyResult};
use crate::query::types::{RawQuery, TimeRangeQuery, END_KEY, START_KEY};

/// Longest caller value echoed back in an error message.
const MAX_ECHOED_VALUE_LEN: usize = 64;

/// Validate a raw query into a [`TimeRangeQuery`].
pub fn validate(raw: &RawQuery) -> ProxyResult<TimeRangeQuery> {
    let start = require(START_KEY, raw.start())?;
    let end = require(END_KEY, raw.end())?;

    let start = to_timestamp(START_KEY, start)?;
    let end = to_timestamp(END_KEY, end)?;

    TimeRangeQuery::new(start, end).ok_or(ProxyError::InvalidTimeRange { start, end })
}

fn require<'a>(name: &'static str, value: Option<&'a Value>) -> ProxyResult<&'a Value> {
    match value {
        None | Some(Value::Null) => Err(ProxyError::MissingParameter(name)),
        Some(v) => Ok(v),
    }
}

fn to_timestamp(name: &'static str, value: &Value) -> ProxyResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_f64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ProxyError::InvalidParameterType {
        name,
        value: echo(value),
    })
}

// 1000.0 is accepted, 1000.5 is not.
fn whole_f64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn echo(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > MAX_ECHOED_VALUE_LEN {
        let mut cut = MAX_ECHOED_VALUE_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
