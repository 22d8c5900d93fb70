//! Loosely-typed scalar fields as the backend sends them.
//!
//! Exchange payloads mix JSON numbers and numeric strings for prices and
//! volumes, and epoch milliseconds and ISO 8601 strings for timestamps.
//! These types accept any JSON value on the wire and defer parsing to the
//! domain boundary, where failures become [`ValidationError`]s. A record with
//! one bad field is then rejected on its own instead of failing the response.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A price or volume: JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    /// Any other JSON shape; always rejected by `parse`.
    Other(Value),
}

impl RawNumber {
    /// Parse into a finite `f64`, naming `field` in the error.
    pub fn parse(&self, field: &'static str) -> Result<f64, ValidationError> {
        let value = match self {
            RawNumber::Number(n) => *n,
            RawNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::Number {
                field,
                value: s.clone(),
            })?,
            RawNumber::Other(v) => {
                return Err(ValidationError::Number {
                    field,
                    value: v.to_string(),
                })
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ValidationError::Number {
                field,
                value: value.to_string(),
            })
        }
    }
}

impl From<f64> for RawNumber {
    fn from(n: f64) -> Self {
        RawNumber::Number(n)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

/// A sample timestamp: epoch milliseconds (integer, float or numeric string)
/// or an RFC 3339 / `YYYY-MM-DD HH:MM:SS` (UTC) string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    /// Fractional milliseconds, rounded to the nearest millisecond.
    FractionalMillis(f64),
    Text(String),
    /// Any other JSON shape; always rejected by `parse`.
    Other(Value),
}

impl RawTimestamp {
    pub fn parse(&self) -> Result<DateTime<Utc>, ValidationError> {
        match self {
            RawTimestamp::Millis(ms) => from_millis(*ms),
            RawTimestamp::FractionalMillis(ms) => {
                let rounded = ms.round();
                if rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
                    from_millis(rounded as i64)
                } else {
                    Err(ValidationError::Timestamp(ms.to_string()))
                }
            }
            RawTimestamp::Other(v) => Err(ValidationError::Timestamp(v.to_string())),
            RawTimestamp::Text(s) => {
                let s = s.trim();
                if let Ok(ms) = s.parse::<i64>() {
                    return from_millis(ms);
                }
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(dt.with_timezone(&Utc));
                }
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| naive.and_utc())
                    .map_err(|_| ValidationError::Timestamp(s.to_string()))
            }
        }
    }
}

impl From<i64> for RawTimestamp {
    fn from(ms: i64) -> Self {
        RawTimestamp::Millis(ms)
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| ValidationError::Timestamp(ms.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_number_accepts_json_number_and_string() {
        let n: RawNumber = serde_json::from_str("100.5").unwrap();
        assert_eq!(n.parse("close"), Ok(100.5));
        let s: RawNumber = serde_json::from_str("\"100.5\"").unwrap();
        assert_eq!(s.parse("close"), Ok(100.5));
    }

    #[test]
    fn test_number_rejects_garbage() {
        let n = RawNumber::from("abc");
        assert_eq!(
            n.parse("close"),
            Err(ValidationError::Number {
                field: "close",
                value: "abc".into()
            })
        );
    }

    #[test]
    fn test_number_rejects_non_finite_text() {
        assert!(RawNumber::from("NaN").parse("close").is_err());
        assert!(RawNumber::from("inf").parse("close").is_err());
    }

    #[test]
    fn test_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(RawTimestamp::from("2024-01-01T00:00:00Z").parse(), Ok(expected));
        assert_eq!(RawTimestamp::from(1_704_067_200_000).parse(), Ok(expected));
        assert_eq!(RawTimestamp::from("1704067200000").parse(), Ok(expected));
        assert_eq!(RawTimestamp::from("2024-01-01 00:00:00").parse(), Ok(expected));
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert_eq!(
            RawTimestamp::from("yesterday").parse(),
            Err(ValidationError::Timestamp("yesterday".into()))
        );
    }

    #[test]
    fn test_float_millis_are_rounded() {
        let ts: RawTimestamp = serde_json::from_str("1704067200000.4").unwrap();
        assert_eq!(ts, RawTimestamp::FractionalMillis(1_704_067_200_000.4));
        assert_eq!(ts.parse(), Ok(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));

        let int: RawTimestamp = serde_json::from_str("1704067200000").unwrap();
        assert_eq!(int, RawTimestamp::Millis(1_704_067_200_000));
    }

    #[test]
    fn test_wrong_json_types_decode_then_fail_to_parse() {
        let n: RawNumber = serde_json::from_str("true").unwrap();
        assert_eq!(
            n.parse("close"),
            Err(ValidationError::Number {
                field: "close",
                value: "true".into()
            })
        );
        let ts: RawTimestamp = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(ts.parse(), Err(ValidationError::Timestamp("[1,2]".into())));
        let ts: RawTimestamp = serde_json::from_str("{\"ms\": 1}").unwrap();
        assert!(ts.parse().is_err());
    }
}
