//! Raw OHLC samples → plot points.
//!
//! Samples whose timestamp or close cannot be parsed are dropped and counted.
//! Nothing is coerced to zero, so a bad sample never drags the value axis.

use crate::domain::candle::wire::CandleSample;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The minimal plotting representation of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub timestamp: DateTime<Utc>,
    pub close_value: f64,
}

impl PlotPoint {
    pub fn new(timestamp: DateTime<Utc>, close_value: f64) -> Self {
        Self {
            timestamp,
            close_value,
        }
    }
}

impl TryFrom<&CandleSample> for PlotPoint {
    type Error = ValidationError;

    fn try_from(sample: &CandleSample) -> Result<Self, Self::Error> {
        let timestamp = sample
            .timestamp
            .as_ref()
            .ok_or(ValidationError::Missing("timestamp"))?
            .parse()?;
        let close_value = sample
            .close
            .as_ref()
            .ok_or(ValidationError::Missing("close"))?
            .parse("close")?;
        Ok(Self {
            timestamp,
            close_value,
        })
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Parsed points in input order (duplicates by timestamp pass through).
    pub points: Vec<PlotPoint>,
    /// How many samples were rejected.
    pub dropped: usize,
}

/// Convert raw samples to plot points. Absent or empty input yields no points.
pub fn normalize(raw: Option<&[CandleSample]>) -> Normalized {
    let Some(samples) = raw else {
        return Normalized::default();
    };

    let mut out = Normalized {
        points: Vec::with_capacity(samples.len()),
        dropped: 0,
    };

    for (index, sample) in samples.iter().enumerate() {
        match PlotPoint::try_from(sample) {
            Ok(point) => out.points.push(point),
            Err(err) => {
                tracing::debug!(index, error = %err, "Dropping chart sample");
                out.dropped += 1;
            }
        }
    }

    if out.dropped > 0 {
        tracing::warn!(
            dropped = out.dropped,
            kept = out.points.len(),
            "Dropped unparsable chart samples"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_and_empty_input() {
        assert_eq!(normalize(None), Normalized::default());
        assert_eq!(normalize(Some(&[])).points, Vec::new());
    }

    #[test]
    fn test_single_sample() {
        let samples = [CandleSample::new("2024-01-01T00:00:00Z", "100.5")];
        let out = normalize(Some(&samples));
        assert_eq!(
            out.points,
            vec![PlotPoint::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                100.5
            )]
        );
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn test_unparsable_samples_are_dropped_and_counted() {
        let samples = [
            CandleSample::new(1_704_067_200_000, "100.5"),
            CandleSample::new("not a date", "101.0"),
            CandleSample::new(1_704_067_260_000, "n/a"),
            CandleSample {
                close: None,
                ..CandleSample::new(1_704_067_320_000, "0")
            },
            CandleSample::new(1_704_067_380_000, 102.25),
        ];
        let out = normalize(Some(&samples));
        assert_eq!(out.dropped, 3);
        let closes: Vec<f64> = out.points.iter().map(|p| p.close_value).collect();
        assert_eq!(closes, vec![100.5, 102.25]);
    }

    #[test]
    fn test_wrong_typed_samples_are_dropped_not_fatal() {
        let json = r#"{"chart": [
            {"timestamp": 1704067200000, "close": "100.5"},
            {"timestamp": 1704067260000.0, "close": 100.7},
            {"timestamp": 1704067320000, "close": true},
            {"timestamp": {"ms": 1}, "close": "1"}
        ]}"#;
        let resp: crate::domain::candle::wire::ChartResponse = serde_json::from_str(json).unwrap();
        let out = normalize(Some(resp.chart.as_slice()));
        assert_eq!(out.dropped, 2);
        let closes: Vec<f64> = out.points.iter().map(|p| p.close_value).collect();
        assert_eq!(closes, vec![100.5, 100.7]);
        assert_eq!(out.points[1].timestamp.timestamp_millis(), 1_704_067_260_000);
    }

    #[test]
    fn test_order_and_duplicates_pass_through() {
        let samples = [
            CandleSample::new(2_000, "2"),
            CandleSample::new(1_000, "1"),
            CandleSample::new(2_000, "3"),
        ];
        let out = normalize(Some(&samples));
        let millis: Vec<i64> = out.points.iter().map(|p| p.timestamp.timestamp_millis()).collect();
        assert_eq!(millis, vec![2_000, 1_000, 2_000]);
    }

    #[test]
    fn test_missing_field_error() {
        let sample = CandleSample {
            timestamp: None,
            ..CandleSample::new(0, "1")
        };
        assert_eq!(
            PlotPoint::try_from(&sample),
            Err(ValidationError::Missing("timestamp"))
        );
    }
}
