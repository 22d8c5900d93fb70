//! Domain extents → pixel-space scales.

use super::normalize::PlotPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of ticks a single call may produce.
const MAX_TICKS: usize = 1000;

// ─── Margin ──────────────────────────────────────────────────────────────────

/// Insets between the container edge and the plotting area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Margins the dashboard chart uses.
pub const CHART_MARGIN: Margin = Margin {
    top: 20.0,
    right: 0.0,
    bottom: 20.0,
    left: 0.0,
};

impl Default for Margin {
    fn default() -> Self {
        CHART_MARGIN
    }
}

// ─── LinearScale ─────────────────────────────────────────────────────────────

/// Monotonic linear map from `domain` to `range`.
///
/// A degenerate domain (`min == max`) is widened to `[min, min + 1]` so that
/// mapping never divides by zero. Ranges may be inverted (`low > high`), which
/// is how the y axis grows upward on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (d0, d1) = domain;
        let domain = if d0 == d1 { (d0, d0 + 1.0) } else { domain };
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Domain value → pixel.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Pixel → domain value. A zero-width range maps everything to the
    /// domain's lower bound.
    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return d0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Roughly `count` evenly spaced round values inside the domain, for axis
    /// labels. Steps are 1, 2 or 5 times a power of ten.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if count == 0 || !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }

        let raw_step = (hi - lo) / count as f64;
        let power = raw_step.log10().floor();
        let error = raw_step / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        // Fractional steps divide by the inverse so that 0.1 * 3 prints as 0.3.
        let fractional = power < 0.0;
        let step = factor * 10f64.powf(power);
        let inverse = 10f64.powf(-power) / factor;
        let (first, last) = if fractional {
            ((lo * inverse).ceil(), (hi * inverse).floor())
        } else {
            ((lo / step).ceil(), (hi / step).floor())
        };

        if !first.is_finite() || !last.is_finite() || last < first {
            return Vec::new();
        }
        let n = ((last - first) as usize + 1).min(MAX_TICKS);
        (0..n)
            .map(|k| {
                let i = first + k as f64;
                if fractional {
                    i / inverse
                } else {
                    i * step
                }
            })
            .collect()
    }
}

// ─── TimeScale ───────────────────────────────────────────────────────────────

/// Linear map from UTC time to pixels, at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    /// A degenerate domain is widened by one millisecond.
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        let millis = (
            domain.0.timestamp_millis() as f64,
            domain.1.timestamp_millis() as f64,
        );
        Self {
            inner: LinearScale::new(millis, range),
        }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let (d0, d1) = self.inner.domain();
        (from_millis(d0), from_millis(d1))
    }

    pub fn range(&self) -> (f64, f64) {
        self.inner.range()
    }

    pub fn map(&self, time: DateTime<Utc>) -> f64 {
        self.inner.map(time.timestamp_millis() as f64)
    }

    /// `None` if the pixel lies so far out that the time is unrepresentable.
    pub fn invert(&self, pixel: f64) -> Option<DateTime<Utc>> {
        let millis = self.inner.invert(pixel).round();
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }
}

fn from_millis(millis: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis as i64).unwrap_or_default()
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// The two scales of one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScales {
    pub x: TimeScale,
    pub y: LinearScale,
}

impl ChartScales {
    /// Pixel position of a point.
    pub fn project(&self, point: &PlotPoint) -> (f64, f64) {
        (self.x.map(point.timestamp), self.y.map(point.close_value))
    }
}

/// `(min, max)` of `values`, or `None` if there are none.
pub fn extent<T: PartialOrd + Copy>(values: impl IntoIterator<Item = T>) -> Option<(T, T)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((
            if v < lo { v } else { lo },
            if v > hi { v } else { hi },
        )),
    })
}

/// Scales for `points` in a `width × height` container with [`CHART_MARGIN`].
/// Returns `None` when there is nothing to plot.
pub fn build(points: &[PlotPoint], width: f64, height: f64) -> Option<ChartScales> {
    build_with_margin(points, width, height, CHART_MARGIN)
}

pub fn build_with_margin(
    points: &[PlotPoint],
    width: f64,
    height: f64,
    margin: Margin,
) -> Option<ChartScales> {
    let time = extent(points.iter().map(|p| p.timestamp))?;
    let value = extent(points.iter().map(|p| p.close_value))?;
    Some(ChartScales {
        x: TimeScale::new(time, (margin.left, width - margin.right)),
        y: LinearScale::new(value, (height - margin.bottom, margin.top)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32, close: f64) -> PlotPoint {
        PlotPoint::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(), close)
    }

    #[test]
    fn test_value_axis_maps_to_inverted_range() {
        let scales = build(&[at(0, 10.0), at(1, 20.0)], 200.0, 100.0).unwrap();
        assert_eq!(scales.y.map(10.0), 80.0);
        assert_eq!(scales.y.map(20.0), 20.0);
        assert_eq!(scales.y.range(), (80.0, 20.0));
    }

    #[test]
    fn test_time_axis_spans_width() {
        let scales = build(&[at(1, 1.0), at(0, 2.0), at(2, 3.0)], 200.0, 100.0).unwrap();
        assert_eq!(scales.x.map(at(0, 0.0).timestamp), 0.0);
        assert_eq!(scales.x.map(at(2, 0.0).timestamp), 200.0);
        assert_eq!(scales.x.map(at(1, 0.0).timestamp), 100.0);
        assert_eq!(scales.x.domain(), (at(0, 0.0).timestamp, at(2, 0.0).timestamp));
    }

    #[test]
    fn test_empty_input_has_no_scales() {
        assert_eq!(build(&[], 200.0, 100.0), None);
    }

    #[test]
    fn test_degenerate_domains_are_widened() {
        let scales = build(&[at(0, 10.0), at(0, 10.0)], 200.0, 100.0).unwrap();
        assert_eq!(scales.y.domain(), (10.0, 11.0));
        assert_eq!(scales.y.map(10.0), 80.0);
        assert!(scales.x.map(at(0, 0.0).timestamp).is_finite());

        let (start, end) = scales.x.domain();
        assert_eq!((end - start).num_milliseconds(), 1);
    }

    #[test]
    fn test_tiny_prices_keep_their_domain() {
        let scale = LinearScale::new((0.000012, 0.000013), (80.0, 20.0));
        assert_eq!(scale.domain(), (0.000012, 0.000013));
        assert_eq!(scale.map(0.000012), 80.0);
    }

    #[test]
    fn test_invert_is_inverse_of_map() {
        let scale = LinearScale::new((10.0, 20.0), (80.0, 20.0));
        assert_eq!(scale.invert(80.0), 10.0);
        assert_eq!(scale.invert(20.0), 20.0);
        assert_eq!(scale.invert(50.0), 15.0);

        let scales = build(&[at(0, 1.0), at(10, 2.0)], 600.0, 100.0).unwrap();
        assert_eq!(scales.x.invert(300.0), Some(at(5, 0.0).timestamp));
    }

    #[test]
    fn test_ticks() {
        let scale = LinearScale::new((10.0, 20.0), (0.0, 1.0));
        assert_eq!(scale.ticks(5), vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);

        let unit = LinearScale::new((0.0, 1.0), (0.0, 1.0));
        assert_eq!(unit.ticks(5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);

        let wide = LinearScale::new((0.0, 1000.0), (0.0, 1.0));
        assert_eq!(wide.ticks(4), vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0]);

        assert!(scale.ticks(0).is_empty());
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent([3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }
}
