//! Derived Series Builder: interval, begin/duration and deadline-band series for charts.
//!
//! All series that are plotted together share one reference origin, the earliest
//! timestamp across all of them.

use crate::error::{AnalysisError, Result};
use crate::trace::{Nanos, TimeRange, model::{NANOS_PER_MS, NANOS_PER_SEC}};

/// The largest gap between consecutive starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxGap {
    pub value_ms: f64,
    /// Start of the later instance, on the capture clock (ns).
    pub absolute_ns: f64,
    pub offset_s: f64,
    /// Interval index; the callback index is one more.
    pub index: usize,
}

/// Gaps between consecutive starts, placed at the later start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSeries {
    pub times_s: Vec<f64>,
    pub periods_ms: Vec<f64>,
    pub max_gap: Option<MaxGap>,
}

/// Start offsets paired with durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeginDurations {
    pub times_s: Vec<f64>,
    pub durations_ms: Vec<f64>,
}

/// A time range relative to the reference origin, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeRange {
    pub begin_ms: f64,
    pub end_ms: f64,
    pub duration_ms: f64,
}

/// N ranges -> N-1 (offset from origin in s, gap to previous start in ms).
pub fn inter_arrival(ranges: &[TimeRange], origin: Nanos) -> IntervalSeries {
    let mut series = IntervalSeries::default();

    for (i, pair) in ranges.windows(2).enumerate() {
        let offset_s = (pair[1].begin - origin) as f64 / NANOS_PER_SEC;
        let gap_ms = (pair[1].begin - pair[0].begin) as f64 / NANOS_PER_MS;
        series.times_s.push(offset_s);
        series.periods_ms.push(gap_ms);

        // Strict comparison: the first of equal maxima is kept.
        if series.max_gap.is_none_or(|m| gap_ms > m.value_ms) {
            series.max_gap = Some(MaxGap {
                value_ms: gap_ms,
                absolute_ns: pair[1].begin as f64,
                offset_s,
                index: i,
            });
        }
    }
    series
}

impl IntervalSeries {
    /// Diagnostic lines for the highest interval, `None` when fewer than two ranges.
    pub fn describe(&self, ranges: &[TimeRange]) -> Option<String> {
        let (first, last, gap) = (ranges.first()?, ranges.last()?, self.max_gap?);
        Some(format!(
            "Time intervals between: {} - {}\nHighest timer callback interval of {} ms at {} or {} s (interval index={}, callback index={})",
            first.begin,
            last.end,
            gap.value_ms,
            gap.absolute_ns,
            gap.offset_s,
            gap.index,
            gap.index + 1
        ))
    }
}

/// Each range as (offset from origin in s, duration in ms).
pub fn begins_durations(ranges: &[TimeRange], origin: Nanos) -> BeginDurations {
    BeginDurations {
        times_s: ranges
            .iter()
            .map(|r| (r.begin - origin) as f64 / NANOS_PER_SEC)
            .collect(),
        durations_ms: ranges
            .iter()
            .map(|r| r.duration as f64 / NANOS_PER_MS)
            .collect(),
    }
}

/// Earliest timestamp across marker series and range series.
pub fn reference_origin(times: &[&[f64]], ranges: &[&[TimeRange]]) -> Option<f64> {
    times
        .iter()
        .flat_map(|s| s.iter().copied())
        .chain(ranges.iter().flat_map(|s| s.iter().map(|r| r.begin as f64)))
        .reduce(f64::min)
}

/// Converts instants (ns) to milliseconds from `origin`.
pub fn relative_ms(times: &[f64], origin: f64) -> Vec<f64> {
    times.iter().map(|t| (t - origin) / NANOS_PER_MS).collect()
}

/// Converts ranges to milliseconds from `origin`; durations are only rescaled.
pub fn relative_ranges_ms(ranges: &[TimeRange], origin: f64) -> Vec<RelativeRange> {
    ranges
        .iter()
        .map(|r| RelativeRange {
            begin_ms: (r.begin as f64 - origin) / NANOS_PER_MS,
            end_ms: (r.end as f64 - origin) / NANOS_PER_MS,
            duration_ms: r.duration as f64 / NANOS_PER_MS,
        })
        .collect()
}

/// Which deadline a timestamp is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The next deadline at or after it: bands `(d[i-1], d[i]]`, first band open below.
    Next,
    /// The previous deadline at or before it: bands `[d[i], d[i+1])`, last band open above.
    Previous,
}

impl Anchor {
    pub fn from_pre(pre: bool) -> Self {
        if pre { Anchor::Next } else { Anchor::Previous }
    }
}

/// Ordered deadlines, each identifying one colour band.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadlineBands {
    deadlines: Vec<f64>,
}

impl DeadlineBands {
    /// `deadlines` must be sorted ascending.
    pub fn new(deadlines: Vec<f64>) -> Self {
        debug_assert!(deadlines.windows(2).all(|w| w[0] <= w[1]));
        Self { deadlines }
    }

    /// Band (colour index) containing `t`.
    pub fn band(&self, t: f64, anchor: Anchor) -> Result<usize> {
        let d = &self.deadlines;
        let last = d.len().checked_sub(1);

        let found = (0..d.len()).find(|&i| match anchor {
            Anchor::Next => {
                let lower = if i == 0 { f64::NEG_INFINITY } else { d[i - 1] };
                lower < t && t <= d[i]
            }
            Anchor::Previous => {
                let upper = if Some(i) == last { f64::INFINITY } else { d[i + 1] };
                d[i] <= t && t < upper
            }
        });

        found.ok_or(AnalysisError::NoMatchingBand {
            timestamp: t,
            deadlines: d.len(),
        })
    }

    pub fn assign(&self, times: &[f64], anchor: Anchor) -> Result<Vec<usize>> {
        times.iter().map(|&t| self.band(t, anchor)).collect()
    }
}
