//! Summary statistics of timer jitter: period and callback duration distributions.

use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Median, Min, OrderStatistics};

use crate::analysis::series::{BeginDurations, IntervalSeries};

/// Period/duration summary for one timer, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalStats {
    pub count: usize,
    pub period_mean_ms: f64,
    pub period_std_dev_ms: f64,
    pub period_min_ms: f64,
    pub period_max_ms: f64,
    pub period_median_ms: f64,
    pub period_p95_ms: f64,
    pub period_p99_ms: f64,
    pub duration_mean_ms: f64,
    pub duration_max_ms: f64,
}

impl IntervalStats {
    /// `None` without at least one interval.
    pub fn compute(intervals: &IntervalSeries, durations: &BeginDurations) -> Option<Self> {
        if intervals.periods_ms.is_empty() {
            return None;
        }

        let mut periods = Data::new(intervals.periods_ms.clone());
        let durs = Data::new(durations.durations_ms.clone());

        Some(Self {
            count: intervals.periods_ms.len(),
            period_mean_ms: periods.mean().unwrap_or(0.0),
            // Undefined for a single sample.
            period_std_dev_ms: periods.std_dev().unwrap_or(0.0),
            period_min_ms: periods.min(),
            period_max_ms: periods.max(),
            period_median_ms: periods.median(),
            period_p95_ms: periods.percentile(95),
            period_p99_ms: periods.percentile(99),
            duration_mean_ms: durs.mean().unwrap_or(0.0),
            duration_max_ms: if durations.durations_ms.is_empty() { 0.0 } else { durs.max() },
        })
    }

    pub fn print(&self, label: &str) {
        println!("{} timer ({} intervals)", label, self.count);
        println!("  Period Mean:     {:.3} ms", self.period_mean_ms);
        println!("  Period Std Dev:  {:.3} ms", self.period_std_dev_ms);
        println!("  Period Min/Max:  {:.3} / {:.3} ms", self.period_min_ms, self.period_max_ms);
        println!("  Period Median:   {:.3} ms", self.period_median_ms);
        println!("  Period P95/P99:  {:.3} / {:.3} ms", self.period_p95_ms, self.period_p99_ms);
        println!("  Duration Mean:   {:.3} ms", self.duration_mean_ms);
        println!("  Duration Max:    {:.3} ms", self.duration_max_ms);
    }
}
