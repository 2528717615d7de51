//! CSV export of the derived timer series, written beside the charts.
//!
//! - `<prefix>_timer.csv` — `time_s, period_ms` (one row per interval).
//! - `<prefix>_durations.csv` — `time_s, duration_ms` (one row per instance).
//! - `<prefix>_timer_stats.csv` — one summary row, only when there is at least one interval.

use std::path::{Path, PathBuf};

use csv::Writer;
use log::{debug, info};
use serde::Serialize;

use crate::analysis::pipeline::TimerPlot;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct PeriodRow {
    time_s: f64,
    period_ms: f64,
}

#[derive(Debug, Serialize)]
struct DurationRow {
    time_s: f64,
    duration_ms: f64,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut wtr = Writer::from_path(path)?;
    let mut count = 0;
    for row in rows {
        wtr.serialize(row)?;
        count += 1;
    }
    wtr.flush()?;
    debug!("{}: {} rows", path.display(), count);
    Ok(count)
}

/// Writes the period, duration and summary tables and returns their paths.
pub fn export_timer_series(trace_dir: &Path, prefix: &str, plot: &TimerPlot) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(3);

    let path = trace_dir.join(format!("{}_timer.csv", prefix));
    write_rows(
        &path,
        plot.intervals
            .times_s
            .iter()
            .zip(&plot.intervals.periods_ms)
            .map(|(&time_s, &period_ms)| PeriodRow { time_s, period_ms }),
    )?;
    written.push(path);

    let path = trace_dir.join(format!("{}_durations.csv", prefix));
    write_rows(
        &path,
        plot.durations
            .times_s
            .iter()
            .zip(&plot.durations.durations_ms)
            .map(|(&time_s, &duration_ms)| DurationRow { time_s, duration_ms }),
    )?;
    written.push(path);

    if let Some(stats) = &plot.stats {
        let path = trace_dir.join(format!("{}_timer_stats.csv", prefix));
        write_rows(&path, [stats])?;
        written.push(path);
    }

    info!("Exported {} timer tables to {}", written.len(), trace_dir.display());
    Ok(written)
}
