//! One analysis run: load -> resolve/extract -> derive -> render/export.
//!
//! The topology (node, topics, instance counts, colour source) comes from `PipelineConfig`,
//! so the timer plot and the time chart are produced by the same code for any node.

use std::path::{Path, PathBuf};

use log::info;

use crate::analysis::{
    correlator::{self, CorrelationReport},
    intervals,
    series::{self, Anchor, BeginDurations, DeadlineBands, IntervalSeries, RelativeRange},
    stats::IntervalStats,
};
use crate::config::{ColourSource, PipelineConfig, SubscriptionSpec};
use crate::error::{AnalysisError, Result};
use crate::render;
use crate::trace::{Nanos, TimeRange, TraceSession};
use crate::utils::export;

/// Raw series of the configured topology, on the capture clock.
#[derive(Debug, Clone)]
pub struct TopologySeries {
    pub subscriptions: Vec<(SubscriptionSpec, Vec<Nanos>)>,
    pub timer: Vec<TimeRange>,
    pub publications: CorrelationReport,
}

/// Data of the timer period/duration plot.
#[derive(Debug, Clone)]
pub struct TimerPlot {
    pub intervals: IntervalSeries,
    pub durations: BeginDurations,
    pub stats: Option<IntervalStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Subscription,
    Timer,
    Publication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Kind(SeriesKind),
    /// Index of the timer instance band.
    Band(usize),
}

/// One labelled row of the time chart; either markers or ranges, in ms from the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label: String,
    pub kind: SeriesKind,
    pub markers: Vec<f64>,
    pub ranges: Vec<RelativeRange>,
    /// One per marker or range.
    pub colours: Vec<Colour>,
}

/// Rows ordered bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeChart {
    pub rows: Vec<ChartRow>,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub artifacts: Vec<PathBuf>,
    pub stats: Option<IntervalStats>,
    pub collisions: usize,
}

/// Extracts subscription, timer and publication series for the configured node.
pub fn extract(session: &TraceSession, config: &PipelineConfig) -> Result<TopologySeries> {
    let mut subscriptions = Vec::with_capacity(config.subscriptions.len());
    for spec in &config.subscriptions {
        let times = intervals::subscription_times(session, &spec.topic, Some(&config.node))?;
        info!("{} <- {}: {} callbacks", config.node, spec.topic, times.len());
        subscriptions.push((spec.clone(), times));
    }

    let timer = intervals::timer_ranges(session, &config.node)?;
    let publications = correlator::publish_times(session, &config.publisher_topic, config.strategy)?;

    Ok(TopologySeries { subscriptions, timer, publications })
}

/// Interval and duration series of a timer, measured from its first instance.
pub fn timer_plot(ranges: &[TimeRange]) -> Result<TimerPlot> {
    let (first, _) = intervals::span(ranges, "timer callback")?;
    let intervals = series::inter_arrival(ranges, first.begin);
    let durations = series::begins_durations(ranges, first.begin);
    if let Some(text) = intervals.describe(ranges) {
        println!("{}", text);
    }
    let stats = IntervalStats::compute(&intervals, &durations);
    Ok(TimerPlot { intervals, durations, stats })
}

fn window<T: Clone>(items: &[T], skip: usize, take: usize) -> Vec<T> {
    items.iter().skip(skip).take(take).cloned().collect()
}

/// Builds the pub/sub/timer chart from the first `instances` of every series.
pub fn time_chart(topology: &TopologySeries, config: &PipelineConfig) -> Result<TimeChart> {
    let n = config.instances;
    let subs: Vec<(String, Vec<f64>)> = topology
        .subscriptions
        .iter()
        .map(|(spec, times)| {
            let times: Vec<f64> = times.iter().map(|&t| t as f64).collect();
            (spec.label.clone(), window(&times, config.skip, n))
        })
        .collect();
    let timer = window(&topology.timer, config.skip, n + 1);
    let pubs = window(&topology.publications.instants, config.skip, n + 1);

    let mut marker_series: Vec<&[f64]> = subs.iter().map(|(_, t)| t.as_slice()).collect();
    marker_series.push(&pubs);
    let origin = series::reference_origin(&marker_series, &[timer.as_slice()])
        .ok_or(AnalysisError::EmptySeries("chart"))?;

    let timer_ms = series::relative_ranges_ms(&timer, origin);
    let pubs_ms = series::relative_ms(&pubs, origin);

    let bands = DeadlineBands::new(timer_ms.iter().map(|r| r.begin_ms).collect());
    let colours = |times: &[f64], kind: SeriesKind, anchor: Anchor| -> Result<Vec<Colour>> {
        match config.colour_source {
            ColourSource::Fixed => Ok(vec![Colour::Kind(kind); times.len()]),
            ColourSource::TimerBands => Ok(bands
                .assign(times, anchor)?
                .into_iter()
                .map(Colour::Band)
                .collect()),
        }
    };

    let mut rows = Vec::with_capacity(subs.len() + 2);
    rows.push(ChartRow {
        label: "pub.".into(),
        kind: SeriesKind::Publication,
        colours: colours(&pubs_ms, SeriesKind::Publication, Anchor::Previous)?,
        markers: pubs_ms,
        ranges: Vec::new(),
    });
    rows.push(ChartRow {
        label: "timer".into(),
        kind: SeriesKind::Timer,
        colours: match config.colour_source {
            ColourSource::Fixed => vec![Colour::Kind(SeriesKind::Timer); timer_ms.len()],
            ColourSource::TimerBands => (0..timer_ms.len()).map(Colour::Band).collect(),
        },
        markers: Vec::new(),
        ranges: timer_ms,
    });
    for (label, times) in subs.iter().rev() {
        let markers = series::relative_ms(times, origin);
        rows.push(ChartRow {
            label: label.clone(),
            kind: SeriesKind::Subscription,
            colours: colours(&markers, SeriesKind::Subscription, Anchor::Next)?,
            markers,
            ranges: Vec::new(),
        });
    }

    Ok(TimeChart { rows })
}

/// Full run over one trace directory.
pub fn run(trace_dir: &Path, config: &PipelineConfig) -> Result<AnalysisReport> {
    let session = TraceSession::load(trace_dir)?;
    let topology = extract(&session, config)?;

    let plot = timer_plot(&topology.timer)?;
    if let Some(stats) = &plot.stats {
        stats.print(&config.node);
    }
    let chart = time_chart(&topology, config)?;

    let mut artifacts = render::render_all(trace_dir, &config.prefix, &plot, &chart, &config.render)?;
    artifacts.extend(export::export_timer_series(trace_dir, &config.prefix, &plot)?);

    for path in &artifacts {
        info!("Wrote {}", path.display());
    }

    Ok(AnalysisReport {
        artifacts,
        stats: plot.stats,
        collisions: topology.publications.collisions.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Nanos = 1_000_000;

    fn topology() -> TopologySeries {
        let spec = |i: usize| SubscriptionSpec { topic: format!("/T{i}"), label: format!("sub. {i}") };
        TopologySeries {
            subscriptions: vec![
                (spec(1), vec![5 * MS, 105 * MS, 205 * MS, 305 * MS, 405 * MS]),
                (spec(2), vec![50 * MS, 150 * MS, 250 * MS, 350 * MS, 450 * MS]),
            ],
            timer: (0..6)
                .map(|k| TimeRange { begin: (10 + 100 * k) * MS, end: (12 + 100 * k) * MS, duration: 2 * MS })
                .collect(),
            publications: CorrelationReport {
                instants: (0..6).map(|k| ((11 + 100 * k) * MS) as f64).collect(),
                collisions: Vec::new(),
            },
        }
    }

    fn config(source: ColourSource) -> PipelineConfig {
        PipelineConfig { colour_source: source, ..PipelineConfig::default() }
    }

    #[test]
    fn rows_are_bottom_to_top() {
        let chart = time_chart(&topology(), &config(ColourSource::Fixed)).unwrap();
        let labels: Vec<_> = chart.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["pub.", "timer", "sub. 2", "sub. 1"]);
    }

    #[test]
    fn series_truncated_and_relative_to_joint_origin() {
        let chart = time_chart(&topology(), &config(ColourSource::Fixed)).unwrap();
        let sub1 = &chart.rows[3];
        assert_eq!(sub1.markers, vec![0.0, 100.0, 200.0, 300.0]);
        let timer = &chart.rows[1];
        assert_eq!(timer.ranges.len(), 5);
        assert_eq!(timer.ranges[0], RelativeRange { begin_ms: 5.0, end_ms: 7.0, duration_ms: 2.0 });
        assert_eq!(chart.rows[0].markers.len(), 5);
        assert_eq!(chart.rows[0].colours, vec![Colour::Kind(SeriesKind::Publication); 5]);
    }

    #[test]
    fn skip_offsets_every_row() {
        let cfg = PipelineConfig { skip: 1, instances: 2, ..PipelineConfig::default() };
        let chart = time_chart(&topology(), &cfg).unwrap();
        // Origin becomes the first kept subscription (105 ms).
        assert_eq!(chart.rows[3].markers, vec![0.0, 100.0]);
        assert_eq!(chart.rows[1].ranges.len(), 3);
    }

    #[test]
    fn timer_bands_colour_feeding_and_resulting_events() {
        let chart = time_chart(&topology(), &config(ColourSource::TimerBands)).unwrap();
        // sub. 1 at 5, 105, 205, 305 ms feeds timer starts 10, 110, 210, 310.
        assert_eq!(chart.rows[3].colours, (0..4).map(Colour::Band).collect::<Vec<_>>());
        // Publications one ms after each timer start result from it.
        assert_eq!(chart.rows[0].colours, (0..5).map(Colour::Band).collect::<Vec<_>>());
        assert_eq!(chart.rows[1].colours[4], Colour::Band(4));
    }

    #[test]
    fn timer_bands_fail_outside_deadlines() {
        let mut t = topology();
        // A publication before the first timer start cannot result from it.
        t.publications.instants[0] = 0.0;
        let err = time_chart(&t, &config(ColourSource::TimerBands)).unwrap_err();
        assert!(matches!(err, AnalysisError::NoMatchingBand { .. }));
    }

    #[test]
    fn timer_plot_needs_instances() {
        assert!(matches!(timer_plot(&[]), Err(AnalysisError::EmptySeries(_))));
        let plot = timer_plot(&topology().timer).unwrap();
        assert_eq!(plot.intervals.periods_ms, vec![100.0; 5]);
        assert_eq!(plot.durations.durations_ms, vec![2.0; 6]);
        assert!(plot.stats.is_some());
    }
}
