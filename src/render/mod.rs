//! Chart Renderer: timer plot and time chart as PNG, SVG (plotters) and HTML (plotly).
//!
//! Artifacts land beside the trace: `<trace-dir>/<prefix>_timer.<ext>` and
//! `<trace-dir>/<prefix>_time_chart.<ext>`.
//!
//! plotters is built without a font renderer, so PNGs carry no text: the SVG backend
//! writes text elements itself, the bitmap backend would have to rasterize them.

pub mod html;
pub mod time_chart;
pub mod timer_chart;

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::analysis::pipeline::{Colour, SeriesKind, TimeChart, TimerPlot};
use crate::config::RenderOptions;
use crate::error::{AnalysisError, Result};

pub const TIMER_TITLE: &str = "Timer callback interval and duration over time";
pub const CHART_TITLE: &str = "Message reception & publication and timer execution";

pub const INTERVAL_RGB: (u8, u8, u8) = (0, 0, 255);
pub const DURATION_RGB: (u8, u8, u8) = (255, 0, 0);

/// RGB of a chart colour; bands cycle through a 99-colour palette.
pub fn rgb(colour: Colour) -> (u8, u8, u8) {
    match colour {
        Colour::Kind(SeriesKind::Subscription) => (255, 0, 0),
        Colour::Kind(SeriesKind::Timer) => (0, 0, 255),
        Colour::Kind(SeriesKind::Publication) => (0, 128, 0),
        Colour::Band(i) => Palette99::pick(i).rgb(),
    }
}

fn artifact(trace_dir: &Path, prefix: &str, name: &str, ext: &str) -> PathBuf {
    trace_dir.join(format!("{}_{}.{}", prefix, name, ext))
}

pub(crate) fn render_error(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Render(e.to_string())
}

/// Writes every enabled artifact and returns their paths.
pub fn render_all(
    trace_dir: &Path,
    prefix: &str,
    plot: &TimerPlot,
    chart: &TimeChart,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    let size = (options.width, options.height);
    let mut written = Vec::new();

    if options.png {
        let path = artifact(trace_dir, prefix, "timer", "png");
        timer_chart::draw(BitMapBackend::new(&path, size).into_drawing_area(), plot, options, false)?;
        written.push(path);

        let path = artifact(trace_dir, prefix, "time_chart", "png");
        time_chart::draw(BitMapBackend::new(&path, size).into_drawing_area(), chart, options, false)?;
        written.push(path);
    }

    if options.svg {
        let path = artifact(trace_dir, prefix, "timer", "svg");
        timer_chart::draw(SVGBackend::new(&path, size).into_drawing_area(), plot, options, true)?;
        written.push(path);

        let path = artifact(trace_dir, prefix, "time_chart", "svg");
        time_chart::draw(SVGBackend::new(&path, size).into_drawing_area(), chart, options, true)?;
        written.push(path);
    }

    if options.html {
        let path = artifact(trace_dir, prefix, "timer", "html");
        html::write_timer(&path, plot, options)?;
        written.push(path);

        let path = artifact(trace_dir, prefix, "time_chart", "html");
        html::write_time_chart(&path, chart, options)?;
        written.push(path);
    }

    Ok(written)
}

/// Axis bounds with a little headroom; degenerate or empty data gets a unit span.
pub(crate) fn padded_bounds<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = (max - min).max(1e-6);
    (min - span * 0.05, max + span * 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_and_handle_empty() {
        assert_eq!(padded_bounds(&[] as &[f64]), (0.0, 1.0));
        let (lo, hi) = padded_bounds(&[10.0, 20.0]);
        assert!(lo < 10.0 && hi > 20.0);
        let (lo, hi) = padded_bounds(&[3.0]);
        assert!(lo < 3.0 && hi > 3.0);
    }

    fn timer_plot() -> TimerPlot {
        use crate::analysis::series::{BeginDurations, IntervalSeries};
        TimerPlot {
            intervals: IntervalSeries {
                times_s: vec![0.1, 0.2],
                periods_ms: vec![100.0, 101.0],
                max_gap: None,
            },
            durations: BeginDurations {
                times_s: vec![0.0, 0.1, 0.2],
                durations_ms: vec![1.0, 2.0, 1.5],
            },
            stats: None,
        }
    }

    fn time_chart() -> TimeChart {
        use crate::analysis::{pipeline::ChartRow, series::RelativeRange};
        TimeChart {
            rows: vec![
                ChartRow {
                    label: "timer".into(),
                    kind: SeriesKind::Timer,
                    markers: Vec::new(),
                    ranges: vec![RelativeRange { begin_ms: 5.0, end_ms: 7.0, duration_ms: 2.0 }],
                    colours: vec![Colour::Band(0)],
                },
                ChartRow {
                    label: "sub. 1".into(),
                    kind: SeriesKind::Subscription,
                    markers: vec![0.0, 100.0],
                    ranges: Vec::new(),
                    colours: vec![Colour::Kind(SeriesKind::Subscription); 2],
                },
            ],
        }
    }

    #[test]
    fn bitmap_charts_draw_without_text() {
        let options = RenderOptions { include_title: true, ..RenderOptions::default() };
        let (w, h) = (320u32, 240u32);
        let mut buf = vec![0u8; (w * h * 3) as usize];

        let area = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        timer_chart::draw(area, &timer_plot(), &options, false).unwrap();
        assert!(buf.iter().any(|&b| b != 255), "nothing drawn");

        let area = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        time_chart::draw(area, &time_chart(), &options, false).unwrap();
    }

    #[test]
    fn svg_charts_keep_titles_and_row_names() {
        let options = RenderOptions { include_title: true, ..RenderOptions::default() };
        let mut svg = String::new();
        let area = SVGBackend::with_string(&mut svg, (320, 240)).into_drawing_area();
        time_chart::draw(area, &time_chart(), &options, true).unwrap();
        assert!(svg.contains("Message reception"));
        assert!(svg.contains("sub. 1"));
        assert!(svg.contains("time (ms)"));
    }

    #[test]
    fn fixed_colours_per_kind() {
        assert_eq!(rgb(Colour::Kind(SeriesKind::Timer)), INTERVAL_RGB);
        assert_ne!(rgb(Colour::Band(0)), rgb(Colour::Band(1)));
    }
}
