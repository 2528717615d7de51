//! Interactive HTML versions of both charts (plotly).

use std::{fs, path::Path};

use plotly::{
    Plot, Scatter,
    color::Rgb,
    common::{AxisSide, Line, Marker, Mode},
    layout::{Axis, Layout},
};

use crate::analysis::pipeline::{TimeChart, TimerPlot};
use crate::config::RenderOptions;
use crate::error::Result;
use crate::render::{CHART_TITLE, DURATION_RGB, INTERVAL_RGB, TIMER_TITLE, rgb};

fn to_rgb((r, g, b): (u8, u8, u8)) -> Rgb {
    Rgb::new(r, g, b)
}

fn base_layout(title: &str, options: &RenderOptions) -> Layout {
    let layout = Layout::new()
        .width(options.width as usize)
        .height(options.height as usize)
        .show_legend(false);
    if options.include_title { layout.title(title) } else { layout }
}

/// Period and duration on twin y axes.
pub fn write_timer(path: &Path, plot: &TimerPlot, options: &RenderOptions) -> Result<()> {
    let mut html = Plot::new();

    html.add_trace(
        Scatter::new(plot.intervals.times_s.clone(), plot.intervals.periods_ms.clone())
            .name("period")
            .mode(Mode::Markers)
            .marker(Marker::new().color(to_rgb(INTERVAL_RGB))),
    );
    html.add_trace(
        Scatter::new(plot.durations.times_s.clone(), plot.durations.durations_ms.clone())
            .name("duration")
            .mode(Mode::Markers)
            .marker(Marker::new().color(to_rgb(DURATION_RGB)))
            .y_axis("y2"),
    );

    let layout = base_layout(TIMER_TITLE, options)
        .x_axis(Axis::new().title("time (s)"))
        .y_axis(Axis::new().title("callback interval (ms)"))
        .y_axis2(
            Axis::new()
                .title("callback duration (ms)")
                .overlaying("y")
                .side(AxisSide::Right),
        );
    html.set_layout(layout);

    fs::write(path, html.to_html())?;
    Ok(())
}

/// Rows as categorical y values; timer ranges as thick horizontal segments.
pub fn write_time_chart(path: &Path, chart: &TimeChart, options: &RenderOptions) -> Result<()> {
    let mut html = Plot::new();

    for row in &chart.rows {
        let colours: Vec<Rgb> = row.colours.iter().map(|c| to_rgb(rgb(*c))).collect();

        for (range, colour) in row.ranges.iter().zip(&colours) {
            html.add_trace(
                Scatter::new(vec![range.begin_ms, range.end_ms], vec![row.label.clone(); 2])
                    .name(&row.label)
                    .mode(Mode::Lines)
                    .line(Line::new().width(20.0).color(colour.clone())),
            );
        }

        if !row.markers.is_empty() {
            html.add_trace(
                Scatter::new(row.markers.clone(), vec![row.label.clone(); row.markers.len()])
                    .name(&row.label)
                    .mode(Mode::Markers)
                    .marker(Marker::new().size(10).color_array(colours)),
            );
        }
    }

    // Categories stack in order of first appearance: rows are already bottom to top.
    let layout = base_layout(CHART_TITLE, options).x_axis(Axis::new().title("time (ms)"));
    html.set_layout(layout);

    fs::write(path, html.to_html())?;
    Ok(())
}
