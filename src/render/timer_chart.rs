//! Timer plot: callback interval (left axis) and duration (right axis) against time.
//!
//! With `labels` off nothing is drawn as text (no caption, descriptions or tick labels);
//! backends without a font renderer need that.

use std::error::Error;

use plotters::{coord::Shift, prelude::*};

use crate::analysis::pipeline::TimerPlot;
use crate::config::RenderOptions;
use crate::error::Result;
use crate::render::{DURATION_RGB, INTERVAL_RGB, TIMER_TITLE, padded_bounds, render_error};

pub fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    plot: &TimerPlot,
    options: &RenderOptions,
    labels: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    draw_on(&root, plot, options, labels).map_err(render_error)
}

fn draw_on<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &TimerPlot,
    options: &RenderOptions,
    labels: bool,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let interval_colour = RGBColor(INTERVAL_RGB.0, INTERVAL_RGB.1, INTERVAL_RGB.2);
    let duration_colour = RGBColor(DURATION_RGB.0, DURATION_RGB.1, DURATION_RGB.2);

    let (_, x_max) = padded_bounds(plot.durations.times_s.iter().chain(&plot.intervals.times_s));
    let x_range = 0f64..x_max.max(1e-3);
    let (p_lo, p_hi) = padded_bounds(&plot.intervals.periods_ms);
    let (d_lo, d_hi) = padded_bounds(&plot.durations.durations_ms);

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60);
    if labels && options.include_title {
        builder.caption(TIMER_TITLE, ("serif", 20));
    }

    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), p_lo..p_hi)?
        .set_secondary_coord(x_range, d_lo..d_hi);

    if labels {
        chart
            .configure_mesh()
            .x_desc("time (s)")
            .y_desc("callback interval (ms)")
            .y_label_style(("serif", 14).into_font().color(&interval_colour))
            .draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("callback duration (ms)")
            .label_style(("serif", 14).into_font().color(&duration_colour))
            .draw()?;
    } else {
        chart.configure_mesh().x_labels(0).y_labels(0).draw()?;
        chart.configure_secondary_axes().x_labels(0).y_labels(0).draw()?;
    }

    chart.draw_series(
        plot.intervals
            .times_s
            .iter()
            .zip(&plot.intervals.periods_ms)
            .map(|(&x, &y)| Circle::new((x, y), 2, interval_colour.filled())),
    )?;
    chart.draw_secondary_series(
        plot.durations
            .times_s
            .iter()
            .zip(&plot.durations.durations_ms)
            .map(|(&x, &y)| Circle::new((x, y), 2, duration_colour.filled())),
    )?;

    root.present()?;
    Ok(())
}
