//! Time chart: one row per series, markers for instants and bars for timer ranges (ms).
//! Row names are tick labels, so with `labels` off the rows are only told apart by position.

use std::error::Error;

use plotters::{coord::Shift, prelude::*};

use crate::analysis::pipeline::TimeChart;
use crate::config::RenderOptions;
use crate::error::Result;
use crate::render::{CHART_TITLE, padded_bounds, render_error, rgb};

const MARKER_RADIUS: u32 = 6;
const BAR_HALF_HEIGHT: f64 = 0.2;

pub fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    chart: &TimeChart,
    options: &RenderOptions,
    labels: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    draw_on(&root, chart, options, labels).map_err(render_error)
}

fn draw_on<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &TimeChart,
    options: &RenderOptions,
    labels: bool,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let names: Vec<&str> = chart.rows.iter().map(|r| r.label.as_str()).collect();
    let rows = names.len().max(1);

    let xs: Vec<f64> = chart
        .rows
        .iter()
        .flat_map(|r| {
            r.markers
                .iter()
                .copied()
                .chain(r.ranges.iter().flat_map(|g| [g.begin_ms, g.end_ms]))
        })
        .collect();
    let (x_lo, x_hi) = padded_bounds(&xs);

    let mut builder = ChartBuilder::on(root);
    builder.margin(15).x_label_area_size(40).y_label_area_size(80);
    if labels && options.include_title {
        builder.caption(CHART_TITLE, ("serif", 20));
    }
    let mut ctx = builder.build_cartesian_2d(x_lo..x_hi, -0.5f64..(rows as f64 - 0.5))?;

    let row_label = |y: &f64| {
        let i = y.round();
        if (y - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < names.len() {
            names[i as usize].to_string()
        } else {
            String::new()
        }
    };
    if labels {
        ctx.configure_mesh()
            .x_desc("time (ms)")
            .y_labels(rows)
            .y_label_formatter(&row_label)
            .draw()?;
    } else {
        ctx.configure_mesh().x_labels(0).y_labels(0).draw()?;
    }

    for (i, row) in chart.rows.iter().enumerate() {
        let y = i as f64;
        let colour_at = |k: usize| {
            let (r, g, b) = row.colours.get(k).map(|c| rgb(*c)).unwrap_or((0, 0, 0));
            RGBColor(r, g, b)
        };

        ctx.draw_series(row.ranges.iter().enumerate().map(|(k, g)| {
            Rectangle::new(
                [(g.begin_ms, y - BAR_HALF_HEIGHT), (g.end_ms, y + BAR_HALF_HEIGHT)],
                colour_at(k).filled(),
            )
        }))?;
        ctx.draw_series(
            row.markers
                .iter()
                .enumerate()
                .map(|(k, &x)| Circle::new((x, y), MARKER_RADIUS, colour_at(k).filled())),
        )?;
    }

    root.present()?;
    Ok(())
}
