use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::stats::summary;
use super::timeline::TimelinePanel;
use super::{Comparison, CHART_TITLE, Y_AXIS_LABEL};
use crate::error::{BenchError, BenchResult};

const PANEL_WIDTH: u32 = 250;
const PANEL_HEIGHT: u32 = 500;
const BOX_HALF_WIDTH: f64 = 0.3;

/// Box fill colours, cycled over the inputs
const PALETTE: [RGBColor; 4] = [
    RGBColor(30, 144, 255),
    RGBColor(220, 20, 60),
    RGBColor(46, 139, 87),
    RGBColor(255, 140, 0),
];

fn chart_err<E: std::fmt::Display>(e: E) -> BenchError {
    BenchError::Chart(e.to_string())
}

fn titled_root<'a>(
    path: &'a Path,
    panels: usize,
) -> BenchResult<DrawingArea<BitMapBackend<'a>, Shift>> {
    let width = PANEL_WIDTH * panels.max(1) as u32;
    let root = BitMapBackend::new(path, (width, PANEL_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    root.titled(CHART_TITLE, ("sans-serif", 20))
        .map_err(chart_err)
}

/// One panel per benchmark with a box per input
pub fn draw_comparison(path: &Path, comparison: &Comparison) -> BenchResult<()> {
    let body = titled_root(path, comparison.panels.len())?;
    let areas = body.split_evenly((1, comparison.panels.len().max(1)));

    for (panel, area) in comparison.panels.iter().zip(&areas) {
        let y_max = panel
            .samples
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
            .max(0.1)
            * 1.1;
        let x_max = comparison.inputs.len() as f64 - 0.5;

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.title, ("sans-serif", 13))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(45)
            .build_cartesian_2d(-0.5..x_max, 0.0..y_max)
            .map_err(chart_err)?;

        let inputs = &comparison.inputs;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(inputs.len())
            .x_label_formatter(&|x| {
                let i = x.round();
                if (x - i).abs() > 1e-6 || i < 0.0 {
                    return String::new();
                }
                inputs.get(i as usize).cloned().unwrap_or_default()
            })
            .y_desc(Y_AXIS_LABEL)
            .draw()
            .map_err(chart_err)?;

        for (i, sample) in panel.samples.iter().enumerate() {
            let Some(s) = summary(sample) else {
                continue;
            };
            let x = i as f64;
            let color = PALETTE[i % PALETTE.len()];
            let (left, right) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(left, s.p25), (right, s.p75)],
                    color.filled(),
                )))
                .map_err(chart_err)?;
            let lines = [
                vec![(left, s.p25), (right, s.p25), (right, s.p75), (left, s.p75), (left, s.p25)],
                vec![(x, s.min), (x, s.p25)],
                vec![(x, s.p75), (x, s.max)],
                vec![(x - BOX_HALF_WIDTH / 2.0, s.min), (x + BOX_HALF_WIDTH / 2.0, s.min)],
                vec![(x - BOX_HALF_WIDTH / 2.0, s.max), (x + BOX_HALF_WIDTH / 2.0, s.max)],
                vec![(left, s.mean), (right, s.mean)],
            ];
            chart
                .draw_series(
                    lines
                        .into_iter()
                        .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
                )
                .map_err(chart_err)?;
        }
    }

    body.present().map_err(chart_err)
}

/// One panel per image with a bar per node
pub fn draw_timeline(path: &Path, panels: &[TimelinePanel]) -> BenchResult<()> {
    let body = titled_root(path, panels.len())?;
    let areas = body.split_evenly((1, panels.len().max(1)));

    for (panel, area) in panels.iter().zip(&areas) {
        let x_max = panel.span().max(0.1) * 1.05;
        let y_max = panel.bars.len().max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.title, ("sans-serif", 13))
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(35)
            .build_cartesian_2d(0.0..x_max, 0.0..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(format!("{} | {}", Y_AXIS_LABEL, panel.caption))
            .y_desc("Node")
            .y_label_formatter(&|y| format!("{}", *y as usize))
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(panel.bars.iter().map(|bar| {
                let y = bar.rank as f64;
                Rectangle::new([(bar.start, y + 0.1), (bar.stop, y + 0.9)], PALETTE[0].filled())
            }))
            .map_err(chart_err)?;
    }

    body.present().map_err(chart_err)
}
