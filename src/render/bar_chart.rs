//! Grouped bar charts rendered to PNG.
//!
//! Bars are drawn with [`plotters`] into an RGB buffer which is then encoded
//! with [`image`]. Clipped bars get a thin white band near their top, and
//! clipped or off-scale bars can be annotated with their true value.

use plotters::coord::combinators::WithKeyPoints;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::error::RenderError;
use crate::processing::outliers::ClippedChart;
use crate::render::axis::{axis_near_max, format_thousands, nice_ticks};
use crate::state::config::ChartParams;
use crate::state::series::SeriesSlot;

/// Width of one bar in category units; a group of three spans 0.75.
pub const BAR_WIDTH: f64 = 0.25;

const MAX_VALUE_TICKS: usize = 8;

/// Largest figure accepted, in pixels per side and in total.
const MAX_SIDE: u32 = 20_000;
const MAX_PIXELS: usize = 100_000_000;

/// What was drawn, for the run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub axis_near_max: f64,
    pub annotated: usize,
}

fn drawing_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Maps category rows and bar values onto chart coordinates for either
/// orientation. Horizontal charts list the first row at the top.
#[derive(Debug, Clone, Copy)]
struct Layout {
    vertical: bool,
    rows: usize,
}

impl Layout {
    fn position(&self, row: usize) -> f64 {
        if self.vertical {
            row as f64
        } else {
            (self.rows - 1 - row) as f64
        }
    }

    fn point(&self, position: f64, value: f64) -> (f64, f64) {
        if self.vertical {
            (position, value)
        } else {
            (value, position)
        }
    }

    /// Row shown at a category-axis position, if the position is a tick.
    fn row_at(&self, position: f64) -> Option<usize> {
        let rounded = position.round();
        if (position - rounded).abs() > 1e-6 || rounded < 0.0 {
            return None;
        }
        let idx = rounded as usize;
        if idx >= self.rows {
            return None;
        }
        Some(if self.vertical { idx } else { self.rows - 1 - idx })
    }

    fn category_range(&self) -> std::ops::Range<f64> {
        -0.5..(self.rows as f64 - 0.5)
    }

    /// Category axis with one tick per row.
    fn category_axis(&self) -> KeyAxis {
        KeyAxis(
            self.category_range()
                .with_key_points((0..self.rows).map(|i| i as f64).collect()),
        )
    }
}

/// Value axis from 0 to the last tick, labelled at exactly `ticks`.
fn value_axis(ticks: &[f64]) -> KeyAxis {
    let top = ticks.last().copied().unwrap_or(1.0);
    KeyAxis((0.0..top).with_key_points(ticks.to_vec()))
}

/// `WithKeyPoints<RangedCoordf64>` does not implement `ValueFormatter`, which
/// `configure_mesh` requires; this wrapper delegates everything and opts into
/// default formatting (every axis gets an explicit label formatter anyway).
struct KeyAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for KeyAxis {
    type FormatOption = plotters::coord::ranged1d::DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: plotters::coord::ranged1d::KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// Length of the RGB buffer for a figure, if the figure is small enough.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
        return None;
    }
    (width as usize)
        .checked_mul(height as usize)
        .filter(|pixels| *pixels <= MAX_PIXELS)
        .and_then(|pixels| pixels.checked_mul(3))
}

/// Render one sheet to `output` as a PNG image.
pub fn render_sheet(
    chart: &ClippedChart,
    periods: &[String; 3],
    params: &ChartParams,
    output: &Path,
) -> Result<RenderedChart, RenderError> {
    let (width, height) = params.pixel_size();
    let len = buffer_len(width, height)
        .filter(|_| !chart.is_empty())
        .ok_or(RenderError::InvalidSize { width, height })?;

    let mut buffer = vec![0u8; len];
    let rendered = draw(&mut buffer, (width, height), chart, periods, params)?;

    let img = image::RgbImage::from_raw(width, height, buffer)
        .ok_or(RenderError::InvalidSize { width, height })?;
    img.save(output)?;
    tracing::info!("Saved chart to {:?}", output);
    Ok(rendered)
}

fn draw(
    buffer: &mut [u8],
    size: (u32, u32),
    chart: &ClippedChart,
    periods: &[String; 3],
    params: &ChartParams,
) -> Result<RenderedChart, RenderError> {
    let layout = Layout { vertical: params.orientation, rows: chart.len() };
    // Font sizes below are in points.
    let px_per_pt = f64::from(params.dpi) / 72.0;
    let font = |pt: f64| ("sans-serif", pt * px_per_pt).into_font();
    let px = |pt: f64| (pt * px_per_pt).round() as u32;

    let mean_max = chart.series.iter().map(|s| s.mean()).fold(0.0, f64::max);
    let ticks = nice_ticks(chart.max_displayed().max(mean_max), MAX_VALUE_TICKS);
    let near_max = axis_near_max(&ticks);
    let top = ticks.last().copied().unwrap_or(1.0);

    let longest_label = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let category_extent = if layout.vertical { size.1 } else { size.0 };
    let category_area = (px(8.0) + (longest_label as f64 * 6.0 * 0.6 * px_per_pt) as u32)
        .min(category_extent * 2 / 5);

    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(drawing_error)?;

    let (x_range, y_range, x_area, y_area) = if layout.vertical {
        (layout.category_axis(), value_axis(&ticks), category_area, px(40.0))
    } else {
        (value_axis(&ticks), layout.category_axis(), px(20.0), category_area)
    };

    let mut ctx = ChartBuilder::on(&root)
        .margin(px(8.0))
        .x_label_area_size(x_area)
        .y_label_area_size(y_area)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| RenderError::ChartConfig(e.to_string()))?;

    let category_label = |pos: &f64| {
        layout
            .row_at(*pos)
            .map(|row| chart.labels[row].clone())
            .unwrap_or_default()
    };
    let value_label = |v: &f64| format_thousands(*v);
    let category_style = if layout.vertical {
        font(6.0).transform(FontTransform::Rotate270)
    } else {
        font(6.0)
    };

    {
        let mut mesh = ctx.configure_mesh();
        mesh.disable_mesh()
            .axis_style(BLACK.stroke_width(1))
            .label_style(font(7.0));
        if layout.vertical {
            mesh.x_label_formatter(&category_label)
                .x_label_style(category_style)
                .y_label_formatter(&value_label);
        } else {
            mesh.y_label_formatter(&category_label)
                .y_label_style(category_style)
                .x_label_formatter(&value_label);
        }
        mesh.draw().map_err(drawing_error)?;
    }

    let ceiling = chart.ceiling;
    let half = BAR_WIDTH / 2.0;
    let mut annotated = 0usize;

    for slot in SeriesSlot::ALL {
        let series = chart.series(slot);
        let [r, g, b] = slot.color();
        let color = RGBColor(r, g, b);
        let offset = slot.group_offset() * BAR_WIDTH;

        ctx.draw_series(series.adjusted.iter().enumerate().map(|(i, adj)| {
            let centre = layout.position(i) + offset;
            Rectangle::new(
                [
                    layout.point(centre - half, 0.0),
                    layout.point(centre + half, adj.displayed_height),
                ],
                color.filled(),
            )
        }))
        .map_err(drawing_error)?;

        // White cut across the top of every clipped bar.
        ctx.draw_series(series.adjusted.iter().enumerate().filter(|(_, adj)| adj.was_clipped).map(
            |(i, adj)| {
                let centre = layout.position(i) + offset;
                let h = adj.displayed_height;
                Rectangle::new(
                    [
                        layout.point(centre - half, h * 0.95),
                        layout.point(centre + half, h * 0.97),
                    ],
                    WHITE.filled(),
                )
            },
        ))
        .map_err(drawing_error)?;

        let (start, end) = (layout.category_range().start, layout.category_range().end);
        ctx.draw_series(DashedLineSeries::new(
            [layout.point(start, series.mean()), layout.point(end, series.mean())],
            px(3.0),
            px(2.0),
            color.stroke_width(px(0.8).max(1)),
        ))
        .map_err(drawing_error)?
        .label(format!(
            "{} — {}",
            periods[slot.index()],
            format_thousands(series.mean().round())
        ))
        .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled()));

        if params.show_original_values {
            let pad = top * 0.01;
            let annotation_font = if layout.vertical {
                font(5.0).transform(FontTransform::Rotate270)
            } else {
                font(5.0)
            };
            let style = TextStyle::from(annotation_font).pos(Pos::new(HPos::Left, VPos::Center));
            let labels: Vec<_> = (0..chart.len())
                .filter(|&i| series.annotated(i, ceiling, near_max))
                .map(|i| {
                    let centre = layout.position(i) + offset;
                    let h = series.adjusted[i].displayed_height;
                    Text::new(
                        format_thousands(series.raw[i]),
                        layout.point(centre, h + pad),
                        style.clone(),
                    )
                })
                .collect();
            annotated += labels.len();
            ctx.draw_series(labels).map_err(drawing_error)?;
        }
    }

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(WHITE)
        .label_font(font(7.0))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .map_err(drawing_error)?;

    root.present().map_err(drawing_error)?;

    Ok(RenderedChart { axis_near_max: near_max, annotated })
}
