use anyhow::{anyhow, ensure, Result};
use flowlog::{FlowLog, Flows, Metric};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::PathBuf;

/// Figure size in inches (width, height)
pub const FIGURE_SIZE_IN: (f64, f64) = (18.0, 12.0);

/// Output resolution in dots per inch
pub const DPI: u32 = 300;

/// Default end of the time window in seconds
pub const DEFAULT_WINDOW_END: f64 = 100.0;

pub const THROUGHPUT_RANGE: Range<f64> = 0.0..10000.0;
pub const TRENDLINE_RANGE: Range<f64> = -0.1..0.1;

const X_LABEL: &str = "Time (sec)";
const FONT: &str = "sans-serif";
const LINE_WIDTH: u32 = 3;

/// Options for drawing the chart
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Path of the PNG to write
    pub output: PathBuf,
    /// Draw a legend of flow ids on every panel
    pub show_legend: bool,
    /// End of the horizontal axis in seconds; the axis starts at 0
    pub window_end: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("fig.png"),
            show_legend: false,
            window_end: DEFAULT_WINDOW_END,
        }
    }
}

/// Canvas size in pixels
pub fn canvas_size() -> (u32, u32) {
    let (width, height) = FIGURE_SIZE_IN;
    (
        (width * DPI as f64).round() as u32,
        (height * DPI as f64).round() as u32,
    )
}

/// Vertical extent of the panel for `metric`.
///
/// Throughput and trendline panels have fixed extents; the others fit the
/// data with a 5% margin.
pub fn y_range(metric: Metric, flows: &Flows) -> Range<f64> {
    match metric {
        Metric::Throughput => THROUGHPUT_RANGE,
        Metric::Trendline => TRENDLINE_RANGE,
        _ => auto_range(
            flows
                .values()
                .flat_map(|series| series.points())
                .map(|(_, y)| y),
        ),
    }
}

fn auto_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
        return (min - pad)..(max + pad);
    }
    let margin = (max - min) * 0.05;
    (min - margin)..(max + margin)
}

/// Clip the segment `a`-`b` to the rectangle `x` by `y` (Liang-Barsky).
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    x: &Range<f64>,
    y: &Range<f64>,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, a.0 - x.start),
        (dx, x.end - a.0),
        (-dy, a.1 - y.start),
        (dy, y.end - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    // Unclipped ends are returned as given so consecutive segments join
    let start = if t0 <= 0.0 { a } else { (a.0 + t0 * dx, a.1 + t0 * dy) };
    let end = if t1 >= 1.0 { b } else { (a.0 + t1 * dx, a.1 + t1 * dy) };
    Some((start, end))
}

/// Split a polyline into the pieces visible inside the rectangle `x` by `y`
fn visible_paths(
    points: impl IntoIterator<Item = (f64, f64)>,
    x: &Range<f64>,
    y: &Range<f64>,
) -> Vec<Vec<(f64, f64)>> {
    let mut paths: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut prev: Option<(f64, f64)> = None;

    for point in points {
        if let Some(last) = prev {
            match clip_segment(last, point, x, y) {
                Some((start, end)) => {
                    if current.last() != Some(&start) {
                        if current.len() > 1 {
                            paths.push(std::mem::take(&mut current));
                        }
                        current.clear();
                        current.push(start);
                    }
                    current.push(end);
                }
                None => {
                    if current.len() > 1 {
                        paths.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
        }
        prev = Some(point);
    }
    if current.len() > 1 {
        paths.push(current);
    }
    paths
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: Metric,
    flows: &Flows,
    config: &RenderConfig,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x = 0.0..config.window_end;
    let y = y_range(metric, flows);

    let mut chart = ChartBuilder::on(area)
        .margin(30)
        .x_label_area_size(110)
        .y_label_area_size(200)
        .build_cartesian_2d(x.clone(), y.clone())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(X_LABEL)
        .y_desc(metric.axis_label())
        .label_style((FONT, 36))
        .axis_desc_style((FONT, 44))
        .draw()?;

    for (idx, (flow, series)) in flows.iter().enumerate() {
        let style = Palette99::pick(idx).stroke_width(LINE_WIDTH);
        let paths = visible_paths(series.points(), &x, &y);

        let anno = chart.draw_series(
            paths
                .into_iter()
                .map(move |path| PathElement::new(path, style)),
        )?;
        if config.show_legend {
            anno.label(flow.as_str())
                .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 40, ly)], style));
        }
    }

    if config.show_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 36))
            .draw()?;
    }

    Ok(())
}

/// Draw one panel per metric, stacked in panel order, and write the PNG
pub fn render(flow_log: &FlowLog, config: &RenderConfig) -> Result<()> {
    ensure!(
        config.window_end > 0.0,
        "Time window end must be positive, got {}",
        config.window_end
    );

    let root = BitMapBackend::new(&config.output, canvas_size()).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to clear canvas: {}", e))?;

    let panels = root.split_evenly((Metric::ALL.len(), 1));
    for (metric, area) in Metric::ALL.into_iter().zip(panels.iter()) {
        let flows = flow_log.flows(metric);
        log::debug!("Drawing {} panel with {} flows", metric, flows.len());
        draw_panel(area, metric, flows, config)
            .map_err(|e| anyhow!("Failed to draw {} panel: {}", metric, e))?;
    }

    root.present()
        .map_err(|e| anyhow!("Failed to write {}: {}", config.output.display(), e))?;
    log::info!("Chart written to {}", config.output.display());

    Ok(())
}
