//! Off-screen chart rendering into RGB buffers.

use plotters::prelude::*;

use crate::error::{Error, Result};

const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// A named line on a line chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Series {
            name: name.into(),
            points,
        }
    }
}

/// What to draw
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Line {
        title: String,
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    Bar {
        title: String,
        y_label: String,
        bars: Vec<(String, f64)>,
    },
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Line { title, .. }
            | ChartSpec::Scatter { title, .. }
            | ChartSpec::Bar { title, .. } => title,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            ChartSpec::Line { series, .. } => series.iter().all(|s| s.points.is_empty()),
            ChartSpec::Scatter { points, .. } => points.is_empty(),
            ChartSpec::Bar { bars, .. } => bars.is_empty(),
        }
    }
}

/// Packed 8-bit RGB pixels, row major
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    /// Solid white image
    #[cfg(test)]
    pub fn blank(width: u32, height: u32) -> Self {
        RasterImage {
            width,
            height,
            rgb: vec![255; (width * height * 3) as usize],
        }
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

/// Padded (min, max) of a set of values
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Draw a chart into a `width` x `height` RGB buffer.
///
/// Text goes through the system font stack, so a host without usable fonts
/// fails here with `Error::Render`.
pub fn rasterize(chart: &ChartSpec, width: u32, height: u32) -> Result<RasterImage> {
    if width == 0 || height == 0 {
        return Err(Error::Render(format!("invalid image size {width}x{height}")));
    }
    if chart.is_empty() {
        return Err(Error::Render(format!("no data to plot for '{}'", chart.title())));
    }

    let mut rgb = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        match chart {
            ChartSpec::Line {
                title,
                x_label,
                y_label,
                series,
            } => {
                let all = series.iter().flat_map(|s| s.points.iter().copied());
                let (x0, x1) = bounds(all.clone().map(|p| p.0));
                let (y0, y1) = bounds(all.map(|p| p.1));

                let mut chart = ChartBuilder::on(&root)
                    .caption(title, ("sans-serif", 22))
                    .margin(12)
                    .x_label_area_size(36)
                    .y_label_area_size(70)
                    .build_cartesian_2d(x0..x1, y0..y1)
                    .map_err(render_err)?;
                chart
                    .configure_mesh()
                    .x_desc(x_label.as_str())
                    .y_desc(y_label.as_str())
                    .x_label_formatter(&|x| format!("{x:.0}"))
                    .draw()
                    .map_err(render_err)?;

                for (i, s) in series.iter().enumerate() {
                    let color = SERIES_COLORS[i % SERIES_COLORS.len()];
                    chart
                        .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
                        .map_err(render_err)?
                        .label(s.name.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
                chart
                    .configure_series_labels()
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()
                    .map_err(render_err)?;
            }
            ChartSpec::Scatter {
                title,
                x_label,
                y_label,
                points,
            } => {
                let (x0, x1) = bounds(points.iter().map(|p| p.0));
                let (y0, y1) = bounds(points.iter().map(|p| p.1));

                let mut chart = ChartBuilder::on(&root)
                    .caption(title, ("sans-serif", 22))
                    .margin(12)
                    .x_label_area_size(36)
                    .y_label_area_size(70)
                    .build_cartesian_2d(x0..x1, y0..y1)
                    .map_err(render_err)?;
                chart
                    .configure_mesh()
                    .x_desc(x_label.as_str())
                    .y_desc(y_label.as_str())
                    .draw()
                    .map_err(render_err)?;
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| Circle::new(p, 3, SERIES_COLORS[0].filled())),
                    )
                    .map_err(render_err)?;
            }
            ChartSpec::Bar {
                title,
                y_label,
                bars,
            } => {
                let (_, y1) = bounds(bars.iter().map(|b| b.1).chain(std::iter::once(0.0)));
                let y0 = bars.iter().map(|b| b.1).fold(0.0_f64, f64::min);
                let n = bars.len() as f64;
                let labels: Vec<&str> = bars.iter().map(|b| b.0.as_str()).collect();
                let label_at = |x: &f64| {
                    let i = x.round();
                    if i < 0.0 || (x - i).abs() > 1e-6 {
                        return String::new();
                    }
                    labels.get(i as usize).map(|s| s.to_string()).unwrap_or_default()
                };

                let mut chart = ChartBuilder::on(&root)
                    .caption(title, ("sans-serif", 22))
                    .margin(12)
                    .x_label_area_size(36)
                    .y_label_area_size(70)
                    .build_cartesian_2d(-0.5..n - 0.5, y0..y1)
                    .map_err(render_err)?;
                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_labels(bars.len())
                    .x_label_formatter(&label_at)
                    .y_desc(y_label.as_str())
                    .draw()
                    .map_err(render_err)?;
                chart
                    .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                        let x = i as f64;
                        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
                        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *v)], color.filled())
                    }))
                    .map_err(render_err)?;
            }
        }

        root.present().map_err(render_err)?;
    }

    Ok(RasterImage { width, height, rgb })
}
