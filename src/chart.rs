use crate::catalog::Catalog;
use crate::error::{PlotError, Result};
use crate::spec::{BarSource, ChartKind, ChartSpec, ColorToken, LegendLoc};
use crate::transform::{extract_fixed_overhead, extract_overhead, normalize_per_unit, ops_per_second};
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

// Font sizes
// NOTE: These are intentionally large because SVGs are often viewed scaled down in browsers/docs.
const TITLE_FONT_SIZE: u32 = 32;
const AXIS_LABEL_FONT_SIZE: u32 = 22;
const TICK_LABEL_FONT_SIZE: u32 = 16;
const LEGEND_FONT_SIZE: u32 = 18;

// Layout tuning
const DEFAULT_MARGIN_BOTTOM: u32 = 55;
const DEFAULT_X_LABEL_AREA_SIZE: u32 = 60;

const BAR_CHART_SIZE: (u32, u32) = (1200, 500);
const LINE_CHART_SIZE: (u32, u32) = (1000, 600);

/// Categorical palette, indexed by `ColorToken`
const COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),  // C0 blue
    RGBColor(255, 127, 14),  // C1 orange
    RGBColor(44, 160, 44),   // C2 green
    RGBColor(214, 39, 40),   // C3 red
    RGBColor(148, 103, 189), // C4 purple
    RGBColor(140, 86, 75),   // C5 brown
    RGBColor(227, 119, 194), // C6 pink
    RGBColor(127, 127, 127), // C7 gray
    RGBColor(188, 189, 34),  // C8 olive
    RGBColor(23, 190, 207),  // C9 cyan
];

fn token_color(token: ColorToken) -> RGBColor {
    let idx = match token {
        ColorToken::C0 => 0,
        ColorToken::C1 => 1,
        ColorToken::C2 => 2,
        ColorToken::C3 => 3,
        ColorToken::C4 => 4,
        ColorToken::C5 => 5,
        ColorToken::C6 => 6,
        ColorToken::C7 => 7,
        ColorToken::C8 => 8,
        ColorToken::C9 => 9,
    };
    COLORS[idx]
}

fn legend_position(loc: LegendLoc) -> Option<SeriesLabelPosition> {
    let pos = match loc {
        LegendLoc::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendLoc::UpperCenter => SeriesLabelPosition::UpperMiddle,
        LegendLoc::UpperRight => SeriesLabelPosition::UpperRight,
        LegendLoc::CenterLeft => SeriesLabelPosition::MiddleLeft,
        LegendLoc::Center => SeriesLabelPosition::MiddleMiddle,
        LegendLoc::CenterRight => SeriesLabelPosition::MiddleRight,
        LegendLoc::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendLoc::LowerCenter => SeriesLabelPosition::LowerMiddle,
        LegendLoc::LowerRight => SeriesLabelPosition::LowerRight,
        LegendLoc::Hidden => return None,
    };
    Some(pos)
}

/// Round `value` to `decimals` places so that formatting it with the same
/// precision and parsing the text back gives the identical `f64`.
fn quantize(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Flat-topped hexagon marker vertices around the origin
fn hexagon(radius: i32) -> Vec<(i32, i32)> {
    (0..6)
        .map(|k| {
            let angle = std::f64::consts::FRAC_PI_3 * k as f64;
            let r = radius as f64;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

/// Bar label with the plotted value embedded, e.g. `std::set<int> (12.50)`
pub fn value_label(label: &str, value: f64, decimals: usize) -> String {
    format!("{label} ({value:.decimals$})")
}

/// One bar, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

/// One curve, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
}

/// A chart whose variants have all been loaded, transformed and checked
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedChart {
    Bar(Vec<Bar>),
    Line(Vec<Curve>),
}

fn bar_value(source: &BarSource, label: &str, catalog: &Catalog) -> Result<f64> {
    match source {
        BarSource::Fixed { value } => Ok(extract_fixed_overhead(*value)),
        BarSource::Throughput { latency_ns } => ops_per_second(label, *latency_ns),
        BarSource::Overhead {
            dataset,
            pointer_width,
        } => extract_overhead(catalog.load(dataset)?, *pointer_width),
    }
}

/// Every dataset `spec` reads must have the same number of samples.
fn check_aligned(spec: &ChartSpec, catalog: &Catalog) -> Result<()> {
    let mut expected: Option<(usize, &str)> = None;

    for dataset in spec.datasets() {
        let len = catalog.load(dataset)?.len();
        match expected {
            None => expected = Some((len, dataset)),
            Some((first_len, first)) if first_len != len => {
                return Err(PlotError::malformed(
                    dataset,
                    format!(
                        "has {len} samples but `{first}` has {first_len} in chart `{}`",
                        spec.name
                    ),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Resolve every variant of `spec` against `catalog`.
///
/// Fails before anything is drawn if a dataset is missing, the datasets of
/// the chart differ in length, or a derivation divides by zero.
pub fn prepare(spec: &ChartSpec, catalog: &Catalog) -> Result<PreparedChart> {
    spec.validate()?;
    check_aligned(spec, catalog)?;

    match &spec.kind {
        ChartKind::Bar {
            variants,
            value_label: decimals,
        } => {
            let mut bars = Vec::with_capacity(variants.len());
            for variant in variants {
                let raw = bar_value(&variant.source, &variant.label, catalog)?;
                // label and bar height come from the same number
                let (label, value) = match decimals {
                    Some(d) => {
                        let value = quantize(raw, *d);
                        (value_label(&variant.label, value, *d), value)
                    }
                    None => (variant.label.clone(), raw),
                };
                debug!(chart = %spec.name, variant = %variant.label, value, "prepared bar");
                bars.push(Bar {
                    label,
                    value,
                    color: token_color(variant.color),
                });
            }
            Ok(PreparedChart::Bar(bars))
        }
        ChartKind::Line { variants } => {
            let mut curves = Vec::with_capacity(variants.len());

            for variant in variants {
                let loaded = catalog.load(&variant.dataset)?;
                let series = if variant.per_unit {
                    normalize_per_unit(loaded)?
                } else {
                    loaded.clone()
                };
                debug!(chart = %spec.name, variant = %variant.label, samples = series.len(), "prepared curve");
                curves.push(Curve {
                    label: variant.label.clone(),
                    points: series.points().collect(),
                    color: token_color(variant.color),
                });
            }
            Ok(PreparedChart::Line(curves))
        }
    }
}

/// Draw a prepared chart into an SVG document held in memory
pub fn draw_svg(spec: &ChartSpec, prepared: &PreparedChart) -> Result<String> {
    let mut svg = String::new();
    let drawn = match prepared {
        PreparedChart::Bar(bars) => draw_bar_chart(spec, bars, &mut svg),
        PreparedChart::Line(curves) => draw_line_chart(spec, curves, &mut svg),
    };
    drawn.map_err(|e| PlotError::Render {
        path: spec.output.clone(),
        reason: format!("{e:#}"),
    })?;
    Ok(svg)
}

/// Load, transform and draw `spec`, then write the SVG to `spec.output`.
///
/// The file is written in one step after drawing succeeded, replacing any
/// previous file; on error nothing is written.
pub fn render(spec: &ChartSpec, catalog: &Catalog) -> Result<PathBuf> {
    let prepared = prepare(spec, catalog)?;
    let svg = draw_svg(spec, &prepared)?;

    std::fs::write(&spec.output, svg).map_err(|e| PlotError::Render {
        path: spec.output.clone(),
        reason: e.to_string(),
    })?;

    info!(chart = %spec.name, path = %spec.output.display(), "chart written");
    Ok(spec.output.clone())
}

/// One bar per variant, labelled on the x axis
fn draw_bar_chart(spec: &ChartSpec, bars: &[Bar], svg: &mut String) -> anyhow::Result<()> {
    let root = SVGBackend::with_string(svg, BAR_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let num_bars = bars.len();
    let max_value = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let min_value = bars.iter().map(|b| b.value).fold(0.0_f64, f64::min);
    let y_top = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };
    let y_bottom = min_value * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .margin_bottom(DEFAULT_MARGIN_BOTTOM)
        .x_label_area_size(DEFAULT_X_LABEL_AREA_SIZE)
        .y_label_area_size(110)
        .build_cartesian_2d(-0.5..(num_bars as f64 - 0.5), y_bottom..y_top)?;

    let bar_label = |x: &f64| {
        let idx = x.round() as usize;
        if idx < num_bars && (x - idx as f64).abs() < 0.3 {
            bars.get(idx).map(|b| b.label.clone()).unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(num_bars)
        .x_label_formatter(&bar_label)
        .y_desc(spec.ylabel.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE));
    if let Some(xlabel) = &spec.xlabel {
        mesh.x_desc(xlabel.as_str());
    }
    mesh.draw()?;

    let bar_width = 0.4;

    for (idx, bar) in bars.iter().enumerate() {
        let x_center = idx as f64;
        let x_left = x_center - bar_width / 2.0;
        let x_right = x_center + bar_width / 2.0;
        let color = bar.color;

        let drawn = chart.draw_series(std::iter::once(Rectangle::new(
            [(x_left, 0.0), (x_right, bar.value)],
            color.filled(),
        )))?;
        if spec.legend_loc != LegendLoc::Hidden {
            drawn
                .label(bar.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
        }
    }

    if let Some(position) = legend_position(spec.legend_loc) {
        chart
            .configure_series_labels()
            .position(position)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// One curve per variant over a shared size axis
fn draw_line_chart(spec: &ChartSpec, curves: &[Curve], svg: &mut String) -> anyhow::Result<()> {
    let root = SVGBackend::with_string(svg, LINE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let all_points = || curves.iter().flat_map(|c| c.points.iter().copied());
    let min_x = all_points().map(|(x, _)| x).fold(f64::MAX, f64::min);
    let max_x = all_points().map(|(x, _)| x).fold(f64::MIN, f64::max);
    let max_y = all_points().map(|(_, y)| y).fold(0.0_f64, f64::max);

    // Single-sample charts still need a non-degenerate x range
    let (x_lo, x_hi) = if max_x > min_x {
        (min_x, max_x)
    } else {
        (min_x - 1.0, max_x + 1.0)
    };
    let y_hi = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .margin_bottom(DEFAULT_MARGIN_BOTTOM)
        .x_label_area_size(DEFAULT_X_LABEL_AREA_SIZE)
        .y_label_area_size(90)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

    let mut mesh = chart.configure_mesh();
    mesh.y_desc(spec.ylabel.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE));
    if let Some(xlabel) = &spec.xlabel {
        mesh.x_desc(xlabel.as_str());
    }
    mesh.draw()?;

    for curve in curves {
        let color = curve.color;

        chart
            .draw_series(LineSeries::new(curve.points.clone(), color.stroke_width(3)))?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));

        chart.draw_series(PointSeries::of_element(
            curve.points.clone(),
            6,
            color.filled(),
            &|coord, size, style| EmptyElement::at(coord) + Polygon::new(hexagon(size), style),
        ))?;
    }

    if let Some(position) = legend_position(spec.legend_loc) {
        chart
            .configure_series_labels()
            .position(position)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;
    }

    root.present()?;
    Ok(())
}
