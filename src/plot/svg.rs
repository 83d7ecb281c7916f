//! SVG charts rendered with plotters.

use std::fs;
use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;
use crate::plot::{ReferenceLine, scatter_bounds};

/// Pixel size of every SVG chart.
pub const SVG_SIZE: (u32, u32) = (1000, 600);

/// A labelled scatter over a reference line.
pub struct ScatterChart<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub points: &'a [(f64, f64)],
    pub reference: ReferenceLine,
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

pub fn write_scatter_svg(path: &Path, chart: &ScatterChart<'_>) -> Result<(), AppError> {
    ensure_parent(path)?;
    draw_scatter(path, chart)
        .map_err(|e| AppError::io(format!("Failed to draw chart '{}': {e}", path.display())))
}

/// Horizontal bars, first entry at the top.
pub fn write_bar_svg(path: &Path, title: &str, bars: &[(String, f64)]) -> Result<(), AppError> {
    ensure_parent(path)?;
    draw_bars(path, title, bars)
        .map_err(|e| AppError::io(format!("Failed to draw chart '{}': {e}", path.display())))
}

fn draw_scatter(path: &Path, chart: &ScatterChart<'_>) -> DrawResult {
    let ((x0, x1), (y0, y1)) = scatter_bounds(chart.points, chart.reference);

    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(chart.title, ("sans-serif", 24))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .x_labels(8)
        .y_labels(8)
        .draw()?;

    let line = match chart.reference {
        ReferenceLine::Diagonal => vec![(x0, x0), (x1, x1)],
        ReferenceLine::Zero => vec![(x0, 0.0), (x1, 0.0)],
    };
    ctx.draw_series(LineSeries::new(line, RED.stroke_width(2)))?;

    let dot = RGBColor(31, 119, 180).mix(0.6).filled();
    ctx.draw_series(
        chart
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|&(x, y)| Circle::new((x, y), 4, dot)),
    )?;

    root.present()?;
    Ok(())
}

fn draw_bars(path: &Path, title: &str, bars: &[(String, f64)]) -> DrawResult {
    let n = bars.len().max(1);
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let x_max = if max > 0.0 { max * 1.05 } else { 1.0 };

    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 180)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())?;

    // Row 0 is drawn at the bottom, so labels are looked up in reverse.
    let label_for = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) if *i < bars.len() => bars[bars.len() - 1 - i].0.clone(),
        _ => String::new(),
    };
    ctx.configure_mesh()
        .disable_y_mesh()
        .x_desc("Importance")
        .y_labels(n)
        .y_label_formatter(&label_for)
        .draw()?;

    let fill = RGBColor(31, 119, 180).filled();
    ctx.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
        let row = bars.len() - 1 - i;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (v.max(0.0), SegmentValue::Exact(row + 1)),
            ],
            fill,
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("nhl-ml-svg-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn scatter_svg_is_written() {
        let path = scratch("scatter.svg");
        let chart = ScatterChart {
            title: "Actual vs Predicted",
            x_label: "Actual",
            y_label: "Predicted",
            points: &[(1.0, 1.5), (10.0, 9.0), (20.0, 21.0)],
            reference: ReferenceLine::Diagonal,
        };
        write_scatter_svg(&path, &chart).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Actual vs Predicted"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn bar_svg_labels_features() {
        let path = scratch("bars.svg");
        let bars = vec![("career_points".to_string(), 0.6), ("shots".to_string(), 0.4)];
        write_bar_svg(&path, "Feature Importance", &bars).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("career_points"));
        assert!(svg.contains("shots"));
        let _ = fs::remove_file(&path);
    }
}
