//! Diagnostic charts.
//!
//! - fixed-grid terminal rendering (`ascii`)
//! - SVG files via plotters (`svg`)

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

/// Line drawn under a scatter for reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceLine {
    /// y = x; both axes share one range.
    Diagonal,
    /// y = 0.
    Zero,
}

/// Axis ranges for a scatter, padded by 5% on each side.
pub(crate) fn scatter_bounds(points: &[(f64, f64)], reference: ReferenceLine) -> ((f64, f64), (f64, f64)) {
    let finite = points.iter().filter(|(x, y)| x.is_finite() && y.is_finite());
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for &(px, py) in finite {
        x = (x.0.min(px), x.1.max(px));
        y = (y.0.min(py), y.1.max(py));
    }
    if !x.0.is_finite() {
        return ((0.0, 1.0), (0.0, 1.0));
    }

    match reference {
        ReferenceLine::Diagonal => {
            let both = (x.0.min(y.0), x.1.max(y.1));
            let r = pad_range(both.0, both.1, 0.05);
            (r, r)
        }
        ReferenceLine::Zero => {
            y = (y.0.min(0.0), y.1.max(0.0));
            (pad_range(x.0, x.1, 0.05), pad_range(y.0, y.1, 0.05))
        }
    }
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    if span < 1e-12 {
        return (min - 0.5, max + 0.5);
    }
    let pad = span * frac;
    (min - pad, max + pad)
}
