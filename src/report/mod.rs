//! Reporting utilities: column statistics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Dataset;
use crate::math::mean_present;

/// Summary of one numeric dataset column over the present values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Count/mean/min/max for each numeric column; unknown or text columns are skipped.
pub fn describe_columns(dataset: &Dataset, columns: &[&str]) -> Vec<ColumnStats> {
    let mut out = Vec::with_capacity(columns.len());
    for &column in columns {
        let Ok(table) = dataset.numeric_table(&[column]) else {
            continue;
        };
        let values = table.column(0);
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        out.push(ColumnStats {
            column: column.to_string(),
            count: present.len(),
            mean: mean_present(&values),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
        });
    }
    out
}
