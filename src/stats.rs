use crate::models::SeriesTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary statistics for one series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub series_code: String,
    pub count: usize,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute per-series statistics, one summary per table in input order.
pub fn summarize(tables: &[SeriesTable]) -> Vec<Summary> {
    tables.iter().map(summarize_table).collect()
}

fn summarize_table(t: &SeriesTable) -> Summary {
    let mut vals: Vec<f64> = t.values().collect();
    vals.sort_by(f64::total_cmp);
    let count = vals.len();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary {
        series_code: t.series_code.clone(),
        count,
        first: t.observations.iter().map(|o| o.date).min(),
        last: t.observations.iter().map(|o| o.date).max(),
        min: vals.first().copied(),
        max: vals.last().copied(),
        mean,
        median,
    }
}
