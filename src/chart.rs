//! # Chart Data Sanitisation
//!
//! Values handed to chart renderers are rounded to a fixed precision, since
//! float artifacts like `0.30000000000000004` produce malformed SVG paths,
//! and datasets get default styling when the backend omits it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DECIMALS: u32 = 2;
pub const DEFAULT_BORDER_WIDTH: u32 = 2;

/// Background/border colour pairs assigned by dataset index
pub const PALETTE: [(&str, &str); 6] = [
    ("rgba(54, 162, 235, 0.2)", "rgba(54, 162, 235, 1)"),
    ("rgba(255, 99, 132, 0.2)", "rgba(255, 99, 132, 1)"),
    ("rgba(75, 192, 192, 0.2)", "rgba(75, 192, 192, 1)"),
    ("rgba(255, 206, 86, 0.2)", "rgba(255, 206, 86, 1)"),
    ("rgba(153, 102, 255, 0.2)", "rgba(153, 102, 255, 1)"),
    ("rgba(255, 159, 64, 0.2)", "rgba(255, 159, 64, 1)"),
];

/// Round half away from zero; non-finite input becomes 0
pub fn safe_round(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals.min(15) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Round every value; missing, NaN and infinite entries become 0
pub fn safe_chart_data<I>(values: I, decimals: u32) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .map(|value| safe_round(value.unwrap_or(0.0), decimals))
        .collect()
}

/// [`safe_chart_data`] for raw JSON arrays; numeric strings are parsed
pub fn safe_chart_values(values: &[Value], decimals: u32) -> Vec<f64> {
    safe_chart_data(values.iter().map(numeric_value), decimals)
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(true) => Some(1.0),
        _ => None,
    }
}

/// One series of a chart, in the shape chart renderers consume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

/// Labels plus datasets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartDataset>,
}

/// Fill missing styling and round the data of the dataset at `index`
pub fn sanitize_dataset(mut dataset: ChartDataset, index: usize) -> ChartDataset {
    let (background, border) = PALETTE[index % PALETTE.len()];

    dataset.data = safe_chart_data(dataset.data, DEFAULT_DECIMALS)
        .into_iter()
        .map(Some)
        .collect();
    dataset
        .background_color
        .get_or_insert_with(|| background.to_string());
    dataset.border_color.get_or_insert_with(|| border.to_string());
    dataset.border_width.get_or_insert(DEFAULT_BORDER_WIDTH);
    dataset.fill.get_or_insert(false);
    dataset
}

pub fn sanitize_chart(chart: ChartData) -> ChartData {
    ChartData {
        labels: chart.labels,
        datasets: chart
            .datasets
            .into_iter()
            .enumerate()
            .map(|(index, dataset)| sanitize_dataset(dataset, index))
            .collect(),
    }
}
