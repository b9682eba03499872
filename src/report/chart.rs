//! Chart directive encoding.
//!
//! A chart config becomes the opening `{chart:...}` line that wraps the table.

use crate::types::{ChartConfig, ChartValue};

/// Fixed chart width in pixels
pub const CHART_WIDTH: u32 = 800;

/// Closing directive emitted after the last row
pub const CHART_CLOSE: &str = "{chart}";

/// Encode the directives as `key=value` pairs joined by `|`.
///
/// List values are comma-joined; empty values are omitted.
pub fn encode_directives(chart: &ChartConfig) -> String {
    let pairs: Vec<String> = chart
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| match value {
            ChartValue::Scalar(s) => format!("{}={}", key.as_str(), s),
            ChartValue::List(items) => format!("{}={}", key.as_str(), items.join(",")),
        })
        .collect();
    pairs.join("|")
}

/// Format the opening directive line (without trailing newline)
pub fn format_chart_open(chart: &ChartConfig) -> String {
    format!("{{chart:{}|width={}}}", encode_directives(chart), CHART_WIDTH)
}
