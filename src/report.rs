use clap::ValueEnum;
use serde::Serialize;
use unicode_truncate::UnicodeTruncateStr;

use crate::tcp_probe::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn to_fixed_width(input: &str, width: usize) -> String {
    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

fn format_ms(ms: Option<f64>) -> String {
    ms.map(|ms| format!("{ms:.2}ms"))
        .unwrap_or_else(|| "N/A".to_string())
}

/// One line per endpoint: marker, padded endpoint, address and latency or the failure reason.
pub fn render_result(result: &ProbeResult, width: usize) -> String {
    let endpoint = to_fixed_width(&result.endpoint, width);
    let ip = to_fixed_width(result.ip_address.as_deref().unwrap_or("-"), 15);
    if result.is_reachable {
        format!("✅ {endpoint} {ip} {}", format_ms(result.response_time_ms))
    } else {
        format!(
            "❌ {endpoint} {ip} {}",
            result.error_message.as_deref().unwrap_or_default()
        )
    }
}

pub fn render_overview(overview: &StatusOverview) -> String {
    format!(
        "Status: {} ({}/{} reachable, avg {}) at {}",
        overview.overall_status,
        overview.reachable_endpoints,
        overview.total_endpoints,
        format_ms(overview.average_response_time_ms),
        overview.last_test_time.to_rfc3339()
    )
}

pub fn render_summary(summary: &ProbeSummary, width: usize) -> String {
    let mut lines: Vec<String> = summary
        .test_results
        .iter()
        .map(|result| render_result(result, width))
        .collect();
    lines.push(render_overview(&summary.overview()));
    lines.join("\n")
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
