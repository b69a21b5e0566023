use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ProbeFailure;

/// Outcome of a single DNS-then-TCP probe against one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// The hostname exactly as it was configured.
    pub endpoint: String,

    /// True only when DNS resolution and the TCP connect both succeeded.
    pub is_reachable: bool,

    /// Wall-clock time of the whole probe (resolve + connect) in milliseconds.
    /// Only reported for reachable endpoints.
    pub response_time_ms: Option<f64>,

    /// The resolved address. Present whenever DNS resolution succeeded.
    pub ip_address: Option<String>,

    /// Human readable failure reason. Present iff the endpoint is unreachable.
    pub error_message: Option<String>,

    pub test_timestamp: DateTime<Utc>,
}

impl ProbeResult {
    pub fn reachable(endpoint: &str, ip: IpAddr, response_time_ms: f64) -> Self {
        ProbeResult {
            endpoint: endpoint.to_string(),
            is_reachable: true,
            response_time_ms: Some(response_time_ms),
            ip_address: Some(ip.to_string()),
            error_message: None,
            test_timestamp: Utc::now(),
        }
    }

    pub fn unreachable(endpoint: &str, ip: Option<IpAddr>, failure: &ProbeFailure) -> Self {
        ProbeResult {
            endpoint: endpoint.to_string(),
            is_reachable: false,
            response_time_ms: None,
            ip_address: ip.map(|ip| ip.to_string()),
            error_message: Some(failure.to_string()),
            test_timestamp: Utc::now(),
        }
    }

    /// A failed result for a service name that has no known endpoint.
    pub fn unknown_service(name: &str) -> Self {
        ProbeResult {
            endpoint: name.to_string(),
            is_reachable: false,
            response_time_ms: None,
            ip_address: None,
            error_message: Some(format!("Unknown service: {name}")),
            test_timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallStatus {
    /// All reachable is healthy, a strict majority is degraded, anything else is unhealthy.
    pub fn classify(reachable: usize, total: usize) -> Self {
        if reachable == total {
            OverallStatus::Healthy
        } else if reachable as f64 > total as f64 / 2.0 {
            OverallStatus::Degraded
        } else {
            OverallStatus::Unhealthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate of one sweep across all configured endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeSummary {
    pub total_endpoints: usize,
    pub reachable_endpoints: usize,
    pub unreachable_endpoints: usize,

    /// Mean response time over reachable results that carry a timing.
    pub average_response_time_ms: Option<f64>,

    /// Results in the order the endpoints were configured.
    pub test_results: Vec<ProbeResult>,

    pub overall_status: OverallStatus,
    pub last_test_time: DateTime<Utc>,
}

impl ProbeSummary {
    /// Reduces an ordered result set into a summary.
    pub fn from_results(test_results: Vec<ProbeResult>) -> Self {
        let total_endpoints = test_results.len();
        let reachable_endpoints = test_results.iter().filter(|r| r.is_reachable).count();

        let reachable_times: Vec<f64> = test_results
            .iter()
            .filter(|r| r.is_reachable)
            .filter_map(|r| r.response_time_ms)
            .collect();
        let average_response_time_ms = match reachable_times.len() {
            0 => None,
            n => Some(reachable_times.iter().sum::<f64>() / n as f64),
        };

        ProbeSummary {
            total_endpoints,
            reachable_endpoints,
            unreachable_endpoints: total_endpoints - reachable_endpoints,
            average_response_time_ms,
            test_results,
            overall_status: OverallStatus::classify(reachable_endpoints, total_endpoints),
            last_test_time: Utc::now(),
        }
    }

    pub fn overview(&self) -> StatusOverview {
        StatusOverview {
            overall_status: self.overall_status,
            reachable_endpoints: self.reachable_endpoints,
            total_endpoints: self.total_endpoints,
            average_response_time_ms: self.average_response_time_ms,
            last_test_time: self.last_test_time,
        }
    }
}

/// Reduced projection of a [`ProbeSummary`] without the per-endpoint detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOverview {
    pub overall_status: OverallStatus,
    pub reachable_endpoints: usize,
    pub total_endpoints: usize,
    pub average_response_time_ms: Option<f64>,
    pub last_test_time: DateTime<Utc>,
}
