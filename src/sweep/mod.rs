use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::model::ProbeConfig;
use crate::tcp_probe::prelude::*;

pub mod services;

#[derive(Debug, Error)]
pub enum SweepError {
    /// A probe task panicked or was cancelled by the runtime.
    #[error("probe task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Runs connectivity sweeps over a fixed, ordered list of endpoints.
pub struct NetworkTester<P> {
    endpoints: Vec<String>,
    port: u16,
    timeout: Duration,
    prober: Arc<P>,
}

impl<P> NetworkTester<P>
where
    P: EndpointProber + 'static,
{
    pub fn new(config: &ProbeConfig, prober: P) -> Self {
        NetworkTester {
            endpoints: config.endpoints.clone(),
            port: config.port,
            timeout: config.timeout(),
            prober: Arc::new(prober),
        }
    }

    /// Probes every endpoint concurrently and waits for all of them.
    /// Results keep the configured endpoint order.
    pub async fn run_connectivity_tests(&self) -> Result<ProbeSummary, SweepError> {
        tracing::info!(
            "Running connectivity tests for {} endpoints",
            self.endpoints.len()
        );

        let mut handles = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            let prober = Arc::clone(&self.prober);
            let endpoint = endpoint.clone();
            let (port, timeout) = (self.port, self.timeout);

            handles.push(tokio::spawn(async move {
                prober.probe(&endpoint, port, timeout).await
            }));
        }

        let mut test_results = Vec::with_capacity(handles.len());
        for handle in handles {
            test_results.push(handle.await?);
        }

        for result in test_results.iter().filter(|r| !r.is_reachable) {
            tracing::warn!(
                endpoint = %result.endpoint,
                error = result.error_message.as_deref().unwrap_or_default(),
                "endpoint unreachable"
            );
        }

        let summary = ProbeSummary::from_results(test_results);
        tracing::info!(
            "Network test completed: {}/{} endpoints reachable",
            summary.reachable_endpoints,
            summary.total_endpoints
        );
        Ok(summary)
    }

    /// Probes the private-link endpoint behind a short service name such as `openai`.
    pub async fn test_named_service(&self, service_name: &str) -> ProbeResult {
        match services::endpoint_for(service_name) {
            Some(endpoint) => self.prober.probe(endpoint, self.port, self.timeout).await,
            None => {
                tracing::warn!(service = service_name, "unknown service");
                ProbeResult::unknown_service(service_name)
            }
        }
    }

    pub async fn status_overview(&self) -> Result<StatusOverview, SweepError> {
        Ok(self.run_connectivity_tests().await?.overview())
    }
}
