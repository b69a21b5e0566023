use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpSocket;
use tokio::time::error::Elapsed;

use super::prelude::*;

/// Probes a single endpoint. The sweep is generic over this so it can run
/// against something other than the network.
pub trait EndpointProber: Send + Sync {
    fn probe(
        &self,
        endpoint: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeResult> + Send;
}

/// Resolves the endpoint, then opens (and immediately closes) a TCP connection.
#[derive(Clone)]
pub struct TcpProber<R> {
    resolver: R,
}

impl<R: HostResolver> TcpProber<R> {
    pub fn new(resolver: R) -> Self {
        TcpProber { resolver }
    }
}

impl<R: HostResolver> EndpointProber for TcpProber<R> {
    async fn probe(&self, endpoint: &str, port: u16, timeout: Duration) -> ProbeResult {
        probe_endpoint(&self.resolver, endpoint, port, timeout).await
    }
}

/// Opens a full TCP connection to `addr`. The socket is dropped on every path.
async fn connect(addr: SocketAddr, timeout: Duration) -> Result<(), ProbeFailure> {
    let socket = match addr.ip() {
        IpAddr::V4(_) => TcpSocket::new_v4(),
        IpAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|e| ProbeFailure::Unexpected(report(&e)))?;

    connect_outcome(tokio::time::timeout(timeout, socket.connect(addr)).await)
}

/// Classifies a bounded connect attempt. Errors carrying an OS code are refusals;
/// a timeout reports `ETIMEDOUT`, not the `EWOULDBLOCK` a non-blocking BSD
/// `connect_ex` would return.
fn connect_outcome<S>(outcome: Result<io::Result<S>, Elapsed>) -> Result<(), ProbeFailure> {
    match outcome {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(match e.raw_os_error() {
            Some(code) => ProbeFailure::Refused(code),
            None => ProbeFailure::Transport(report(&e)),
        }),
        Err(_) => Err(ProbeFailure::Refused(libc::ETIMEDOUT)),
    }
}

/// Builds the result once DNS has succeeded. Timing is only kept for reachable endpoints.
fn connected(
    endpoint: &str,
    ip: IpAddr,
    start: Instant,
    outcome: Result<(), ProbeFailure>,
) -> ProbeResult {
    match outcome {
        Ok(()) => {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            tracing::debug!(%endpoint, %ip, elapsed_ms, "probe succeeded");
            ProbeResult::reachable(endpoint, ip, elapsed_ms)
        }
        Err(failure) => {
            tracing::debug!(%endpoint, %ip, error = %failure, "probe failed");
            let ip = failure.keeps_address().then_some(ip);
            ProbeResult::unreachable(endpoint, ip, &failure)
        }
    }
}

/// Runs one best-effort probe: resolve, then connect. Never fails; every
/// failure is folded into the returned [`ProbeResult`].
pub async fn probe_endpoint<R: HostResolver>(
    resolver: &R,
    endpoint: &str,
    port: u16,
    timeout: Duration,
) -> ProbeResult {
    let start = Instant::now();

    let ip = match resolve(resolver, endpoint, timeout).await {
        Ok(ip) => ip,
        Err(e) => {
            let failure = ProbeFailure::Dns(e.to_string());
            tracing::debug!(%endpoint, error = %failure, "probe failed");
            return ProbeResult::unreachable(endpoint, None, &failure);
        }
    };

    let outcome = connect(SocketAddr::new(ip, port), timeout).await;
    connected(endpoint, ip, start, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct Localhost;

    impl HostResolver for Localhost {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
            Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
    }

    struct Unresolvable;

    impl HostResolver for Unresolvable {
        async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
            Err(LookupError::NoAddress(host.to_string()))
        }
    }

    struct Stalled;

    impl HostResolver for Stalled {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
    }

    async fn elapsed() -> Elapsed {
        tokio::time::timeout(Duration::ZERO, std::future::pending::<()>())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_connect_timeout_reports_etimedout() {
        let outcome = connect_outcome::<()>(Err(elapsed().await));
        assert_eq!(outcome, Err(ProbeFailure::Refused(libc::ETIMEDOUT)));
        assert_eq!(
            outcome.unwrap_err().to_string(),
            format!("Connection failed (code: {})", libc::ETIMEDOUT)
        );
    }

    #[test]
    fn test_connect_error_with_os_code_is_refused() {
        let refused = io::Error::from_raw_os_error(libc::ECONNREFUSED);
        let outcome = connect_outcome::<()>(Ok(Err(refused)));
        assert_eq!(outcome, Err(ProbeFailure::Refused(libc::ECONNREFUSED)));
    }

    #[test]
    fn test_connect_error_without_os_code_is_transport() {
        let outcome = connect_outcome::<()>(Ok(Err(io::Error::other("reset by middlebox"))));
        assert_eq!(outcome, Err(ProbeFailure::Transport("reset by middlebox".to_string())));
    }

    #[test]
    fn test_established_connection_is_ok() {
        assert_eq!(connect_outcome(Ok(Ok(()))), Ok(()));
    }

    #[test]
    fn test_connect_failures_keep_address_without_timing() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        let result = connected(
            "svc.internal",
            ip,
            Instant::now(),
            Err(ProbeFailure::Transport("reset".into())),
        );

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(result.response_time_ms, None);
        assert_eq!(result.error_message.as_deref(), Some("Connection error: reset"));
    }

    #[test]
    fn test_unexpected_failure_drops_address() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        let result = connected(
            "svc.internal",
            ip,
            Instant::now(),
            Err(ProbeFailure::Unexpected("Too many open files".into())),
        );

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address, None);
        assert_eq!(result.response_time_ms, None);
        assert_eq!(result.error_message.as_deref(), Some("Test failed: Too many open files"));
    }

    #[tokio::test]
    async fn test_dns_timeout_is_a_dns_failure() {
        let result = probe_endpoint(&Stalled, "svc.internal", 443, Duration::from_millis(50)).await;

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address, None);
        assert_eq!(result.response_time_ms, None);
        assert_eq!(
            result.error_message.as_deref(),
            Some("DNS resolution failed: timed out after 50ms")
        );
    }

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let result = probe_endpoint(&Localhost, "svc.internal", port, TIMEOUT).await;

        assert!(result.is_reachable);
        assert_eq!(result.endpoint, "svc.internal");
        assert_eq!(result.ip_address.as_deref(), Some("127.0.0.1"));
        assert!(result.error_message.is_none());
        assert!(result.response_time_ms.is_some_and(|ms| ms >= 0.0));
    }

    #[tokio::test]
    async fn test_refused_connection_keeps_address() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("local addr").port()
        };

        let result = probe_endpoint(&Localhost, "svc.internal", port, TIMEOUT).await;

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(result.response_time_ms, None);
        let message = result.error_message.expect("error message");
        assert!(message.starts_with("Connection failed (code: "), "{message}");
    }

    #[tokio::test]
    async fn test_dns_failure_skips_connect() {
        let result = probe_endpoint(&Unresolvable, "svc.internal", 443, TIMEOUT).await;

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address, None);
        assert_eq!(result.response_time_ms, None);
        assert_eq!(
            result.error_message.as_deref(),
            Some("DNS resolution failed: no addresses found for svc.internal")
        );
    }

    #[tokio::test]
    async fn test_invalid_tld_does_not_resolve() {
        let result = probe_endpoint(&SystemResolver, "no-such-host.invalid", 443, TIMEOUT).await;

        assert!(!result.is_reachable);
        assert_eq!(result.ip_address, None);
        let message = result.error_message.expect("error message");
        assert!(message.starts_with("DNS resolution failed"), "{message}");
    }

    #[tokio::test]
    async fn test_prober_uses_its_resolver() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let prober = TcpProber::new(Localhost);
        let result = prober.probe("anything", port, TIMEOUT).await;
        assert!(result.is_reachable);
    }

    #[tokio::test]
    #[ignore = "needs outbound internet access"]
    async fn test_public_host_is_reachable() {
        let result = probe_endpoint(&SystemResolver, "example.com", 443, TIMEOUT).await;

        assert!(result.is_reachable, "{:?}", result.error_message);
        assert!(result.ip_address.is_some());
        assert!(result.response_time_ms.is_some_and(|ms| ms > 0.0));
    }
}
