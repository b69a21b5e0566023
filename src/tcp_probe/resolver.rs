use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use tokio::net::lookup_host;
use trust_dns_resolver::TokioAsyncResolver;

use super::error::LookupError;

/// Turns a hostname into the addresses it resolves to.
pub trait HostResolver: Send + Sync {
    fn lookup(&self, host: &str) -> impl Future<Output = Result<Vec<IpAddr>, LookupError>> + Send;
}

/// The platform resolver (getaddrinfo and friends).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let addrs = lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Either the platform resolver or a resolver that queries explicit name servers.
#[derive(Clone)]
pub enum DnsResolver {
    System(SystemResolver),
    NameServers(TokioAsyncResolver),
}

impl HostResolver for DnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        match self {
            DnsResolver::System(system) => system.lookup(host).await,
            DnsResolver::NameServers(resolver) => {
                let response = resolver.lookup_ip(host).await?;
                Ok(response.iter().collect())
            }
        }
    }
}

/// Resolves `host` to a single address, bounded by `timeout`.
/// IPv4 addresses win over IPv6 when both are returned.
pub async fn resolve<R: HostResolver>(
    resolver: &R,
    host: &str,
    timeout: Duration,
) -> Result<IpAddr, LookupError> {
    let addrs = tokio::time::timeout(timeout, resolver.lookup(host))
        .await
        .map_err(|_| LookupError::TimedOut(timeout))??;

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| LookupError::NoAddress(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    struct Fixed(Vec<IpAddr>);

    impl HostResolver for Fixed {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
            Ok(self.0.clone())
        }
    }

    struct Stalled;

    impl HostResolver for Stalled {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_prefers_ipv4() {
        let resolver = Fixed(vec![
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)),
        ]);
        let ip = resolve(&resolver, "host", Duration::from_secs(1)).await.expect("resolves");
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)));
    }

    #[tokio::test]
    async fn test_falls_back_to_ipv6() {
        let resolver = Fixed(vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]);
        let ip = resolve(&resolver, "host", Duration::from_secs(1)).await.expect("resolves");
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let err = resolve(&Fixed(vec![]), "host", Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "no addresses found for host");
    }

    #[tokio::test]
    async fn test_lookup_is_bounded_by_timeout() {
        let err = resolve(&Stalled, "host", Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, LookupError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_system_resolver_handles_literal_addresses() {
        let ip = resolve(&SystemResolver, "127.0.0.1", Duration::from_secs(5))
            .await
            .expect("literal resolves");
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
