use std::env;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
};

use super::model::ProbeConfig;
use crate::tcp_probe::prelude::{DnsResolver, SystemResolver};

const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid DNS host {host:?}: {source}")]
    DnsHost {
        host: String,
        source: std::net::AddrParseError,
    },

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

pub struct AppConfig {
    pub probe: ProbeConfig,
    pub dns_hosts: Vec<String>,
    pub max_endpoint_width: usize,
}

/// Load the application configuration from a YAML file and environment variables.
/// A `.env` file in the working directory is applied first. `CONFIG_FILE` points at the
/// YAML file (default `config.yml`, which may be absent), `TEST_ENDPOINTS` replaces the
/// endpoint list and `DNS_HOSTS` selects the name servers to query.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    load_config_from(|key| env::var(key).ok())
}

fn load_config_from(var: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
    let explicit_file = var("CONFIG_FILE");
    let path = explicit_file
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let mut probe = match std::fs::read_to_string(&path) {
        Ok(contents) => serde_yaml::from_str::<ProbeConfig>(&contents)
            .map_err(|source| ConfigError::Yaml { path: path.clone(), source })?,
        Err(e) if e.kind() == ErrorKind::NotFound && explicit_file.is_none() => {
            tracing::debug!("No {} found, using default configuration", path);
            ProbeConfig::default()
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    if let Some(endpoints) = var("TEST_ENDPOINTS") {
        probe.endpoints = split_list(&endpoints);
    }
    if probe.endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints);
    }
    if probe.timeout_ms == 0 {
        return Err(ConfigError::ZeroTimeout);
    }

    let dns_hosts = var("DNS_HOSTS").map(|hosts| split_list(&hosts)).unwrap_or_default();
    if dns_hosts.is_empty() {
        tracing::info!("Using the system DNS resolver");
    } else {
        tracing::info!("Using DNS hosts: {:?}", dns_hosts);
    }

    let max_endpoint_width = probe.endpoints.iter().map(|e| e.len()).max().unwrap_or(10);

    Ok(AppConfig {
        probe,
        dns_hosts,
        max_endpoint_width,
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Setup the resolver used by the probes.
/// Without DNS hosts this is the platform resolver. Otherwise a `TokioAsyncResolver`
/// queries the given hosts over TCP, two attempts each bounded by half the probe timeout.
pub fn setup_resolver(dns_hosts: &[String], timeout: Duration) -> Result<DnsResolver, ConfigError> {
    if dns_hosts.is_empty() {
        return Ok(DnsResolver::System(SystemResolver));
    }

    let mut opts = ResolverOpts::default();
    opts.attempts = 2;
    opts.timeout = timeout / 2;

    let mut name_servers = NameServerConfigGroup::new();

    for host in dns_hosts {
        let ip: IpAddr = host.parse().map_err(|source| ConfigError::DnsHost {
            host: host.clone(),
            source,
        })?;
        name_servers.push(NameServerConfig {
            socket_addr: (ip, 53).into(),
            protocol: Protocol::Tcp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
    }

    let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
    Ok(DnsResolver::NameServers(TokioAsyncResolver::tokio(resolver_config, opts)))
}
