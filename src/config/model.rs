use std::time::Duration;

use serde::Deserialize;

/// Probe configuration for zoneprobe.
/// Every field is optional in the YAML file and falls back to the landing zone defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// The private-link hostnames to probe, in reporting order.
    pub endpoints: Vec<String>,

    /// The TCP port every endpoint is probed on.
    pub port: u16,

    /// Upper bound for DNS resolution and for the TCP connect, each.
    pub timeout_ms: u64,

    /// The pause between sweeps in watch mode.
    pub polling_interval_seconds: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            endpoints: default_endpoints(),
            port: 443,
            timeout_ms: 5000,
            polling_interval_seconds: 30,
        }
    }
}

fn default_endpoints() -> Vec<String> {
    [
        "privatelink.openai.azure.com",
        "privatelink.documents.azure.com",
        "privatelink.blob.core.windows.net",
        "privatelink.services.ai.azure.com",
        "privatelink.cognitiveservices.azure.com",
        "privatelink.vaultcore.azure.net",
        "privatelink.azurecr.io",
        "privatelink.azconfig.io",
        "privatelink.azure-api.net",
    ]
    .iter()
    .map(|endpoint| endpoint.to_string())
    .collect()
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.endpoints.len(), 9);
        assert_eq!(config.endpoints[0], "privatelink.openai.azure.com");
        assert_eq!(config.endpoints[8], "privatelink.azure-api.net");
        assert_eq!(config.port, 443);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_probe_config_deserialization() {
        let yaml = r#"
                    endpoints:
                        - privatelink.openai.azure.com
                        - privatelink.vaultcore.azure.net
                    timeout_ms: 1500
                    "#;

        let config: ProbeConfig = serde_yaml::from_str(yaml).expect("Invalid YAML");
        assert_eq!(
            config.endpoints,
            vec!["privatelink.openai.azure.com", "privatelink.vaultcore.azure.net"]
        );
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        // unspecified fields keep their defaults
        assert_eq!(config.port, 443);
        assert_eq!(config.polling_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ProbeConfig = serde_yaml::from_str("{}").expect("Invalid YAML");
        assert_eq!(config, ProbeConfig::default());
    }
}
