/// Short service names and the private-link hostname each one is tested against.
pub const SERVICE_ENDPOINTS: &[(&str, &str)] = &[
    ("openai", "privatelink.openai.azure.com"),
    ("cosmos", "privatelink.documents.azure.com"),
    ("storage", "privatelink.blob.core.windows.net"),
    ("keyvault", "privatelink.vaultcore.azure.net"),
    ("apim", "privatelink.azure-api.net"),
];

/// Case-insensitive lookup of a service's private-link hostname.
pub fn endpoint_for(service_name: &str) -> Option<&'static str> {
    let name = service_name.to_lowercase();
    SERVICE_ENDPOINTS
        .iter()
        .find(|(service, _)| *service == name)
        .map(|(_, endpoint)| *endpoint)
}
