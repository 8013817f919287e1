use crate::config::{Config, PLACEHOLDER_API_KEY};

/// Narrow credential lookup seam. The pipeline never reads the process
/// environment or the config file directly; it asks one of these.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != PLACEHOLDER_API_KEY)
    }
}

/// Reads credentials from the loaded config file.
pub struct ConfigCredentials<'a> {
    config: &'a Config,
}

impl<'a> ConfigCredentials<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl CredentialStore for ConfigCredentials<'_> {
    fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "GROK_API_KEY" => self.config.grok_api_key.clone(),
            _ => None,
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != PLACEHOLDER_API_KEY)
    }
}

/// Environment takes precedence over the config file.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    EnvCredentials
        .get("GROK_API_KEY")
        .or_else(|| ConfigCredentials::new(config).get("GROK_API_KEY"))
}
