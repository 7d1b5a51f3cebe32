use std::env;
use std::time::Duration;

/// Connection settings for the hosted image-generation provider.
///
/// The endpoint and credential are required when building a
/// [`crate::provider::ProviderClient`]; everything else defaults to the
/// provider's documented limits.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub endpoint_url: Option<String>,
    pub credential: Option<String>,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub provider: ProviderConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            endpoint_url: None,
            credential: None,
            connect_timeout: Duration::from_secs(10),
            total_timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let endpoint_url = env::var("PROVIDER_ENDPOINT_URL").ok();
        let credential = env::var("PROVIDER_API_KEY").ok();

        let mut config = ProviderConfig {
            endpoint_url,
            credential,
            ..Default::default()
        };

        if let Some(secs) = env::var("PROVIDER_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env::var("PROVIDER_TOTAL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.total_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env::var("PROVIDER_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.max_retries = retries;
        }

        config
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.total_timeout = total;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            provider: ProviderConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }
}
