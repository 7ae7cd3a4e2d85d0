use crate::options::Options;
use std::fmt;
use std::time::Duration;

/// Client-level timeout tuned for a co-located backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Clone)]
pub struct ProducerConfig {
    /// Base URL of the backend, e.g. `http://localhost:8080`
    pub host: String,
    /// Opaque token sent as `Authorization: Basic <token>`
    pub token: String,
    /// Upper bound for a whole publish request, including reading the ack
    pub timeout: Duration,
    pub user_agent: String,
    /// Options applied when an input carries none
    pub default_options: Options,
}

// Keeps the token out of logs.
impl fmt::Debug for ProducerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("default_options", &self.default_options)
            .finish()
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8080".to_string(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("workqueue/", env!("CARGO_PKG_VERSION")).to_string(),
            default_options: Options::default(),
        }
    }
}

pub struct ProducerConfigBuilder {
    config: ProducerConfig,
}

impl ProducerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProducerConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout = Duration::from_millis(ms);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn default_options(mut self, options: Options) -> Self {
        self.config.default_options = options;
        self
    }

    pub fn build(self) -> ProducerConfig {
        self.config
    }
}

impl Default for ProducerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
