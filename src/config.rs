use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

/// Where and how often to poll the bot API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the dashboard HTTP API binds to.
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub summary_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            poll_interval_ms: 5000,
            request_timeout_secs: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            summary_interval_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (.env file) with defaults.
    ///
    /// Optional env vars:
    ///   BOT_API_BASE_URL — bot API base address (default: http://localhost:8000)
    ///   POLL_INTERVAL_MS — opportunity poll interval (default: 5000)
    ///   REQUEST_TIMEOUT_SECS — per-request timeout (default: 10)
    ///   DASHBOARD_BIND_ADDR — dashboard listen address (default: 127.0.0.1:8080)
    ///   TELEMETRY_SUMMARY_SECS — feed summary log interval (default: 30)
    ///   RUST_LOG — log level (default: info)
    pub fn load_or_default() -> Self {
        let _ = dotenv::dotenv();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("BOT_API_BASE_URL") {
            if !url.is_empty() {
                config.api.base_url = url;
            }
        }
        if let Ok(ms) = std::env::var("POLL_INTERVAL_MS") {
            config.api.poll_interval_ms = ms.parse().unwrap_or(config.api.poll_interval_ms);
        }
        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            config.api.request_timeout_secs =
                secs.parse().unwrap_or(config.api.request_timeout_secs);
        }
        if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
            if !addr.is_empty() {
                config.server.bind_addr = addr;
            }
        }
        if let Ok(secs) = std::env::var("TELEMETRY_SUMMARY_SECS") {
            config.telemetry.summary_interval_secs =
                secs.parse().unwrap_or(config.telemetry.summary_interval_secs);
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.telemetry.log_level = level;
        }

        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("BOT_API_BASE_URL is not a valid URL: {}", self.api.base_url))?;
        self.server
            .bind_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| {
                format!(
                    "DASHBOARD_BIND_ADDR is not a valid address: {}",
                    self.server.bind_addr
                )
            })?;
        anyhow::ensure!(
            self.api.poll_interval_ms >= 500,
            "POLL_INTERVAL_MS under 500 would hammer the bot API"
        );
        anyhow::ensure!(
            self.api.request_timeout_secs > 0,
            "REQUEST_TIMEOUT_SECS must be positive"
        );
        Ok(())
    }
}
