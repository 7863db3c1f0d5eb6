// Configuration module entry point
// Loads layered configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use state::AppState;
pub use types::Config;

use crate::cli::Args;

/// Config file used when `--config` is not given (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "relay";

/// Fixed human-readable message of the proxy error envelope
pub const DEFAULT_ERROR_MESSAGE: &str = "代理请求失败";

impl Config {
    /// Load configuration: defaults, then the config file, then `RELAY_*`
    /// environment variables, then command-line overrides.
    pub fn load(args: &Args) -> Result<Self, config::ConfigError> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        let builder = Self::builder(config_path)?
            .set_override_option("server.host", args.host.clone())?
            .set_override_option("server.port", args.port)?
            .set_override_option("static.root", args.root.clone())?;

        builder.build()?.try_deserialize()
    }

    /// Load configuration from specified file path (without extension),
    /// ignoring command-line overrides
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder(config_path)?.build()?.try_deserialize()
    }

    fn builder(
        config_path: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("server.connection_timeout_secs", 60)?
            .set_default("server.shutdown_grace_secs", 5)?
            .set_default("static.root", ".")?
            .set_default("static.default_document", "weather-demo.html")?
            .set_default("proxy.path_prefix", "/api/proxy")?
            .set_default("proxy.timeout_secs", 10)?
            .set_default("proxy.max_body_size", 10_485_760)? // 10MB
            .set_default("proxy.error_message", DEFAULT_ERROR_MESSAGE)?
            .set_default("logging.access_log", true)?
            .set_default("logging.format", "default")?
            .set_default("cors.on_errors", false)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub const fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.timeout_secs)
    }
}
