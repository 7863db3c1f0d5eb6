// Application state module
// Immutable per-process state shared by every connection task

use super::types::Config;
use crate::handler::router::RouteTable;

/// `User-Agent` sent on every outbound proxy call
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
    /// Outbound client for proxy dispatch. Idle connections are never kept,
    /// so every dispatch opens a fresh upstream connection.
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.proxy_timeout())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            config: config.clone(),
            routes: RouteTable::relay(&config.proxy.path_prefix),
            client,
        })
    }
}
