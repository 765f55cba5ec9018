//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_stale_time_secs() -> u64 {
    300
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub templates_dir: String,
    /// Key used to sign flash message cookies; at least 64 bytes.
    pub secret: String,
    /// Base URL of the Remote Contact Store, without the `/contacts` suffix.
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long a cached page is served without refetching.
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    /// Cross-check every page against a locally sliced full listing.
    #[serde(default)]
    pub page_consistency_fallback: bool,
    /// Generate UUID identifiers on create instead of letting the store
    /// assign them.
    #[serde(default)]
    pub assign_client_ids: bool,
}
