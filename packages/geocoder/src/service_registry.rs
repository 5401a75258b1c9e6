//! Compile-time embedded geocoding service configuration.
//!
//! The default Nominatim endpoint and its pacing policy live in
//! `services/nominatim.toml`, embedded at compile time and exposed via
//! [`nominatim_service`]. Command-line flags override individual fields.

use std::time::Duration;

use serde::Deserialize;

/// A Nominatim service configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NominatimService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// `User-Agent` sent with every request. The public instance rejects
    /// anonymous clients.
    pub user_agent: String,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional comma-separated ISO country codes to restrict matches to.
    #[serde(default)]
    pub country_codes: Option<String>,
}

impl NominatimService {
    /// Minimum delay between consecutive requests.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

/// Returns the embedded default Nominatim configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn nominatim_service() -> NominatimService {
    toml::de::from_str(NOMINATIM_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'nominatim': {e}"))
}
