//! Cache configuration.

use std::time::Duration;

use serde::Deserialize;

// TTLs carried over from the original deployment: filtered views expire
// fastest, the filter-option vocabulary slowest.
const DEFAULT_FULL_MENU_TTL_SECS: u64 = 3600;
const DEFAULT_FILTERED_MENU_TTL_SECS: u64 = 1800;
const DEFAULT_FILTER_OPTIONS_TTL_SECS: u64 = 7200;
const DEFAULT_OP_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the Redis view cache. When off, every lookup is a miss.
    pub enabled: bool,
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: Option<String>,
    /// TTL for the whole-document view.
    pub full_menu_ttl_secs: u64,
    /// TTL for filtered views.
    pub filtered_menu_ttl_secs: u64,
    /// TTL for the filter-options view.
    pub filter_options_ttl_secs: u64,
    /// Deadline for any single cache operation.
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            full_menu_ttl_secs: DEFAULT_FULL_MENU_TTL_SECS,
            filtered_menu_ttl_secs: DEFAULT_FILTERED_MENU_TTL_SECS,
            filter_options_ttl_secs: DEFAULT_FILTER_OPTIONS_TTL_SECS,
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
        }
    }
}

impl CacheConfig {
    pub fn full_menu_ttl(&self) -> Duration {
        Duration::from_secs(self.full_menu_ttl_secs)
    }

    pub fn filtered_menu_ttl(&self) -> Duration {
        Duration::from_secs(self.filtered_menu_ttl_secs)
    }

    pub fn filter_options_ttl(&self) -> Duration {
        Duration::from_secs(self.filter_options_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            url: settings.url.clone(),
            full_menu_ttl_secs: settings.full_menu_ttl_secs,
            filtered_menu_ttl_secs: settings.filtered_menu_ttl_secs,
            filter_options_ttl_secs: settings.filter_options_ttl_secs,
            op_timeout_ms: settings.op_timeout_ms,
        }
    }
}
