//! Menu view cache.
//!
//! Cached views (full menu, filtered menus, filter options) live in Redis
//! under the `menu:` namespace so one prefix delete clears every view.
//! The cache is an optimization, never a correctness dependency: every
//! backend failure degrades to a miss or a no-op.

mod config;
mod keys;
mod store;

pub use config::CacheConfig;
pub use keys::{FILTER_OPTIONS_KEY, FULL_MENU_KEY, MENU_NAMESPACE, filtered_menu_key};
pub use store::{CacheBackend, CacheBackendError, MenuCache, RedisBackend};
