use std::{fmt, str::FromStr};

use thy_store::StoreType;
use tracing::warn;

use crate::{CacheError, CacheScope};

/// The order in which the cache and the server are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Always ask the server. Nothing is read from or written to the cache.
    #[default]
    Never,
    /// Ask the server, fall back to any cached copy when it fails.
    ServerThenCache,
    /// Use a fresh cached copy, otherwise ask the server.
    CacheThenServer,
    /// Use a fresh cached copy, otherwise ask the server, and as a last resort an expired copy.
    CacheThenServerThenExpired,
}

impl CacheStrategy {
    /// The `cache.strategy` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStrategy::Never => "server",
            CacheStrategy::ServerThenCache => "server.cache",
            CacheStrategy::CacheThenServer => "cache.server",
            CacheStrategy::CacheThenServerThenExpired => "cache.server.expired",
        }
    }

    /// Parse a tag, treating an unknown tag like [`CacheStrategy::Never`].
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_else(|e: CacheError| {
            warn!("{e}. Requesting secrets from server.");
            CacheStrategy::Never
        })
    }

    /// Whether the cache is used at all.
    pub fn is_enabled(&self) -> bool {
        *self != CacheStrategy::Never
    }

    /// Whether a fresh cached copy is preferred over the server.
    pub fn prefers_cache(&self) -> bool {
        matches!(
            self,
            CacheStrategy::CacheThenServer | CacheStrategy::CacheThenServerThenExpired
        )
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "server" => Ok(CacheStrategy::Never),
            "server.cache" => Ok(CacheStrategy::ServerThenCache),
            "cache.server" => Ok(CacheStrategy::CacheThenServer),
            "cache.server.expired" => Ok(CacheStrategy::CacheThenServerThenExpired),
            other => Err(CacheError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Cache settings for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Consistency strategy.
    pub strategy: CacheStrategy,
    /// Minutes after which a cached entry is expired.
    pub age_minutes: i64,
    /// Backend holding the cached entries.
    pub store_type: StoreType,
    /// Roots of the active profile's entries.
    pub scope: CacheScope,
}
