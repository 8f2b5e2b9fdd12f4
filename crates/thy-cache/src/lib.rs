#![doc = include_str!("../README.md")]

mod cache;
mod config;
mod entry;
mod error;
mod key;

pub use cache::{bust_cache, SecretCache, SecretView};
pub use config::{CacheConfig, CacheStrategy};
pub use entry::CachedSecret;
pub use error::{CacheError, ReadError};
pub use key::{derive_cache_key, CacheNamespace, CacheScope};
