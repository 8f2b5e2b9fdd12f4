#![doc = include_str!("../README.md")]

/// The key/value store interface shared by all backends.
pub mod store;

/// Store type tags and the factory that turns them into a backend.
pub mod store_type;

mod file;
mod none;
mod secure;

pub use file::FileStore;
pub use none::NoneStore;
pub use secure::{CredentialError, CredentialHelper, KeyringHelper, KeyringStore, SecureStore};
pub use store::{KeyStore, KeyStoreExt, StoreError};
pub use store_type::{create_store, home_dir, StoreType};
