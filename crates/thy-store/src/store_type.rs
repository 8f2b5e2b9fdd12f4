use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

use tracing::debug;

use crate::{FileStore, KeyStore, KeyringHelper, NoneStore, SecureStore, StoreError};

/// The service name under which keyring entries are created.
pub const KEYRING_SERVICE: &str = "thy";

/// The supported store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    /// One file per key inside a directory.
    #[default]
    File,
    /// The OS credential manager.
    Keyring,
    /// Nothing is persisted.
    None,
}

impl StoreType {
    /// The canonical tag of this store type.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::File => "file",
            StoreType::Keyring => "keyring",
            StoreType::None => "none",
        }
    }

    /// Whether values stored in this backend are protected by the operating system.
    pub fn is_secure(&self) -> bool {
        matches!(self, StoreType::Keyring)
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = StoreError;

    /// Parses a `store.type` tag. The empty tag selects the file store.
    ///
    /// `pass_linux` and `wincred` are accepted for existing configurations and resolve to the
    /// keyring backend on the one OS where they make sense. On Linux that is the session scoped
    /// kernel keyring.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "file" => Ok(StoreType::File),
            "none" => Ok(StoreType::None),
            "keyring" => Ok(StoreType::Keyring),
            "pass_linux" => require_os(s, "linux"),
            "wincred" => require_os(s, "windows"),
            other => Err(StoreError::UnsupportedStoreType(other.to_string())),
        }
    }
}

fn require_os(store_type: &str, os: &'static str) -> Result<StoreType, StoreError> {
    if std::env::consts::OS == os {
        Ok(StoreType::Keyring)
    } else {
        Err(StoreError::UnsupportedPlatform {
            store_type: store_type.to_string(),
            os,
        })
    }
}

/// Creates the store backend for `store_type`.
///
/// `base_path` is only used by the file store and defaults to `~/.thy`.
pub fn create_store(
    store_type: StoreType,
    base_path: Option<PathBuf>,
) -> Result<Arc<dyn KeyStore>, StoreError> {
    debug!(%store_type, "Creating store");

    Ok(match store_type {
        StoreType::None => Arc::new(NoneStore),
        StoreType::Keyring => Arc::new(SecureStore::new(KeyringHelper::new(KEYRING_SERVICE))),
        StoreType::File => {
            let path = match base_path {
                Some(path) => path,
                None => FileStore::default_path()?,
            };
            Arc::new(FileStore::new(path))
        }
    })
}

/// The current user's home directory.
pub fn home_dir() -> Result<PathBuf, StoreError> {
    #[cfg(target_os = "windows")]
    {
        let profile = std::env::var("USERPROFILE").map_err(|_| StoreError::HomeDirNotFound)?;
        Ok(PathBuf::from(profile))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").map_err(|_| StoreError::HomeDirNotFound)?;
        Ok(PathBuf::from(home))
    }
}
