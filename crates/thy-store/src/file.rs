//! Directory backed store.
//!
//! Every key lives in its own file inside the base directory. Keys may contain characters that
//! are not valid in file names (`/`, `:`), so file names are the percent-encoded key.
//!
//! - Directory is created with `0700` permissions (Unix)
//! - Files are written with `0600` permissions (Unix)
//! - Writes go to a hidden temporary file which is then renamed over the target, so a crash
//!   never leaves a half written entry behind

use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{home_dir, KeyStore, StoreError, StoreType};

const DEFAULT_BASE_DIR: &str = ".thy";

/// Characters left as is in file names. Everything else, including `.`, is encoded so that
/// encoded names never start with a dot and never collide with temporary files.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// A store writing one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `base_path`. The directory is created on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The default location, `~/.thy`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        Ok(home_dir()?.join(DEFAULT_BASE_DIR))
    }

    /// The directory holding the entries.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(encode_key(key))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            tokio::fs::set_permissions(&self.base_path, perms).await?;
        }

        Ok(())
    }
}

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, FILE_NAME).to_string()
}

fn decode_file_name(name: &str) -> Option<String> {
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

#[async_trait::async_trait]
impl KeyStore for FileStore {
    fn store_type(&self) -> StoreType {
        StoreType::File
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_raw(&self, key: &str, data: &str) -> Result<(), StoreError> {
        self.ensure_dir().await?;

        let target = self.path_for(key);
        let temp = self.base_path.join(format!(".{}.tmp", encode_key(key)));

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp).await?;
        file.write_all(data.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp, &target).await?;
        debug!(key, "Stored entry on disk");

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            // Temporary files from interrupted writes
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = decode_file_name(name) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
