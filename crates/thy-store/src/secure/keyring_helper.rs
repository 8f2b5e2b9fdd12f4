use std::{collections::BTreeSet, fmt, sync::Arc};

use super::{CredentialError, CredentialHelper};

/// Entry holding the JSON array of every key written through this helper.
///
/// Keyrings offer no way to enumerate entries, but `list` and `wipe` need one.
const INDEX_USER: &str = "__index__";

type EntryFactory = dyn Fn(&str, &str) -> ::keyring::Result<::keyring::Entry> + Send + Sync;

/// Credential helper backed by the platform keyring (Keychain, Credential Manager or the
/// kernel keyring on Linux).
///
/// On Linux the kernel keyring is scoped to the login session, so cached entries do not
/// survive a logout or reboot. Use the `file` store to keep them longer.
#[derive(Clone)]
pub struct KeyringHelper {
    service: String,
    new_entry: Arc<EntryFactory>,
}

impl KeyringHelper {
    /// Create a helper storing entries under `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_entries(service, ::keyring::Entry::new)
    }

    /// Create a helper whose entries are built by `new_entry` instead of the platform keyring.
    pub fn with_entries(
        service: impl Into<String>,
        new_entry: impl Fn(&str, &str) -> ::keyring::Result<::keyring::Entry> + Send + Sync + 'static,
    ) -> Self {
        Self {
            service: service.into(),
            new_entry: Arc::new(new_entry),
        }
    }

    fn entry(&self, user: &str) -> Result<::keyring::Entry, CredentialError> {
        Ok((self.new_entry)(&self.service, user)?)
    }

    fn read_index(&self) -> Result<BTreeSet<String>, CredentialError> {
        match self.entry(INDEX_USER)?.get_password() {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| CredentialError(format!("Corrupt keyring index: {e}"))),
            Err(::keyring::Error::NoEntry) => Ok(BTreeSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_index(&self, index: &BTreeSet<String>) -> Result<(), CredentialError> {
        let raw = serde_json::to_string(index)
            .map_err(|e| CredentialError(format!("Failed to encode keyring index: {e}")))?;
        Ok(self.entry(INDEX_USER)?.set_password(&raw)?)
    }
}

impl fmt::Debug for KeyringHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringHelper")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl From<::keyring::Error> for CredentialError {
    fn from(e: ::keyring::Error) -> Self {
        CredentialError(e.to_string())
    }
}

impl CredentialHelper for KeyringHelper {
    fn name(&self) -> &'static str {
        "keyring"
    }

    /// The key is indexed before the credential is written, so `list` and `wipe` can always
    /// reach it.
    fn add(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        let mut index = self.read_index()?;
        if index.insert(key.to_string()) {
            self.write_index(&index)?;
        }

        Ok(self.entry(key)?.set_password(secret)?)
    }

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), CredentialError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(::keyring::Error::NoEntry) => {}
            Err(e) => return Err(e.into()),
        }

        let mut index = self.read_index()?;
        if index.remove(key) {
            self.write_index(&index)?;
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, CredentialError> {
        Ok(self
            .read_index()?
            .into_iter()
            .filter(|key| key.starts_with(prefix) && key != INDEX_USER)
            .collect())
    }
}
