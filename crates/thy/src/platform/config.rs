//! CLI settings.
//!
//! Settings come from a named profile in a YAML file (`~/.thy.yml` unless `--config` says
//! otherwise), overridden by flags and environment variables:
//!
//! ```yaml
//! default:
//!   tenant: acme
//!   store:
//!     type: file
//!   cache:
//!     strategy: cache.server
//!     age: 10
//! ```

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use thy_api::ApiConfiguration;
use thy_cache::{CacheConfig, CacheScope, CacheStrategy};
use thy_store::{create_store, home_dir, KeyStore, StoreError, StoreType};
use tracing::debug;

/// The profile used when none is selected.
pub const DEFAULT_PROFILE: &str = "default";

const CONFIG_FILE_NAME: &str = ".thy.yml";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// Location of the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The config file is not valid YAML or has unexpected values.
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        /// Location of the config file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// The selected profile does not exist.
    #[error("Profile '{0}' not found in config file")]
    ProfileNotFound(String),

    /// A command needs the server but no tenant is set.
    #[error("No tenant configured. Set `tenant` in the profile or pass --tenant")]
    MissingTenant,

    /// Invalid store settings.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Flags selecting and overriding settings. Available on every command.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    #[arg(
        long,
        global = true,
        env = "THY_PROFILE",
        default_value = DEFAULT_PROFILE,
        help = "Configuration profile to use."
    )]
    pub profile: String,

    #[arg(
        long,
        global = true,
        env = "THY_CONFIG",
        value_name = "FILE",
        help = "Config file to read instead of ~/.thy.yml."
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Tenant name, the first part of the API host.")]
    pub tenant: Option<String>,

    #[arg(long, global = true, help = "Domain of the API host.")]
    pub domain: Option<String>,

    #[arg(
        long,
        global = true,
        env = "THY_AUTH_TOKEN",
        hide_env_values = true,
        help = "Access token sent with every request."
    )]
    pub auth_token: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "STRATEGY",
        help = "One of server, server.cache, cache.server, cache.server.expired."
    )]
    pub cache_strategy: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "MINUTES",
        allow_negative_numbers = true,
        help = "Minutes after which cached secrets expire."
    )]
    pub cache_age: Option<i64>,

    #[arg(
        long,
        global = true,
        value_name = "TYPE",
        help = "Where to keep cached data: file, keyring or none."
    )]
    pub store_type: Option<String>,
}

/// One profile of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Full API address, replacing scheme, tenant, domain and port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub store: StoreSettings,
    pub cache: CacheSettings,
}

/// The `store` section of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub store_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// The `cache` section of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

/// The resolved settings of one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub profile_name: String,
    pub profile: Profile,
    auth_token: Option<String>,
}

impl Settings {
    /// Read the selected profile and apply the flag overrides.
    pub fn load(args: &ConfigArgs) -> Result<Self, ConfigError> {
        let path = match &args.config {
            Some(path) => Some(path.clone()),
            None => default_config_path(),
        };
        let profile = match path {
            Some(path) => load_profile(&path, &args.profile, args.config.is_some())?,
            None => Profile::default(),
        };

        Ok(Self::from_profile(args, profile))
    }

    fn from_profile(args: &ConfigArgs, mut profile: Profile) -> Self {
        override_with(&mut profile.tenant, &args.tenant);
        override_with(&mut profile.domain, &args.domain);
        override_with(&mut profile.store.store_type, &args.store_type);
        override_with(&mut profile.cache.strategy, &args.cache_strategy);
        if args.cache_age.is_some() {
            profile.cache.age = args.cache_age;
        }

        Self {
            profile_name: args.profile.clone(),
            profile,
            auth_token: args.auth_token.clone(),
        }
    }

    /// Where and how to reach the API. Fails when no tenant is configured.
    pub fn api_configuration(&self) -> Result<ApiConfiguration, ConfigError> {
        let profile = &self.profile;
        let tenant = profile
            .tenant
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingTenant)?;

        let defaults = ApiConfiguration::default();
        Ok(ApiConfiguration {
            tenant,
            domain: profile.domain.clone().unwrap_or(defaults.domain),
            scheme: profile.scheme.clone().unwrap_or(defaults.scheme),
            port: profile.port,
            api_version: profile.api_version.clone().unwrap_or(defaults.api_version),
            api_url: profile.api_url.clone(),
            auth_token: self.auth_token.clone(),
            ..defaults
        })
    }

    /// The cache settings. Fails on an unknown store type.
    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        let cache = &self.profile.cache;
        Ok(CacheConfig {
            strategy: CacheStrategy::from_tag(cache.strategy.as_deref().unwrap_or_default()),
            age_minutes: cache.age.unwrap_or_default(),
            store_type: self.store_type()?,
            scope: self.cache_scope(),
        })
    }

    /// Where this profile's entries live in the store.
    pub fn cache_scope(&self) -> CacheScope {
        CacheScope::for_profile(&self.profile_name)
    }

    /// The configured store backend.
    pub fn store(&self) -> Result<Arc<dyn KeyStore>, ConfigError> {
        let path = self
            .profile
            .store
            .path
            .as_deref()
            .map(expand_home)
            .transpose()?;

        Ok(create_store(self.store_type()?, path)?)
    }

    fn store_type(&self) -> Result<StoreType, ConfigError> {
        Ok(self
            .profile
            .store
            .store_type
            .as_deref()
            .unwrap_or_default()
            .parse()?)
    }
}

fn override_with(value: &mut Option<String>, flag: &Option<String>) {
    if flag.is_some() {
        value.clone_from(flag);
    }
}

fn default_config_path() -> Option<PathBuf> {
    home_dir().ok().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Read `name` from the config file at `path`.
///
/// A missing file is only an error when it was asked for explicitly. A missing profile is only an
/// error when it is not the default one.
fn load_profile(path: &Path, name: &str, explicit: bool) -> Result<Profile, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
            debug!(path = %path.display(), "No config file found");
            String::new()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut profiles: BTreeMap<String, Profile> = if contents.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    match profiles.remove(name) {
        Some(profile) => Ok(profile),
        None if name == DEFAULT_PROFILE => Ok(Profile::default()),
        None => Err(ConfigError::ProfileNotFound(name.to_string())),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return Ok(home_dir()?);
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONFIG: &str = r#"
default:
  tenant: acme
  store:
    type: none
  cache:
    strategy: cache.server
    age: 10
eu:
  tenant: acme-eu
  domain: secretsvaultcloud.eu
  port: 8443
"#;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn args(file: &tempfile::NamedTempFile, profile: &str) -> ConfigArgs {
        ConfigArgs {
            profile: profile.to_string(),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_loads_selected_profile() {
        let file = config_file(CONFIG);

        let settings = Settings::load(&args(&file, "eu")).unwrap();
        let api = settings.api_configuration().unwrap();

        assert_eq!(api.base_url(), "https://acme-eu.secretsvaultcloud.eu:8443/v1");
    }

    #[test]
    fn test_cache_settings_from_profile() {
        let file = config_file(CONFIG);

        let settings = Settings::load(&args(&file, DEFAULT_PROFILE)).unwrap();
        let cache = settings.cache_config().unwrap();

        assert_eq!(cache.strategy, CacheStrategy::CacheThenServer);
        assert_eq!(cache.age_minutes, 10);
        assert_eq!(cache.store_type, StoreType::None);
    }

    #[test]
    fn test_flags_override_profile() {
        let file = config_file(CONFIG);
        let args = ConfigArgs {
            tenant: Some("other".to_string()),
            cache_strategy: Some("server.cache".to_string()),
            cache_age: Some(2),
            auth_token: Some("token".to_string()),
            ..args(&file, DEFAULT_PROFILE)
        };

        let settings = Settings::load(&args).unwrap();
        let api = settings.api_configuration().unwrap();
        let cache = settings.cache_config().unwrap();

        assert_eq!(api.tenant, "other");
        assert_eq!(api.auth_token.as_deref(), Some("token"));
        assert_eq!(cache.strategy, CacheStrategy::ServerThenCache);
        assert_eq!(cache.age_minutes, 2);
    }

    #[test]
    fn test_cache_scope_follows_profile() {
        let file = config_file(CONFIG);

        let default = Settings::load(&args(&file, DEFAULT_PROFILE)).unwrap();
        let eu = Settings::load(&args(&file, "eu")).unwrap();

        assert_eq!(default.cache_config().unwrap().scope, CacheScope::default());
        assert_eq!(eu.cache_config().unwrap().scope, CacheScope::for_profile("eu"));
        assert_ne!(default.cache_scope(), eu.cache_scope());
    }

    #[test]
    fn test_unknown_profile() {
        let file = config_file(CONFIG);

        let err = Settings::load(&args(&file, "staging")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound(name) if name == "staging"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConfigArgs {
            profile: DEFAULT_PROFILE.to_string(),
            config: Some(dir.path().join("missing.yml")),
            ..Default::default()
        };

        assert!(matches!(
            Settings::load(&args),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_missing_tenant() {
        let file = config_file("default:\n  cache:\n    strategy: server\n");

        let settings = Settings::load(&args(&file, DEFAULT_PROFILE)).unwrap();
        assert!(matches!(
            settings.api_configuration(),
            Err(ConfigError::MissingTenant)
        ));
    }

    #[test]
    fn test_unknown_store_type() {
        let file = config_file("default:\n  store:\n    type: vault9000\n");

        let settings = Settings::load(&args(&file, DEFAULT_PROFILE)).unwrap();
        assert!(matches!(
            settings.cache_config(),
            Err(ConfigError::Store(StoreError::UnsupportedStoreType(_)))
        ));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(
            expand_home("/var/cache/thy").unwrap(),
            PathBuf::from("/var/cache/thy")
        );
        assert_eq!(
            expand_home("~/.thy").unwrap(),
            home_dir().unwrap().join(".thy")
        );
    }
}
