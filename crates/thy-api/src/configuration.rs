use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::ApiError;

/// Domain of the hosted vault service.
pub const DEFAULT_DOMAIN: &str = "secretsvaultcloud.com";

/// Suffix selecting the description (metadata only) of a secret.
pub const SUFFIX_DESCRIPTION: &str = "::description";

const DEFAULT_API_VERSION: &str = "v1";
const PREFIX_ENTITY: &str = "secrets/";

/// Characters left unescaped in query values, matching form encoding of unreserved characters.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Identifies a resource either by its path or by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocator {
    /// A slash or colon delimited path, e.g. `servers/db` or `servers:db`.
    Path(String),
    /// An opaque resource id.
    Id(String),
}

impl ResourceLocator {
    /// Build a locator from the optional `--path` and `--id` arguments. Empty values count as
    /// not given. Exactly one of them must be present.
    pub fn new(path: Option<String>, id: Option<String>) -> Result<Self, ApiError> {
        let path = path.filter(|p| !p.trim().is_empty());
        let id = id.filter(|i| !i.trim().is_empty());

        match (path, id) {
            (Some(_), Some(_)) => Err(ApiError::AmbiguousResource),
            (Some(path), None) => Ok(ResourceLocator::Path(path)),
            (None, Some(id)) => Ok(ResourceLocator::Id(id)),
            (None, None) => Err(ApiError::MissingResource),
        }
    }

    /// The path or id as given.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceLocator::Path(path) => path,
            ResourceLocator::Id(id) => id,
        }
    }
}

/// Where the vault lives and how requests identify themselves.
#[derive(Debug, Clone)]
pub struct ApiConfiguration {
    /// Tenant name, the first label of the API host.
    pub tenant: String,
    /// Domain of the API host. Defaults to [`DEFAULT_DOMAIN`].
    pub domain: String,
    /// `https` unless overridden for local testing.
    pub scheme: String,
    /// Optional port appended to the host.
    pub port: Option<u16>,
    /// API version path segment. Defaults to `v1`.
    pub api_version: String,
    /// Replaces `<scheme>://<tenant>.<domain>[:port]` entirely when set.
    pub api_url: Option<String>,
    /// Value of the `Authorization` header.
    pub auth_token: Option<String>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for ApiConfiguration {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            domain: DEFAULT_DOMAIN.to_string(),
            scheme: "https".to_string(),
            port: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_url: None,
            auth_token: None,
            user_agent: format!(
                "thy-{}-{}-{}",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfiguration {
    /// The versioned API root, e.g. `https://acme.secretsvaultcloud.com/v1`.
    pub fn base_url(&self) -> String {
        let host = match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
                format!("{}://{}.{}{}", self.scheme, self.tenant, self.domain, port)
            }
        };
        format!("{}/{}", host, self.api_version)
    }

    /// Build the URI of a resource.
    ///
    /// Resources live under the pluralized `resource_type` (`secret` → `/secrets/`). A path
    /// locator becomes part of the URI path, an id locator is sent as the `id` query parameter.
    /// `suffix` selects a sub-resource such as [`SUFFIX_DESCRIPTION`].
    pub fn resource_uri(
        &self,
        resource_type: &str,
        locator: &ResourceLocator,
        suffix: &str,
        query: &[(&str, &str)],
    ) -> String {
        let path = match locator {
            ResourceLocator::Path(path) => uri_path_from_internal(path),
            ResourceLocator::Id(_) => String::new(),
        };

        let mut uri = format!("{}/{}s/{}{}", self.base_url(), resource_type, path, suffix);

        let mut terms = query.to_vec();
        if let ResourceLocator::Id(id) = locator {
            terms.push(("id", id.as_str()));
        }

        for (i, (key, value)) in terms.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(key);
            uri.push('=');
            uri.extend(utf8_percent_encode(value, QUERY_VALUE));
        }

        debug!(uri, "Request URI");
        uri
    }
}

/// Convert a colon delimited internal path (`secrets:a:b`) into its URI form (`a/b`).
fn uri_path_from_internal(internal_path: &str) -> String {
    let path = internal_path.replace(':', "/");
    let path = path.strip_prefix('/').unwrap_or(&path);
    path.strip_prefix(PREFIX_ENTITY).unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfiguration {
        ApiConfiguration {
            tenant: "acme".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_base_url_from_tenant_and_domain() {
        assert_eq!(
            config().base_url(),
            "https://acme.secretsvaultcloud.com/v1"
        );

        let custom = ApiConfiguration {
            domain: "example.eu".to_string(),
            scheme: "http".to_string(),
            port: Some(8080),
            api_version: "v2".to_string(),
            ..config()
        };
        assert_eq!(custom.base_url(), "http://acme.example.eu:8080/v2");
    }

    #[test]
    fn test_api_url_override() {
        let custom = ApiConfiguration {
            api_url: Some("http://127.0.0.1:9000/".to_string()),
            ..config()
        };
        assert_eq!(custom.base_url(), "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_resource_uri_for_path() {
        let uri = config().resource_uri(
            "secret",
            &ResourceLocator::Path("servers:db".to_string()),
            "",
            &[("edit", "false")],
        );
        assert_eq!(
            uri,
            "https://acme.secretsvaultcloud.com/v1/secrets/servers/db?edit=false"
        );
    }

    #[test]
    fn test_resource_uri_strips_entity_prefix() {
        let uri = config().resource_uri(
            "secret",
            &ResourceLocator::Path("/secrets/servers/db".to_string()),
            SUFFIX_DESCRIPTION,
            &[],
        );
        assert_eq!(
            uri,
            "https://acme.secretsvaultcloud.com/v1/secrets/servers/db::description"
        );
    }

    #[test]
    fn test_resource_uri_for_id_uses_query() {
        let uri = config().resource_uri(
            "secret",
            &ResourceLocator::Id("a b&c".to_string()),
            "",
            &[("edit", "true")],
        );
        assert_eq!(
            uri,
            "https://acme.secretsvaultcloud.com/v1/secrets/?edit=true&id=a%20b%26c"
        );
    }

    #[test]
    fn test_locator_requires_exactly_one_of_path_and_id() {
        assert_eq!(
            ResourceLocator::new(Some("a/b".to_string()), None).unwrap(),
            ResourceLocator::Path("a/b".to_string())
        );
        assert_eq!(
            ResourceLocator::new(Some(String::new()), Some("id-1".to_string())).unwrap(),
            ResourceLocator::Id("id-1".to_string())
        );
        assert!(matches!(
            ResourceLocator::new(Some("a".to_string()), Some("b".to_string())),
            Err(ApiError::AmbiguousResource)
        ));
        assert!(matches!(
            ResourceLocator::new(None, None),
            Err(ApiError::MissingResource)
        ));
    }
}
