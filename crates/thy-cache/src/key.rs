use sha1::{Digest, Sha1};
use thy_api::ResourceLocator;

/// Build the store key for `distinguisher` inside `namespace`.
///
/// Colons in the distinguisher are treated as path separators, so `a:b` and `a/b` share a key.
/// Every `-` in the distinguisher is doubled before it is joined to the namespace with a single
/// `-`. Hyphen runs in the escaped part therefore always have even length, which keeps the
/// separator unambiguous and the mapping free of collisions.
pub fn derive_cache_key(namespace: &str, distinguisher: &str) -> String {
    let escaped = distinguisher.replace(':', "/").replace('-', "--");
    format!("{namespace}-{escaped}")
}

/// The fixed namespaces cached secrets live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    /// Secret values.
    Secret,
    /// Secret descriptions.
    SecretDescription,
}

impl CacheNamespace {
    /// Every namespace, in the order they are wiped.
    pub const ALL: [CacheNamespace; 2] = [CacheNamespace::Secret, CacheNamespace::SecretDescription];

    /// The namespace string, also the prefix of every key in it.
    pub fn prefix(self) -> &'static str {
        match self {
            CacheNamespace::Secret => "secret",
            CacheNamespace::SecretDescription => "secret-description",
        }
    }

}

/// The cache roots of one configuration profile.
///
/// Profiles usually share a store, so every namespace is narrowed to `<namespace>-<sha1>`, the
/// SHA-1 of the profile name in hex. A root never prefixes a key of another profile or namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    digest: String,
}

impl CacheScope {
    /// The scope of the profile called `profile`.
    pub fn for_profile(profile: &str) -> Self {
        Self {
            digest: format!("{:x}", Sha1::digest(profile.as_bytes())),
        }
    }

    /// The prefix of every key of `namespace` in this scope.
    pub fn root(&self, namespace: CacheNamespace) -> String {
        format!("{}-{}", namespace.prefix(), self.digest)
    }

    /// The key of the secret addressed by `locator`: its path if given, otherwise its id.
    pub fn key_for(&self, namespace: CacheNamespace, locator: &ResourceLocator) -> String {
        derive_cache_key(&self.root(namespace), locator.as_str())
    }
}

impl Default for CacheScope {
    fn default() -> Self {
        Self::for_profile("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_derives_same_key() {
        assert_eq!(
            derive_cache_key("secret", "foo/bar"),
            derive_cache_key("secret", "foo/bar")
        );
        assert_eq!(derive_cache_key("secret", "foo/bar"), "secret-foo/bar");
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        assert_ne!(
            derive_cache_key("secret", "a/b"),
            derive_cache_key("secret-description", "a/b")
        );
        // A distinguisher that looks like the tail of the other namespace.
        assert_ne!(
            derive_cache_key("secret", "description-a"),
            derive_cache_key("secret-description", "a")
        );
    }

    #[test]
    fn test_colons_are_path_separators() {
        assert_eq!(
            derive_cache_key("secret", "a:b:c"),
            derive_cache_key("secret", "a/b/c")
        );
    }

    #[test]
    fn test_hyphens_are_escaped() {
        assert_eq!(derive_cache_key("secret", "my-db"), "secret-my--db");
        assert_ne!(
            derive_cache_key("secret", "a-b"),
            derive_cache_key("secret", "a--b")
        );
    }

    #[test]
    fn test_key_for_locator() {
        let scope = CacheScope::for_profile("default");
        let path = ResourceLocator::Path("servers:db".to_string());
        let id = ResourceLocator::Id("0a1b-2c".to_string());

        // sha1("default")
        let digest = "7505d64a54e061b7acd54ccd58b49dc43500b635";
        assert_eq!(
            scope.key_for(CacheNamespace::Secret, &path),
            format!("secret-{digest}-servers/db")
        );
        assert_eq!(
            scope.key_for(CacheNamespace::SecretDescription, &path),
            format!("secret-description-{digest}-servers/db")
        );
        assert_eq!(
            scope.key_for(CacheNamespace::Secret, &id),
            format!("secret-{digest}-0a1b--2c")
        );
    }

    #[test]
    fn test_profiles_have_disjoint_roots() {
        let a = CacheScope::for_profile("default");
        let b = CacheScope::for_profile("other");
        let locator = ResourceLocator::Path("db".to_string());

        assert_ne!(a, b);
        for namespace in CacheNamespace::ALL {
            assert_ne!(a.key_for(namespace, &locator), b.key_for(namespace, &locator));
            assert!(!b
                .key_for(namespace, &locator)
                .starts_with(&a.root(namespace)));
        }
        assert!(!a
            .key_for(CacheNamespace::SecretDescription, &locator)
            .starts_with(&a.root(CacheNamespace::Secret)));
    }
}
