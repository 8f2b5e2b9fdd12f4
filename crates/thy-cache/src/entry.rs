use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A server response as kept in the local store.
///
/// Entries are replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSecret {
    /// When the payload was fetched from the server.
    #[serde(rename = "Date")]
    pub fetched_at: DateTime<Utc>,
    /// The raw response body.
    #[serde(rename = "Data", with = "base64_bytes")]
    pub payload: Vec<u8>,
}

impl CachedSecret {
    /// Wrap a payload fetched just now.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            fetched_at: Utc::now(),
            payload,
        }
    }

    /// Whether more than `age_minutes` have passed between fetching and `now`.
    ///
    /// A non-positive age means entries are always expired.
    pub fn is_expired(&self, now: DateTime<Utc>, age_minutes: i64) -> bool {
        if age_minutes <= 0 {
            return true;
        }
        match TimeDelta::try_minutes(age_minutes) {
            Some(age) => now.signed_duration_since(self.fetched_at) > age,
            None => false,
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}
