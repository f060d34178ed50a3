//! Key Codec Module
//!
//! Turns caller keys into backend keys. Every function here is pure and total.

use sha1::{Digest, Sha1};

use crate::cache::MAX_KEY_LENGTH;

/// Prefix of every tag entry key.
pub const TAG_PREFIX: &str = "/sc-tag:";

// == Shorten ==
/// Replaces keys of `MAX_KEY_LENGTH` characters or more with their
/// hex-encoded SHA-1 digest. Shorter keys are returned unchanged.
pub fn shorten(key: &str) -> String {
    if key.chars().count() >= MAX_KEY_LENGTH {
        hex::encode(Sha1::digest(key.as_bytes()))
    } else {
        key.to_string()
    }
}

// == Full Path ==
/// Fully-qualified backend key: `/` + namespace + key, with every `?`
/// turned into `/` so query-string variants nest under their route.
pub fn full_path(namespace: &str, key: &str) -> String {
    format!("/{}{}", namespace, key.replace('?', "/"))
}

// == Tag Path ==
/// Tag entry key: `/sc-tag:` + the part of `key` before the first `?`.
pub fn tag_path(key: &str) -> String {
    let root = key.split('?').next().unwrap_or_default();
    format!("{}{}", TAG_PREFIX, root)
}

// == Pattern Path ==
/// Prefix used by pattern sweeps. Unlike `full_path` the pattern is taken
/// verbatim.
pub fn pattern_path(namespace: &str, prefix: &str) -> String {
    format!("/{}{}", namespace, prefix)
}

// == Namespace Root ==
/// Prefix shared by every entry of a namespace.
pub fn namespace_root(namespace: &str) -> String {
    format!("/{}/", namespace)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_key_unchanged() {
        assert_eq!(shorten("/v1/dogs?page=2"), "/v1/dogs?page=2");
        assert_eq!(shorten(""), "");
    }

    #[test]
    fn test_threshold_key_is_hashed() {
        let below = "a".repeat(MAX_KEY_LENGTH - 1);
        let at = "a".repeat(MAX_KEY_LENGTH);

        assert_eq!(shorten(&below), below);
        let hashed = shorten(&at);
        assert_eq!(hashed.len(), 40);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hashed, shorten(&at));
    }

    #[test]
    fn test_known_digest() {
        let key = "x".repeat(300);
        let expected = hex::encode(Sha1::digest(key.as_bytes()));
        assert_eq!(shorten(&key), expected);
    }

    #[test]
    fn test_full_path_replaces_query_marks() {
        assert_eq!(full_path("api", "/v1/dogs?page=2"), "/api/v1/dogs/page=2");
        assert_eq!(full_path("api", "/v1/dogs"), "/api/v1/dogs");
    }

    #[test]
    fn test_tag_path_drops_query_string() {
        assert_eq!(tag_path("/v1/dogs?page=2&per=10"), "/sc-tag:/v1/dogs");
        assert_eq!(tag_path("/v1/dogs"), "/sc-tag:/v1/dogs");
        assert_eq!(tag_path("?only=query"), "/sc-tag:");
    }

    #[test]
    fn test_pattern_and_namespace_root() {
        assert_eq!(pattern_path("api", "/v1/dogs"), "/api/v1/dogs");
        assert_eq!(namespace_root("api"), "/api/");
    }
}
