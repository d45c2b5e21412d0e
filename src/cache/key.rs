//! Cache Key Module
//!
//! Defines the stable identity under which logical resources are cached.

use std::fmt;
use std::sync::Arc;

// == Key Part ==
/// A single primitive segment of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    /// String segment, e.g. a type tag like `"article"`
    Str(String),
    /// Numeric segment, e.g. a resource identifier
    Int(u64),
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<u64> for KeyPart {
    fn from(n: u64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::Int(n as u64)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{}", s),
            KeyPart::Int(n) => write!(f, "{}", n),
        }
    }
}

// == Cache Key ==
/// Stable identifier for a logical resource, an immutable ordered sequence
/// of primitive parts.
///
/// Two keys are equal iff their sequences are element-wise equal,
/// regardless of how or where each was constructed. Construction cannot
/// fail; callers are responsible for collision-free naming (the article
/// store prefixes detail keys with a type tag distinct from the list key).
///
/// Cloning is cheap: the part sequence is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Arc<[KeyPart]>);

impl CacheKey {
    // == Constructor ==
    /// Creates a key from an ordered sequence of parts.
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        let parts: Vec<KeyPart> = parts.into_iter().map(Into::into).collect();
        CacheKey(parts.into())
    }

    // == Parts ==
    /// Returns the key's parts in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    /// Renders the key as a `/`-joined path for log lines, e.g. `article/7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_structurally_equal_keys_compare_equal() {
        let a = CacheKey::new(["article", "7"]);
        let b = CacheKey::new([String::from("article"), String::from("7")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_structurally_equal_keys_index_the_same_map_slot() {
        let mut map = HashMap::new();
        map.insert(CacheKey::new(["articles"]), 1);

        // A freshly constructed key must find the stored value
        assert_eq!(map.get(&CacheKey::new(["articles"])), Some(&1));
    }

    #[test]
    fn test_different_sequences_are_unequal() {
        assert_ne!(CacheKey::new(["article", "7"]), CacheKey::new(["article", "8"]));
        assert_ne!(CacheKey::new(["article"]), CacheKey::new(["article", "7"]));
        assert_ne!(CacheKey::new(["a", "b"]), CacheKey::new(["b", "a"]));
    }

    #[test]
    fn test_string_and_numeric_parts_are_distinct() {
        let tagged = CacheKey::new([KeyPart::from("article"), KeyPart::from(7u64)]);
        let stringly = CacheKey::new(["article", "7"]);
        assert_ne!(tagged, stringly);
    }

    #[test]
    fn test_display_joins_parts() {
        let key = CacheKey::new([KeyPart::from("article"), KeyPart::from(7u64)]);
        assert_eq!(key.to_string(), "article/7");
        assert_eq!(CacheKey::new(["articles"]).to_string(), "articles");
    }

    #[test]
    fn test_clone_preserves_equality() {
        let key = CacheKey::new(["article", "7"]);
        let clone = key.clone();
        assert_eq!(key, clone);
        assert_eq!(key.parts(), clone.parts());
    }
}
