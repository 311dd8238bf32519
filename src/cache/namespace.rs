//! Namespace Module
//!
//! Key prefixes that partition one store into independent caches.

use std::fmt;

/// Separator between a namespace and the key inside it.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Root namespace of booking drafts, reserved from the API cache.
pub const SESSION_NAMESPACE: &str = "session";

// == Namespace ==
/// A key prefix such as `artists` or `session:abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Namespace holding one booking session's draft.
    pub fn session(session_id: &str) -> Self {
        Self(format!("{}{}{}", SESSION_NAMESPACE, NAMESPACE_SEPARATOR, session_id))
    }

    /// Namespace enclosing every session draft.
    pub fn sessions() -> Self {
        Self(SESSION_NAMESPACE.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Full store key for `key` inside this namespace.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}{}", self.0, NAMESPACE_SEPARATOR, key)
    }

    /// Prefix shared by every full key in this namespace.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.0, NAMESPACE_SEPARATOR)
    }

    /// Strips the namespace from a full key, or None if it belongs elsewhere.
    pub fn local_key<'a>(&self, full_key: &'a str) -> Option<&'a str> {
        full_key
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix(NAMESPACE_SEPARATOR))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_local_key() {
        let ns = Namespace::new("artists");
        let full = ns.key("list?city=berlin");

        assert_eq!(full, "artists:list?city=berlin");
        assert_eq!(ns.local_key(&full), Some("list?city=berlin"));
    }

    #[test]
    fn test_sessions_prefix_covers_every_session() {
        let key = Namespace::session("tab-1").key("booking-step-one");
        assert!(key.starts_with(&Namespace::sessions().prefix()));
        assert!(!"sessions-archive:x".starts_with(&Namespace::sessions().prefix()));
    }

    #[test]
    fn test_prefix_does_not_match_sibling() {
        let ns = Namespace::new("artist");
        assert_eq!(ns.local_key("artists:list"), None);
        assert!(!"artists:list".starts_with(&ns.prefix()));
    }

    #[test]
    fn test_session_namespace() {
        let ns = Namespace::session("tab-1");
        assert_eq!(ns.key("booking-step-one"), "session:tab-1:booking-step-one");
    }
}
