//! Namespace TTL Policy
//!
//! Lifetimes per cache namespace, by how quickly the data changes, plus the
//! request-signature keys entries are stored under.

use std::collections::HashMap;

// == Known Namespaces ==
pub const PROFILE: &str = "profile";
pub const STUDIOS: &str = "studios";
pub const ARTISTS: &str = "artists";
pub const SEARCH: &str = "search";
pub const APPOINTMENTS: &str = "appointments";

const MINUTE_MS: u64 = 60_000;

// == TTL Policy ==
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    default_ttl_ms: u64,
    overrides: HashMap<String, u64>,
}

impl TtlPolicy {
    /// Standard table: reference data lives long, appointments briefly.
    pub fn new(default_ttl_ms: u64) -> Self {
        let overrides = [
            (PROFILE, 30 * MINUTE_MS),
            (STUDIOS, 15 * MINUTE_MS),
            (ARTISTS, 10 * MINUTE_MS),
            (SEARCH, 5 * MINUTE_MS),
            (APPOINTMENTS, 2 * MINUTE_MS),
        ]
        .into_iter()
        .map(|(ns, ttl)| (ns.to_string(), ttl))
        .collect();

        Self {
            default_ttl_ms: default_ttl_ms.max(1),
            overrides,
        }
    }

    pub fn with_ttl(mut self, namespace: impl Into<String>, ttl_ms: u64) -> Self {
        self.overrides.insert(namespace.into(), ttl_ms.max(1));
        self
    }

    pub fn ttl_for(&self, namespace: &str) -> u64 {
        self.overrides
            .get(namespace)
            .copied()
            .unwrap_or(self.default_ttl_ms)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(5 * MINUTE_MS)
    }
}

// == Request Signature ==
/// Cache key for a GET: the path plus its query pairs in sorted order.
///
/// `list?b=2&a=1` and `list?a=1&b=2` share one entry.
pub fn request_signature(path: &str, query: Option<&str>) -> String {
    let path = path.trim_matches('/');
    let mut pairs: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .collect();

    if pairs.is_empty() {
        return path.to_string();
    }

    pairs.sort_unstable();
    format!("{}?{}", path, pairs.join("&"))
}
