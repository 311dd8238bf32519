//! Request DTOs for the booking service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::api_cache::KeyPattern;
use crate::cache::SESSION_NAMESPACE;

/// Maximum session id length in bytes
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Checks a session id taken from the path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_session_id(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("Session id cannot be empty".to_string());
    }
    if id.len() > MAX_SESSION_ID_LENGTH {
        return Some(format!(
            "Session id exceeds maximum length of {} characters",
            MAX_SESSION_ID_LENGTH
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some("Session id may only contain letters, digits, '-' and '_'".to_string());
    }
    None
}

/// Checks a cache namespace taken from the path.
///
/// Session drafts live under `session`, which is off limits here.
pub fn validate_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        return Some("Namespace cannot be empty".to_string());
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Some("Namespace may only contain lowercase letters, digits, '-' and '_'".to_string());
    }
    if namespace == SESSION_NAMESPACE {
        return Some(format!("Namespace '{}' is reserved", SESSION_NAMESPACE));
    }
    None
}

/// Query string for GET /sessions/:id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    /// Discard any saved draft and start over
    #[serde(default)]
    pub new_booking: bool,
}

/// Request body for POST /cache/:namespace/invalidate
///
/// # Fields
/// - `pattern`: Substring, or regular expression when `regex` is set
/// - `regex`: Treat `pattern` as a regular expression
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
}

impl InvalidateRequest {
    /// Builds the key pattern, or an error message for a bad request.
    pub fn key_pattern(&self) -> Result<KeyPattern, String> {
        if self.pattern.is_empty() {
            return Err("Pattern cannot be empty".to_string());
        }
        if self.regex {
            KeyPattern::regex(&self.pattern).map_err(|e| format!("Invalid regex: {}", e))
        } else {
            Ok(KeyPattern::substring(self.pattern.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("tab-1_a").is_none());
        assert!(validate_session_id("").is_some());
        assert!(validate_session_id("has space").is_some());
        assert!(validate_session_id("a:b").is_some());
        assert!(validate_session_id(&"x".repeat(MAX_SESSION_ID_LENGTH + 1)).is_some());
    }

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("artists").is_none());
        assert!(validate_namespace("session").is_some());
        assert!(validate_namespace("Artists").is_some());
        assert!(validate_namespace("").is_some());
    }

    #[test]
    fn test_invalidate_request_deserialize() {
        let req: InvalidateRequest = serde_json::from_str(r#"{"pattern": "detail/7"}"#).unwrap();
        assert!(!req.regex);
        assert!(req.key_pattern().unwrap().matches("detail/7"));
    }

    #[test]
    fn test_invalidate_request_bad_regex() {
        let req = InvalidateRequest {
            pattern: "(".to_string(),
            regex: true,
        };
        assert!(req.key_pattern().is_err());
    }

    #[test]
    fn test_invalidate_request_empty_pattern() {
        let req = InvalidateRequest {
            pattern: String::new(),
            regex: false,
        };
        assert!(req.key_pattern().is_err());
    }
}
