//! Per-session credential handling.

use std::fmt;

/// An opaque API key supplied by the user for one session.
///
/// The value is only reachable through [`ApiKey::expose`]. `Debug` and
/// `Display` are redacted and the type is deliberately not `Serialize`, so
/// the key cannot end up in logs or in an exported dialogue.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse an optional raw value, treating blank input as absent.
    pub fn from_optional(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    /// Raw secret, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the key is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
