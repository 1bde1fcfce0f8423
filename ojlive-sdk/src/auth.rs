//! Bearer authentication for all judge APIs.
//!
//! The judge backend authenticates every protected route with a JWT sent as
//! `Authorization: Bearer {token}`.  Obtaining the token (login) is outside
//! this crate; callers hand an [`AuthToken`] to each operation.

use std::fmt;
use std::sync::Arc;

/// An opaque bearer token.
///
/// Cheap to clone.  The `Debug` impl never prints the token itself so it is
/// safe to include in `tracing` fields.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Arc<str>);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Full `Authorization` header value (`Bearer {token}`).
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl From<String> for AuthToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for AuthToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
