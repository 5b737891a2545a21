//! Authenticated user session.

use std::fmt;

/// An authenticated backend session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend user id; also used as the purchase SDK's app user id.
    pub user_id: String,

    /// Bearer token for backend calls.
    pub token: String,
}

impl Session {
    /// Create a session.
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}
