//! Session credential used to authenticate the realtime connection.

use std::fmt;

use crate::error::RealtimeError;

use super::UserId;

/// Session token plus user identity, presented when a connection is
/// established and reused across reconnection attempts.
///
/// Construction is unchecked so that callers can carry a credential
/// around before deciding to connect; [`Credential::validate`] enforces
/// the connect-time contract (non-blank token). The server builds one
/// from upgrade-request query parts via [`Credential::from_parts`],
/// which validates eagerly.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    user_id: UserId,
}

impl Credential {
    /// Creates a credential from a session token and user id.
    #[must_use]
    pub fn new(token: impl Into<String>, user_id: UserId) -> Self {
        Self {
            token: token.into(),
            user_id,
        }
    }

    /// Builds a credential from optional HTTP query parts.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidCredential`] if either part is
    /// missing or the token is blank.
    pub fn from_parts(
        token: Option<String>,
        user_id: Option<uuid::Uuid>,
    ) -> Result<Self, RealtimeError> {
        let Some(token) = token else {
            return Err(RealtimeError::InvalidCredential(
                "missing session token".to_string(),
            ));
        };
        let Some(user_id) = user_id else {
            return Err(RealtimeError::InvalidCredential(
                "missing user id".to_string(),
            ));
        };
        let credential = Self::new(token, UserId::from_uuid(user_id));
        credential.validate()?;
        Ok(credential)
    }

    /// Checks that the credential satisfies the connect-time contract.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidCredential`] if the session
    /// token is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.token.trim().is_empty() {
            return Err(RealtimeError::InvalidCredential(
                "blank session token".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the session token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the user identity this credential belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

// Manual impl: the session token must not end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
