// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Access and refresh token pairs.

use crate::session::{Result, SessionError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access token with optional refresh token.
///
/// # Invariant
///
/// - Token without `expires_at` never needs refreshing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Construct non-expiring token, e.g., a personal access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
        }
    }

    /// Check if access token expires within `margin` of `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - margin <= now,
            None => false,
        }
    }

    /// Check if refresh token can still be used at `now`.
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_token_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Response body of GitHub's token endpoint.
///
/// GitHub reports failures with a success status and an `error` field, so
/// every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Convert response into token set issued at `now`.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Expired`] if GitHub rejected a refresh token.
    /// - Return [`SessionError::OAuth`] for any other reported failure, or if
    ///   a lifetime is out of range.
    pub fn into_token_set(self, now: DateTime<Utc>) -> Result<TokenSet> {
        if let Some(error) = self.error {
            if error == "bad_refresh_token" {
                return Err(SessionError::Expired);
            }

            return Err(SessionError::OAuth {
                error,
                description: self.error_description.unwrap_or_default(),
            });
        }

        let access_token = self.access_token.ok_or_else(|| SessionError::OAuth {
            error: "missing_access_token".into(),
            description: "token endpoint returned no access token".into(),
        })?;

        Ok(TokenSet {
            access_token,
            expires_at: self.expires_in.map(|secs| expiry(now, secs)).transpose()?,
            refresh_token: self.refresh_token,
            refresh_token_expires_at: self
                .refresh_token_expires_in
                .map(|secs| expiry(now, secs))
                .transpose()?,
        })
    }
}

fn expiry(now: DateTime<Utc>, secs: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| SessionError::OAuth {
            error: "invalid_expiry".into(),
            description: format!("token lifetime of {secs} seconds is out of range"),
        })
}
