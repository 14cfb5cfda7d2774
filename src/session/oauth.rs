// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub OAuth flow.
//!
//! Handles the web application flow: send the editor to the authorize URL,
//! exchange the returned code for tokens, resolve the GitHub user, and make
//! sure that user may push to the content repository.

use crate::{
    remote::RepositoryRef,
    session::{
        manager::TokenRefresher,
        token::{TokenResponse, TokenSet},
        Result, Session, SessionError, SessionUser,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    StatusCode,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use url::Url;

/// Default GitHub web endpoint for OAuth.
pub const DEFAULT_OAUTH_URL: &str = "https://github.com";

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const AGENT: &str = concat!("oxistatic/", env!("CARGO_PKG_VERSION"));

/// OAuth client for a GitHub App or OAuth App.
#[derive(Debug, Clone)]
pub struct GitHubOAuth {
    http: reqwest::Client,
    oauth_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl GitHubOAuth {
    /// Construct new OAuth client.
    pub fn new(
        http: reqwest::Client,
        oauth_url: impl Into<String>,
        api_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            oauth_url: oauth_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// URL that starts the authorization flow in a browser.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Url`] if configured OAuth URL is malformed.
    pub fn authorize_url(&self, state: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.oauth_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("scope", "repo"),
                ("state", state),
            ],
        )?)
    }

    /// Exchange authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::OAuth`] if GitHub rejects the code.
    #[instrument(skip(self, code), level = "debug")]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        self.token_request(json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "code": code,
        }))
        .await
    }

    /// Resolve GitHub user owning access token.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Status`] if GitHub rejects the token.
    #[instrument(skip(self, access_token), level = "debug")]
    pub async fn fetch_user(&self, access_token: &str) -> Result<SessionUser> {
        let body: UserResponse = self.api_get(access_token, "/user").await?.json().await?;

        Ok(SessionUser {
            login: body.login,
            name: body.name,
            email: body.email,
            image: body.avatar_url,
        })
    }

    /// Check if access token may push to content repository.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Status`] on unexpected responses.
    #[instrument(skip(self, access_token), level = "debug")]
    pub async fn can_push(&self, access_token: &str, repository: &RepositoryRef) -> Result<bool> {
        let path = format!("/repos/{}/{}", repository.owner, repository.name);
        let response = match self.api_get(access_token, &path).await {
            Ok(response) => response,
            Err(SessionError::Status { status: 404, .. }) => return Ok(false),
            Err(error) => return Err(error),
        };
        let body: Value = response.json().await?;

        Ok(extract_push_permission(&body))
    }

    /// Complete login with authorization code.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Forbidden`] if user cannot push to content
    ///   repository.
    /// - Return [`SessionError::OAuth`] if GitHub rejects the code.
    #[instrument(skip(self, code), level = "debug")]
    pub async fn login(&self, code: &str, repository: &RepositoryRef) -> Result<Session> {
        let tokens = self.exchange_code(code).await?;
        let user = self.fetch_user(&tokens.access_token).await?;

        if !self.can_push(&tokens.access_token, repository).await? {
            warn!("{} has no push access to {}", user.login, repository.name_with_owner());
            return Err(SessionError::Forbidden {
                login: user.login,
                repository: repository.name_with_owner(),
            });
        }

        info!("logged in as {}", user.login);
        Ok(Session { user, tokens })
    }

    async fn token_request(&self, body: Value) -> Result<TokenSet> {
        let response = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, AGENT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: TokenResponse = response.json().await?;
        body.into_token_set(Utc::now())
    }

    async fn api_get(&self, access_token: &str, path: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, AGENT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SessionError::Expired);
        }

        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl TokenRefresher for GitHubOAuth {
    #[instrument(skip(self, refresh_token), level = "debug")]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        self.token_request(json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        }))
        .await
    }
}

/// Extract push permission from a repository response body.
fn extract_push_permission(body: &Value) -> bool {
    let Some(permissions) = body.get("permissions") else {
        return false;
    };

    ["admin", "maintain", "push"]
        .iter()
        .any(|key| permissions.get(key).and_then(Value::as_bool).unwrap_or(false))
}

/// Extract authorization code from the URL GitHub redirected to.
///
/// # Errors
///
/// - Return [`SessionError::Url`] if redirect is not a URL.
/// - Return [`SessionError::StateMismatch`] if its `state` differs from the
///   one sent with [`GitHubOAuth::authorize_url`].
/// - Return [`SessionError::OAuth`] if authorization was denied or no code
///   came back.
pub fn authorization_code(redirect: &str, state: &str) -> Result<String> {
    let redirect = Url::parse(redirect.trim())?;
    let param = |name: &str| {
        redirect
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(state) {
        return Err(SessionError::StateMismatch);
    }

    if let Some(error) = param("error") {
        return Err(SessionError::OAuth {
            error,
            description: param("error_description").unwrap_or_default(),
        });
    }

    param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| SessionError::OAuth {
            error: "missing_code".into(),
            description: "redirect carries no authorization code".into(),
        })
}
