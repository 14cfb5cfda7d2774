// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Transparent access token refresh.

use crate::session::{token::TokenSet, Result, SessionError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Source of valid access tokens for API requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Obtain access token that is valid right now.
    async fn access_token(&self) -> Result<String>;
}

/// Exchange refresh token for new token set.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet>;
}

/// Fixed token that never expires, e.g., a personal access token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

type RefreshHook = Box<dyn Fn(&TokenSet) + Send + Sync>;

/// Access token holder with serialized refresh.
///
/// # Invariant
///
/// - At most one refresh request is in flight at any time.
/// - Callers waiting on a refresh reuse its result instead of refreshing
///   again.
pub struct SessionManager<R>
where
    R: TokenRefresher,
{
    refresher: R,
    tokens: RwLock<TokenSet>,
    refresh_lock: Mutex<()>,
    margin: Duration,
    on_refresh: Option<RefreshHook>,
}

impl<R> SessionManager<R>
where
    R: TokenRefresher,
{
    /// Construct new session manager.
    ///
    /// Tokens expiring within `margin` are refreshed before use.
    pub fn new(refresher: R, tokens: TokenSet, margin: Duration) -> Self {
        Self {
            refresher,
            tokens: RwLock::new(tokens),
            refresh_lock: Mutex::new(()),
            margin,
            on_refresh: None,
        }
    }

    /// Call hook with every newly refreshed token set, e.g., to persist it.
    pub fn on_refresh(mut self, hook: impl Fn(&TokenSet) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Box::new(hook));
        self
    }

    /// Current token set without refreshing.
    pub async fn tokens(&self) -> TokenSet {
        self.tokens.read().await.clone()
    }

    /// Obtain valid access token, refreshing it if needed.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Expired`] if token needs refreshing but the
    ///   refresh token is missing or expired.
    /// - Return any error produced by the token refresher.
    #[instrument(skip(self), level = "debug")]
    pub async fn access_token(&self) -> Result<String> {
        {
            let tokens = self.tokens.read().await;
            if !tokens.needs_refresh(Utc::now(), self.margin) {
                return Ok(tokens.access_token.clone());
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // INVARIANT: Another caller may have refreshed while we waited.
        let current = self.tokens.read().await.clone();
        let now = Utc::now();
        if !current.needs_refresh(now, self.margin) {
            debug!("access token was refreshed by concurrent caller");
            return Ok(current.access_token);
        }

        if !current.can_refresh(now) {
            warn!("access token expired and cannot be refreshed");
            return Err(SessionError::Expired);
        }

        let refresh_token = current.refresh_token.as_deref().ok_or(SessionError::Expired)?;
        info!("refresh access token");
        let refreshed = self.refresher.refresh(refresh_token).await?;
        *self.tokens.write().await = refreshed.clone();

        if let Some(hook) = &self.on_refresh {
            hook(&refreshed);
        }

        Ok(refreshed.access_token)
    }
}

#[async_trait]
impl<R> AccessTokenSource for SessionManager<R>
where
    R: TokenRefresher,
{
    async fn access_token(&self) -> Result<String> {
        SessionManager::access_token(self).await
    }
}
