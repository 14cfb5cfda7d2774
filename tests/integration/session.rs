// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::join_all;
use oxistatic::session::{
    Session, SessionError, SessionFile, SessionManager, SessionUser, TokenRefresher, TokenSet,
};
use pretty_assertions::assert_eq;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Refresher that rotates refresh tokens the way GitHub does.
#[derive(Clone)]
struct RotatingRefresher {
    calls: Arc<AtomicUsize>,
    valid: Arc<Mutex<String>>,
}

impl RotatingRefresher {
    fn new(refresh_token: &str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            valid: Arc::new(Mutex::new(refresh_token.to_string())),
        }
    }
}

#[async_trait]
impl TokenRefresher for RotatingRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, SessionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;

        let mut valid = self.valid.lock().unwrap();
        if *valid != refresh_token {
            return Err(SessionError::Expired);
        }
        *valid = format!("ghr_{call}");

        Ok(TokenSet {
            access_token: format!("ghu_{call}"),
            expires_at: Some(Utc::now() + Duration::hours(8)),
            refresh_token: Some(valid.clone()),
            refresh_token_expires_at: Some(Utc::now() + Duration::days(180)),
        })
    }
}

fn expiring() -> TokenSet {
    TokenSet {
        access_token: "ghu_0".into(),
        expires_at: Some(Utc::now() + Duration::seconds(10)),
        refresh_token: Some("ghr_0".into()),
        refresh_token_expires_at: Some(Utc::now() + Duration::days(180)),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_refresh() -> Result<()> {
    let refresher = RotatingRefresher::new("ghr_0");
    let manager = Arc::new(SessionManager::new(
        refresher.clone(),
        expiring(),
        Duration::minutes(1),
    ));

    let tasks = (0..16).map(|_| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.access_token().await })
    });
    let tokens = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| -> Result<String> { Ok(joined??) })
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    assert!(tokens.iter().all(|token| token == "ghu_1"));
    assert_eq!(manager.tokens().await.refresh_token.as_deref(), Some("ghr_1"));

    Ok(())
}

#[tokio::test]
async fn expired_refresh_token_requires_login() {
    let tokens = TokenSet {
        expires_at: Some(Utc::now() - Duration::minutes(5)),
        refresh_token_expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..expiring()
    };
    let refresher = RotatingRefresher::new("ghr_0");
    let manager = SessionManager::new(refresher.clone(), tokens, Duration::minutes(1));

    assert!(matches!(manager.access_token().await, Err(SessionError::Expired)));
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refreshed_tokens_are_persisted() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = SessionFile::new(dir.path().join("oxistatic").join("session.json"));
    let user = SessionUser {
        login: "octocat".into(),
        ..Default::default()
    };
    file.save(&Session {
        user: user.clone(),
        tokens: expiring(),
    })?;

    let sink = file.clone();
    let refresher = RotatingRefresher::new("ghr_0");
    let manager = SessionManager::new(refresher, expiring(), Duration::minutes(1))
        .on_refresh(move |tokens| {
            let session = Session {
                user: user.clone(),
                tokens: tokens.clone(),
            };
            sink.save(&session).unwrap();
        });

    assert_eq!(manager.access_token().await?, "ghu_1");
    let stored = file.load()?.unwrap();
    assert_eq!(stored.user.login, "octocat");
    assert_eq!(stored.tokens.access_token, "ghu_1");

    Ok(())
}
