// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Session and token management.
//!
//! Editors authenticate through GitHub OAuth. A successful login yields a
//! __session__: the GitHub user that logged in, plus a token pair made of a
//! short-lived access token and a longer-lived refresh token. Tokens issued
//! to GitHub Apps expire, while classic OAuth App tokens and personal access
//! tokens do not.
//!
//! # Token Refresh
//!
//! [`SessionManager`] hands out access tokens and refreshes them shortly
//! before they expire. Refreshing is serialized: when many requests notice
//! an expiring token at the same time, exactly one of them performs the
//! refresh, and the rest wait for it and reuse its result. GitHub rotates
//! refresh tokens on every use, so a second concurrent refresh with the old
//! refresh token would fail and log the editor out.
//!
//! # Session Persistence
//!
//! Sessions are stored as JSON through [`SessionFile`], by default at
//! `$XDG_DATA_HOME/oxistatic/session.json`.

pub mod manager;
pub mod oauth;
pub mod token;

pub use manager::{AccessTokenSource, SessionManager, StaticToken, TokenRefresher};
pub use oauth::{authorization_code, GitHubOAuth};
pub use token::{TokenResponse, TokenSet};

use serde::{Deserialize, Serialize};
use std::{
    fs::{create_dir_all, read_to_string, remove_file, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// GitHub user bound to a session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Logged in editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub tokens: TokenSet,
}

/// Session storage on disk.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Construct new session file handle.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Load stored session.
    ///
    /// Returns `None` if no session has been stored yet.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::ReadSession`] if session file cannot be read.
    /// - Return [`SessionError::Json`] if session file is malformed.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!("no session stored at {:?}", self.path.display());
            return Ok(None);
        }

        let content = read_to_string(&self.path).map_err(|err| SessionError::ReadSession {
            source: err,
            session_path: self.path.clone(),
        })?;

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Store session, replacing any previous one.
    ///
    /// On unix the file is only readable by its owner.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::WriteSession`] if session file cannot be
    ///   written.
    #[instrument(skip(self, session), level = "debug")]
    pub fn save(&self, session: &Session) -> Result<()> {
        let content = serde_json::to_string_pretty(session)?;
        let write_err = |err| SessionError::WriteSession {
            source: err,
            session_path: self.path.clone(),
        };

        if let Some(parent) = self.path.parent() {
            create_dir_all(parent).map_err(write_err)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        debug!("stored session for {}", session.user.login);

        Ok(())
    }

    /// Remove stored session if any.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::WriteSession`] if session file cannot be
    ///   removed.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            remove_file(&self.path).map_err(|err| SessionError::WriteSession {
                source: err,
                session_path: self.path.clone(),
            })?;
        }

        Ok(())
    }
}

/// All possible error types for session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Session can no longer be refreshed and editor must log in again.
    #[error("session expired; log in again")]
    Expired,

    /// No session is stored.
    #[error("not logged in")]
    NotLoggedIn,

    /// OAuth endpoint rejected request.
    #[error("oauth error {error}: {description}")]
    OAuth { error: String, description: String },

    /// Authorization redirect does not belong to the flow that was started.
    #[error("oauth state of redirect does not match; start login again")]
    StateMismatch,

    /// User lacks push access to content repository.
    #[error("user {login} cannot push to {repository}")]
    Forbidden { login: String, repository: String },

    /// GitHub returned unexpected status code.
    #[error("github returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Session file cannot be read.
    #[error("failed to read session file at {:?}", session_path.display())]
    ReadSession {
        #[source]
        source: std::io::Error,
        session_path: PathBuf,
    },

    /// Session file cannot be written.
    #[error("failed to write session file at {:?}", session_path.display())]
    WriteSession {
        #[source]
        source: std::io::Error,
        session_path: PathBuf,
    },

    /// HTTP transport fails.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Session or response cannot be decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// URL cannot be constructed.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Friendly result alias :3
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
