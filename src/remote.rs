// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Content repository access.
//!
//! The content store never talks to GitHub directly. Instead it goes through
//! the [`Remote`] trait, which exposes the handful of repository operations
//! the commit pipeline needs: capture the branch head, read files at a given
//! commit, and apply an atomic commit against an expected head.
//!
//! Two implementations exist:
//!
//! - [`GitHubRemote`] speaks GitHub's GraphQL API.
//! - [`LocalRemote`] works against a repository on disk through libgit2,
//!   with the same atomicity and stale-head semantics.

pub mod github;
pub mod graphql;
pub mod local;

pub use github::GitHubRemote;
pub use local::LocalRemote;

use crate::commit::{builder::CommitRequest, oid::Oid};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Branch of a repository that holds content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepositoryRef {
    /// Render as "owner/name".
    pub fn name_with_owner(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Text file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Full repository path.
    pub path: String,

    /// File contents.
    pub text: String,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Object id of the new commit, i.e., the new branch head.
    pub oid: Oid,

    /// Web URL of the commit when the remote has one.
    pub url: Option<String>,
}

/// Layer of indirection for content repository access.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Repository branch this remote operates on.
    fn repository(&self) -> &RepositoryRef;

    /// Capture current head of content branch.
    async fn head_oid(&self) -> Result<Oid>;

    /// Read text file at target commit.
    ///
    /// Returns `None` if path does not exist at that commit.
    async fn read_file(&self, at: &Oid, path: &str) -> Result<Option<String>>;

    /// Read every text file directly inside target directory at target commit.
    ///
    /// Subdirectories and binary files are skipped. A missing directory
    /// yields an empty listing.
    async fn read_dir(&self, at: &Oid, dir: &str) -> Result<Vec<RemoteFile>>;

    /// Apply commit atomically on top of its expected head.
    async fn create_commit(&self, request: &CommitRequest) -> Result<CommitOutcome>;
}

/// All possible error types for repository access.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Content branch does not exist, or repository is empty.
    #[error("branch {0:?} does not exist")]
    NoBranch(String),

    /// Branch moved since expected head was captured.
    #[error("branch moved past expected head {expected}; re-read repository state and retry")]
    StaleHead { expected: Oid },

    /// Commit tried to delete file that does not exist.
    #[error("cannot delete missing file {0:?}")]
    MissingPath(String),

    /// File exists but is not valid UTF-8 text.
    #[error("file {0:?} is not a text file")]
    NotText(String),

    /// Credentials were rejected.
    #[error("github rejected credentials")]
    Unauthorized,

    /// GitHub returned GraphQL errors.
    #[error("github graphql error: {0}")]
    GraphQl(String),

    /// GitHub refused a mutation built on outdated repository state.
    #[error("github reported stale data: {0}")]
    StaleData(String),

    /// GitHub returned unexpected status code.
    #[error("github returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP transport fails.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Response body cannot be decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Access token cannot be obtained.
    #[error(transparent)]
    Session(#[from] crate::session::SessionError),

    /// Remote returned malformed object id.
    #[error(transparent)]
    Oid(#[from] crate::commit::oid::OidError),
}

/// Friendly result alias :3
pub type Result<T, E = RemoteError> = std::result::Result<T, E>;
