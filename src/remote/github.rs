// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub GraphQL remote.

use crate::{
    commit::{builder::CommitRequest, oid::Oid, submit::CreateCommitOnBranchInput},
    remote::{
        graphql::{self, CreateCommitData, HeadOidData, ObjectData, ObjectNode},
        CommitOutcome, Remote, RemoteError, RemoteFile, RepositoryRef, Result,
    },
    session::AccessTokenSource,
};

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default endpoint of GitHub's GraphQL API.
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Content repository hosted on GitHub.
///
/// Every request asks the token source for a fresh access token, so
/// expired tokens are refreshed transparently between calls.
#[derive(Clone)]
pub struct GitHubRemote {
    http: reqwest::Client,
    graphql_url: String,
    repository: RepositoryRef,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GitHubRemote {
    /// Construct new GitHub remote.
    pub fn new(
        http: reqwest::Client,
        graphql_url: impl Into<String>,
        repository: RepositoryRef,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http,
            graphql_url: graphql_url.into(),
            repository,
            tokens,
        }
    }

    /// Run GraphQL document and decode its data.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Unauthorized`] on 401 responses.
    /// - Return [`RemoteError::Status`] on other non-success responses.
    /// - Return [`RemoteError::StaleData`] if GitHub refused to apply a
    ///   mutation against an outdated head.
    /// - Return [`RemoteError::GraphQl`] if response carries other errors.
    async fn graphql<T>(&self, query: &str, variables: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(token)
            .header(USER_AGENT, concat!("oxistatic/", env!("CARGO_PKG_VERSION")))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if let Some(remaining) = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|value| value.to_str().ok())
        {
            debug!(remaining, "github rate limit");
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: graphql::Response<T> = response.json().await?;
        into_data(body)
    }

    async fn object(&self, query: &str, at: &Oid, path: &str) -> Result<Option<ObjectNode>> {
        let data: ObjectData = self
            .graphql(
                query,
                json!({
                    "owner": self.repository.owner,
                    "name": self.repository.name,
                    "expression": format!("{at}:{path}"),
                }),
            )
            .await?;

        Ok(data
            .repository
            .and_then(|repository| repository.object))
    }
}

#[async_trait]
impl Remote for GitHubRemote {
    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    #[instrument(skip(self), level = "debug")]
    async fn head_oid(&self) -> Result<Oid> {
        let data: HeadOidData = self
            .graphql(
                graphql::HEAD_OID_QUERY,
                json!({
                    "owner": self.repository.owner,
                    "name": self.repository.name,
                    "branch": self.repository.branch,
                }),
            )
            .await?;

        let oid = data
            .repository
            .and_then(|repository| repository.reference)
            .map(|reference| reference.target.oid)
            .ok_or_else(|| RemoteError::NoBranch(self.repository.branch.clone()))?;
        debug!("head of {} is {}", self.repository.branch, oid.short());

        Ok(oid)
    }

    #[instrument(skip(self, at), level = "debug")]
    async fn read_file(&self, at: &Oid, path: &str) -> Result<Option<String>> {
        let Some(object) = self.object(graphql::FILE_QUERY, at, path).await? else {
            return Ok(None);
        };

        if object.is_binary.unwrap_or(false) {
            return Err(RemoteError::NotText(path.to_string()));
        }

        // INVARIANT: Trees come back as empty objects under the blob fragment.
        Ok(object.text)
    }

    #[instrument(skip(self, at), level = "debug")]
    async fn read_dir(&self, at: &Oid, dir: &str) -> Result<Vec<RemoteFile>> {
        let Some(object) = self.object(graphql::DIR_QUERY, at, dir).await? else {
            return Ok(Vec::new());
        };

        let files = object
            .entries
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter_map(|entry| {
                let object = entry.object?;
                if object.is_binary.unwrap_or(false) {
                    return None;
                }
                object.text.map(|text| RemoteFile {
                    path: entry.path,
                    text,
                })
            })
            .collect::<Vec<_>>();
        debug!("read {} files from {dir:?}", files.len());

        Ok(files)
    }

    #[instrument(skip(self, request), level = "debug")]
    async fn create_commit(&self, request: &CommitRequest) -> Result<CommitOutcome> {
        let input = CreateCommitOnBranchInput::new(&self.repository, request);
        let result = self
            .graphql(graphql::CREATE_COMMIT_MUTATION, json!({ "input": input }))
            .await;

        commit_outcome(result, &request.expected_head)
    }
}

/// Unwrap data of GraphQL response envelope.
///
/// # Errors
///
/// - Return [`RemoteError::StaleData`] if any error reports an outdated head.
/// - Return [`RemoteError::GraphQl`] for every other error, or if the
///   response holds no data.
fn into_data<T>(response: graphql::Response<T>) -> Result<T> {
    if let Some(error) = response.errors.iter().find(|error| error.is_stale_head()) {
        return Err(RemoteError::StaleData(error.message.clone()));
    }

    if !response.errors.is_empty() {
        let message = response
            .errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RemoteError::GraphQl(message));
    }

    response
        .data
        .ok_or_else(|| RemoteError::GraphQl("response carried no data".into()))
}

/// Turn result of `createCommitOnBranch` into commit outcome.
///
/// # Errors
///
/// - Return [`RemoteError::StaleHead`] with the `expected` head if GitHub
///   reported stale data.
/// - Return [`RemoteError::GraphQl`] if mutation returned no commit.
fn commit_outcome(result: Result<CreateCommitData>, expected: &Oid) -> Result<CommitOutcome> {
    let data = match result {
        Ok(data) => data,
        Err(RemoteError::StaleData(message)) => {
            debug!("stale data: {message}");
            return Err(RemoteError::StaleHead {
                expected: expected.clone(),
            });
        }
        Err(error) => return Err(error),
    };

    let commit = data
        .create_commit_on_branch
        .and_then(|payload| payload.commit)
        .ok_or_else(|| RemoteError::GraphQl("createCommitOnBranch returned no commit".into()))?;

    Ok(CommitOutcome {
        oid: commit.oid,
        url: commit.url,
    })
}
