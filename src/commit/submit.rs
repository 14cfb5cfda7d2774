// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit submission.
//!
//! Serializes a [`CommitRequest`] into GitHub's `CreateCommitOnBranchInput`
//! and hands it to a [`Remote`] for atomic application.

use crate::{
    commit::{builder::CommitRequest, oid::Oid},
    remote::{CommitOutcome, Remote, RemoteError, RepositoryRef},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Wire form of a commit for the `createCommitOnBranch` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitOnBranchInput {
    pub branch: CommittableBranch,
    pub message: CommitMessageInput,
    pub file_changes: FileChangesInput,
    pub expected_head_oid: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittableBranch {
    pub repository_name_with_owner: String,
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessageInput {
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChangesInput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<FileAddition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<FileDeletion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAddition {
    pub path: String,

    /// Base64 encoded file contents.
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDeletion {
    pub path: String,
}

impl CreateCommitOnBranchInput {
    /// Serialize commit request against target repository branch.
    pub fn new(repository: &RepositoryRef, request: &CommitRequest) -> Self {
        let additions = request
            .changes
            .additions()
            .map(|(path, contents)| FileAddition {
                path: path.to_string(),
                contents: STANDARD.encode(contents),
            })
            .collect();
        let deletions = request
            .changes
            .deletions()
            .map(|path| FileDeletion {
                path: path.to_string(),
            })
            .collect();

        Self {
            branch: CommittableBranch {
                repository_name_with_owner: repository.name_with_owner(),
                branch_name: repository.branch.clone(),
            },
            message: CommitMessageInput {
                headline: request.message.headline.clone(),
                body: request.message.body.clone(),
            },
            file_changes: FileChangesInput {
                additions,
                deletions,
            },
            expected_head_oid: request.expected_head.clone(),
        }
    }
}

/// Submit commit request to remote.
///
/// All file changes apply together or not at all.
///
/// # Errors
///
/// - Return [`RemoteError::StaleHead`] if branch moved since the expected
///   head was captured. Nothing is written in that case.
/// - Return [`RemoteError`] variants for transport failures.
#[instrument(skip(remote, request), level = "debug")]
pub async fn submit<R>(remote: &R, request: CommitRequest) -> Result<CommitOutcome, RemoteError>
where
    R: Remote + ?Sized,
{
    let repository = remote.repository();
    info!(
        "commit {:?} onto {}@{} ({} file changes)",
        request.message.headline,
        repository.name_with_owner(),
        request.expected_head.short(),
        request.changes.len()
    );

    match remote.create_commit(&request).await {
        Ok(outcome) => {
            info!("created commit {}", outcome.oid.short());
            Ok(outcome)
        }
        Err(error @ RemoteError::StaleHead { .. }) => {
            warn!(
                "branch {} moved past {}; changes were not applied",
                repository.branch,
                request.expected_head.short()
            );
            Err(error)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::builder::CommitBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serialize_create_commit_input() -> anyhow::Result<()> {
        let repository = RepositoryRef {
            owner: "acme".into(),
            name: "site".into(),
            branch: "main".into(),
        };
        let head: Oid = "2222222222222222222222222222222222222222".parse()?;
        let mut builder = CommitBuilder::new(head, "feat(posts): rename hello");
        builder
            .add("outstatic/content/posts/hello-world.md", "hello\n")?
            .delete("outstatic/content/posts/hello.md")?;
        let input = CreateCommitOnBranchInput::new(&repository, &builder.build()?);

        let result = serde_json::to_value(&input)?;
        let expect = json!({
            "branch": {
                "repositoryNameWithOwner": "acme/site",
                "branchName": "main"
            },
            "message": { "headline": "feat(posts): rename hello" },
            "fileChanges": {
                "additions": [
                    { "path": "outstatic/content/posts/hello-world.md", "contents": "aGVsbG8K" }
                ],
                "deletions": [
                    { "path": "outstatic/content/posts/hello.md" }
                ]
            },
            "expectedHeadOid": "2222222222222222222222222222222222222222"
        });
        assert_eq!(result, expect);

        Ok(())
    }
}
