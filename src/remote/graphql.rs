// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GraphQL documents and response shapes for GitHub's v4 API.

use crate::commit::oid::Oid;

use serde::Deserialize;

pub const HEAD_OID_QUERY: &str = r#"
query HeadOid($owner: String!, $name: String!, $branch: String!) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $branch) {
      target {
        oid
      }
    }
  }
}
"#;

pub const FILE_QUERY: &str = r#"
query File($owner: String!, $name: String!, $expression: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Blob {
        text
        isBinary
      }
    }
  }
}
"#;

pub const DIR_QUERY: &str = r#"
query Dir($owner: String!, $name: String!, $expression: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Tree {
        entries {
          path
          type
          object {
            ... on Blob {
              text
              isBinary
            }
          }
        }
      }
    }
  }
}
"#;

pub const CREATE_COMMIT_MUTATION: &str = r#"
mutation CreateCommit($input: CreateCommitOnBranchInput!) {
  createCommitOnBranch(input: $input) {
    commit {
      oid
      url
    }
  }
}
"#;

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct Response<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl ResponseError {
    /// Check if error reports that branch head no longer matches the
    /// expected head of a commit.
    pub fn is_stale_head(&self) -> bool {
        self.kind.as_deref() == Some("STALE_DATA")
            || self.message.contains("Expected branch to point to")
    }
}

#[derive(Debug, Deserialize)]
pub struct HeadOidData {
    pub repository: Option<HeadOidRepository>,
}

#[derive(Debug, Deserialize)]
pub struct HeadOidRepository {
    #[serde(rename = "ref")]
    pub reference: Option<RefNode>,
}

#[derive(Debug, Deserialize)]
pub struct RefNode {
    pub target: TargetNode,
}

#[derive(Debug, Deserialize)]
pub struct TargetNode {
    pub oid: Oid,
}

#[derive(Debug, Deserialize)]
pub struct ObjectData {
    pub repository: Option<ObjectRepository>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectRepository {
    pub object: Option<ObjectNode>,
}

/// Blob or tree node. Fields of the other kind stay empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    pub text: Option<String>,
    pub is_binary: Option<bool>,
    pub entries: Option<Vec<TreeEntryNode>>,
}

#[derive(Debug, Deserialize)]
pub struct TreeEntryNode {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub object: Option<ObjectNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitData {
    pub create_commit_on_branch: Option<CreateCommitPayload>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommitPayload {
    pub commit: Option<CommitNode>,
}

#[derive(Debug, Deserialize)]
pub struct CommitNode {
    pub oid: Oid,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detect_stale_head_errors() -> anyhow::Result<()> {
        let body = r#"{
            "data": { "createCommitOnBranch": null },
            "errors": [{
                "type": "STALE_DATA",
                "message": "Expected branch to point to \"abc\" but it did not. Pull and try again."
            }]
        }"#;
        let response: Response<CreateCommitData> = serde_json::from_str(body)?;

        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].is_stale_head());

        Ok(())
    }

    #[test]
    fn decode_tree_listing() -> anyhow::Result<()> {
        let body = r#"{
            "data": { "repository": { "object": { "entries": [
                {
                    "path": "content/posts/a.md",
                    "type": "blob",
                    "object": { "text": "a", "isBinary": false }
                },
                { "path": "content/posts/img", "type": "tree", "object": {} }
            ] } } }
        }"#;
        let response: Response<ObjectData> = serde_json::from_str(body)?;
        let entries = response
            .data
            .and_then(|data| data.repository)
            .and_then(|repository| repository.object)
            .and_then(|object| object.entries)
            .unwrap_or_default();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "blob");
        assert_eq!(entries[0].object.as_ref().and_then(|o| o.text.as_deref()), Some("a"));
        assert!(entries[1].object.as_ref().is_some_and(|o| o.text.is_none()));

        Ok(())
    }
}
