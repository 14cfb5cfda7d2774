// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Changeset accumulation.
//!
//! A [`CommitBuilder`] collects every file touched by a single content
//! operation, e.g., a document, its metadata index, and its schema, so that
//! they can be submitted together as one atomic commit.

use crate::commit::oid::Oid;

use std::collections::{BTreeMap, BTreeSet};

/// Set of file changes keyed by repository path.
///
/// # Invariant
///
/// - A path is either pending addition or pending deletion, never both.
/// - Later additions to the same path replace earlier contents.
/// - Paths are stored normalized and iterate in sorted order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileChanges {
    additions: BTreeMap<String, Vec<u8>>,
    deletions: BTreeSet<String>,
}

impl FileChanges {
    /// Construct empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace file contents at target path.
    ///
    /// Cancels any pending deletion of the same path.
    ///
    /// # Errors
    ///
    /// - Return [`CommitError::InvalidPath`] if path cannot be normalized.
    pub fn add(&mut self, path: impl AsRef<str>, contents: impl Into<Vec<u8>>) -> Result<()> {
        let path = normalize_path(path.as_ref())?;
        self.deletions.remove(&path);
        self.additions.insert(path, contents.into());

        Ok(())
    }

    /// Delete file at target path.
    ///
    /// Cancels any pending addition of the same path.
    ///
    /// # Errors
    ///
    /// - Return [`CommitError::InvalidPath`] if path cannot be normalized.
    pub fn delete(&mut self, path: impl AsRef<str>) -> Result<()> {
        let path = normalize_path(path.as_ref())?;
        self.additions.remove(&path);
        self.deletions.insert(path);

        Ok(())
    }

    /// Pending additions in path order.
    pub fn additions(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.additions
            .iter()
            .map(|(path, contents)| (path.as_str(), contents.as_slice()))
    }

    /// Pending deletions in path order.
    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.deletions.iter().map(String::as_str)
    }

    /// Contents pending for target path, if any.
    pub fn addition(&self, path: impl AsRef<str>) -> Option<&[u8]> {
        let path = normalize_path(path.as_ref()).ok()?;
        self.additions.get(&path).map(Vec::as_slice)
    }

    /// Check if target path is pending deletion.
    pub fn is_deleted(&self, path: impl AsRef<str>) -> bool {
        normalize_path(path.as_ref())
            .map(|path| self.deletions.contains(&path))
            .unwrap_or(false)
    }

    /// Total number of touched paths.
    pub fn len(&self) -> usize {
        self.additions.len() + self.deletions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Commit message split into headline and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub headline: String,
    pub body: Option<String>,
}

impl CommitMessage {
    /// Render message the way git stores it.
    pub fn to_git_message(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n\n{}", self.headline, body),
            None => self.headline.clone(),
        }
    }
}

/// Fully built commit ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Head the changeset was built against.
    pub expected_head: Oid,

    /// Message of the new commit.
    pub message: CommitMessage,

    /// Files to add, replace, or delete.
    pub changes: FileChanges,
}

/// Builder for a single atomic commit.
///
/// Carries the expected head captured before any repository state was read,
/// so the resulting [`CommitRequest`] can only apply on top of the exact
/// state it was derived from.
#[derive(Debug, Clone)]
pub struct CommitBuilder {
    expected_head: Oid,
    headline: String,
    body: Option<String>,
    changes: FileChanges,
}

impl CommitBuilder {
    /// Construct new commit builder against captured head.
    pub fn new(expected_head: Oid, headline: impl Into<String>) -> Self {
        Self {
            expected_head,
            headline: headline.into(),
            body: None,
            changes: FileChanges::new(),
        }
    }

    /// Set body of commit message.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add or replace file contents.
    ///
    /// # Errors
    ///
    /// - Return [`CommitError::InvalidPath`] if path cannot be normalized.
    pub fn add(
        &mut self,
        path: impl AsRef<str>,
        contents: impl Into<Vec<u8>>,
    ) -> Result<&mut Self> {
        self.changes.add(path, contents)?;
        Ok(self)
    }

    /// Delete file.
    ///
    /// # Errors
    ///
    /// - Return [`CommitError::InvalidPath`] if path cannot be normalized.
    pub fn delete(&mut self, path: impl AsRef<str>) -> Result<&mut Self> {
        self.changes.delete(path)?;
        Ok(self)
    }

    /// Head this commit expects the branch to point at.
    pub fn expected_head(&self) -> &Oid {
        &self.expected_head
    }

    /// Current changeset.
    pub fn changes(&self) -> &FileChanges {
        &self.changes
    }

    /// Finish building commit.
    ///
    /// # Errors
    ///
    /// - Return [`CommitError::EmptyHeadline`] if commit message is blank.
    /// - Return [`CommitError::Empty`] if no file changes were recorded.
    pub fn build(self) -> Result<CommitRequest> {
        let headline = self.headline.trim().to_string();
        if headline.is_empty() {
            return Err(CommitError::EmptyHeadline);
        }

        if self.changes.is_empty() {
            return Err(CommitError::Empty);
        }

        Ok(CommitRequest {
            expected_head: self.expected_head,
            message: CommitMessage {
                headline,
                body: self.body.filter(|body| !body.trim().is_empty()),
            },
            changes: self.changes,
        })
    }
}

/// Normalize repository path.
///
/// Strips leading "/" and "./" components, and collapses repeated
/// separators. Repository paths always use "/" as the separator.
///
/// # Errors
///
/// - Return [`CommitError::InvalidPath`] if path is empty or escapes the
///   repository through a ".." component.
pub fn normalize_path(path: &str) -> Result<String> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(CommitError::InvalidPath(path.to_string())),
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(CommitError::InvalidPath(path.to_string()));
    }

    Ok(parts.join("/"))
}

/// Commit construction errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// Path is empty or escapes repository.
    #[error("invalid repository path {0:?}")]
    InvalidPath(String),

    /// Commit would not change anything.
    #[error("commit contains no file changes")]
    Empty,

    /// Commit message headline is blank.
    #[error("commit headline cannot be empty")]
    EmptyHeadline,
}

/// Friendly result alias :3
type Result<T, E = CommitError> = std::result::Result<T, E>;
