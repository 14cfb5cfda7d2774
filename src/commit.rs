// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Content-commit pipeline.
//!
//! Every change oxistatic makes to a content repository lands as exactly one
//! commit. Nothing is ever written file-by-file. A change goes through three
//! stages:
//!
//! 1. __Capture__ the current head [`Oid`] of the content branch. This object
//!    id acts as an optimistic-concurrency token for the rest of the
//!    pipeline.
//! 2. __Build__ a changeset of file additions, replacements, and deletions
//!    keyed by repository path through a [`CommitBuilder`].
//! 3. __Submit__ the changeset together with the captured object id. The
//!    remote applies the whole changeset atomically, or rejects all of it if
//!    the branch moved in the meantime.
//!
//! # Concurrent Edits
//!
//! Two editors working on the same branch will both capture the same head.
//! Whoever submits first wins. The second submission carries a stale
//! expected head and fails wholesale with
//! [`RemoteError::StaleHead`](crate::remote::RemoteError::StaleHead). The
//! caller must re-read repository state and rebuild its changeset on top of
//! the new head.
//!
//! # See Also
//!
//! 1. [GitHub GraphQL - createCommitOnBranch](https://docs.github.com/en/graphql/reference/mutations#createcommitonbranch)

pub mod builder;
pub mod oid;
pub mod submit;

pub use builder::{CommitBuilder, CommitError, CommitMessage, CommitRequest, FileChanges};
pub use oid::{Oid, OidError};
pub use submit::{submit, CreateCommitOnBranchInput};
