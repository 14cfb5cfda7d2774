// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git-backed headless CMS.
//!
//! Content lives as markdown and MDX documents inside a git repository.
//! Every change to that content, together with the index files describing
//! it, lands as a single atomic commit guarded by the branch head it was
//! derived from.
//!
//! # Layers
//!
//! - [`commit`]: capture head OID, accumulate file changes, submit them.
//! - [`remote`]: repository access through GitHub GraphQL or libgit2.
//! - [`metadata`]: `metadata.json`, `collections.json`, `singletons.json`,
//!   and schemas.
//! - [`store`]: content operations keeping all of the above consistent.
//! - [`query`]: read-side filtering over the metadata index.
//! - [`session`]: OAuth login and serialized token refresh.

pub mod commit;
pub mod config;
pub mod document;
pub mod metadata;
pub mod path;
pub mod query;
pub mod remote;
pub mod session;
pub mod store;

pub use store::{ContentStore, SchemaOwner, StoreError};
