// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git object identifiers.

use git2::ObjectType;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Full 40 digit hexadecimal git object id.
///
/// Commit ids double as optimistic-concurrency tokens for the commit
/// pipeline, while blob ids identify document contents inside the metadata
/// index.
///
/// # Invariant
///
/// - Always exactly 40 lowercase hexadecimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Compute the git blob id of raw file contents.
    ///
    /// Produces the same id that `git hash-object` would, so metadata entries
    /// can be matched against tree entries without downloading file contents.
    ///
    /// # Errors
    ///
    /// - Return [`git2::Error`] if libgit2 fails to hash the contents.
    pub fn for_blob(contents: impl AsRef<[u8]>) -> Result<Self, git2::Error> {
        git2::Oid::hash_object(ObjectType::Blob, contents.as_ref()).map(Self::from)
    }

    /// Treat object id as string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Abbreviated seven digit form for log output.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let data = data.trim();
        if data.len() != 40 || !data.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(OidError::Invalid(data.to_string()));
        }

        Ok(Self(data.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Oid {
    type Error = OidError;

    fn try_from(data: String) -> Result<Self, Self::Error> {
        data.parse()
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl From<git2::Oid> for Oid {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

impl Display for Oid {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// Object id parsing error.
#[derive(Clone, Debug, thiserror::Error)]
pub enum OidError {
    /// Input is not a full hexadecimal object id.
    #[error("invalid git object id {0:?}")]
    Invalid(String),
}
