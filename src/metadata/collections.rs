// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Registries of collections and singletons.

use crate::metadata::{MetadataError, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Registered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub title: String,
    pub slug: String,

    /// Directory holding documents of collection.
    pub path: String,

    #[serde(default)]
    pub children: Vec<CollectionEntry>,
}

/// Contents of `collections.json`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collections(Vec<CollectionEntry>);

impl Collections {
    /// Register new collection.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::DuplicateCollection`] if slug is taken.
    pub fn insert(&mut self, entry: CollectionEntry) -> Result<()> {
        if self.get(&entry.slug).is_some() {
            return Err(MetadataError::DuplicateCollection(entry.slug));
        }

        self.0.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, slug: &str) -> Option<CollectionEntry> {
        let index = self.0.iter().position(|entry| entry.slug == slug)?;
        Some(self.0.remove(index))
    }

    pub fn get(&self, slug: &str) -> Option<&CollectionEntry> {
        self.0.iter().find(|entry| entry.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Collections {
    type Err = MetadataError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(data).map_err(|source| MetadataError::Parse {
            source,
            path: "collections.json".into(),
        })
    }
}

impl Display for Collections {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(fmt, "{json}")
    }
}

/// Registered singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingletonEntry {
    pub title: String,
    pub slug: String,

    /// File path of singleton document.
    pub path: String,

    /// Directory holding singleton document.
    pub directory: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Contents of `singletons.json`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Singletons(Vec<SingletonEntry>);

impl Singletons {
    /// Insert singleton, replacing any singleton with the same slug.
    pub fn upsert(&mut self, entry: SingletonEntry) {
        match self.0.iter_mut().find(|current| current.slug == entry.slug) {
            Some(current) => *current = entry,
            None => self.0.push(entry),
        }
    }

    pub fn remove(&mut self, slug: &str) -> Option<SingletonEntry> {
        let index = self.0.iter().position(|entry| entry.slug == slug)?;
        Some(self.0.remove(index))
    }

    pub fn get(&self, slug: &str) -> Option<&SingletonEntry> {
        self.0.iter().find(|entry| entry.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SingletonEntry> {
        self.0.iter()
    }
}

impl FromStr for Singletons {
    type Err = MetadataError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(data).map_err(|source| MetadataError::Parse {
            source,
            path: "singletons.json".into(),
        })
    }
}

impl Display for Singletons {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(fmt, "{json}")
    }
}
