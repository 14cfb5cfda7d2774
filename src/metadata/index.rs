// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Denormalized document index stored as `metadata.json`.

use crate::{
    commit::oid::Oid,
    document::{Author, Document, Status},
    metadata::{schema::RESERVED_FIELDS, MetadataError, Result},
};

use chrono::{DateTime, Utc};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::warn;

/// Key holding [`SourceInfo`] of an entry.
pub const SOURCE_KEY: &str = "__outstatic";

/// Where an index entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Repository path of document file.
    pub path: String,

    /// Git blob id of document file contents.
    pub hash: Oid,

    /// Branch head the entry was written against.
    pub commit: Oid,
}

/// Summary of a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub title: String,
    pub status: Status,
    pub slug: String,
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    #[serde(rename = "__outstatic")]
    pub source: SourceInfo,

    /// Custom front matter fields.
    ///
    /// Never holds a key of the summary fields above.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl MetadataEntry {
    /// Summarize document stored at `path`.
    ///
    /// The `rendered` contents are the exact bytes committed for the
    /// document, so the recorded hash matches the blob git will store.
    /// Custom front matter keys that collide with summary fields are left
    /// out of the entry.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::Document`] if document has no valid slug.
    /// - Return [`MetadataError::Serialize`] if a custom field cannot be
    ///   represented as JSON.
    pub fn from_document(
        collection: impl Into<String>,
        path: impl Into<String>,
        document: &Document,
        rendered: &str,
        base: &Oid,
    ) -> Result<Self> {
        let front = &document.front_matter;
        let fields = front
            .fields
            .iter()
            .filter(|(key, _)| {
                let reserved = is_summary_key(key);
                if reserved {
                    warn!("leave front matter key {key:?} out of metadata index");
                }
                !reserved
            })
            .map(|(key, value)| serde_json::to_value(value).map(|value| (key.clone(), value)))
            .collect::<Result<BTreeMap<_, _>, serde_json::Error>>()?;

        Ok(Self {
            title: front.title.clone(),
            status: front.status,
            slug: document.resolved_slug()?,
            collection: collection.into(),
            published_at: front.published_at,
            author: front.author.clone(),
            description: front.description.clone(),
            cover_image: front.cover_image.clone(),
            source: SourceInfo {
                path: path.into(),
                hash: Oid::for_blob(rendered)?,
                commit: base.clone(),
            },
            fields,
        })
    }

    /// Look up summary or custom field by its JSON name.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(self.title.clone().into()),
            "slug" => Some(self.slug.clone().into()),
            "collection" => Some(self.collection.clone().into()),
            "status" => serde_json::to_value(self.status).ok(),
            "publishedAt" => self.published_at.map(|date| date.to_rfc3339().into()),
            "description" => self.description.clone().map(Into::into),
            "coverImage" => self.cover_image.clone().map(Into::into),
            "author" => self.author.as_ref().and_then(|author| serde_json::to_value(author).ok()),
            _ => self.fields.get(name).cloned(),
        }
    }
}

/// Index of every document in the repository.
///
/// # Invariant
///
/// - Entries are unique by source path.
/// - Entries stay sorted by source path, so rewrites produce stable diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataIndex {
    /// Branch head the index was last written against.
    #[serde(default)]
    pub commit: Option<Oid>,

    pub generated: DateTime<Utc>,

    #[serde(default)]
    metadata: Vec<MetadataEntry>,
}

impl MetadataIndex {
    /// Construct empty index.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            commit: None,
            generated: now,
            metadata: Vec::new(),
        }
    }

    /// Construct index from arbitrary entries.
    ///
    /// Later entries win over earlier entries of the same path.
    pub fn from_entries(
        now: DateTime<Utc>,
        entries: impl IntoIterator<Item = MetadataEntry>,
    ) -> Self {
        let mut index = Self::new(now);
        for entry in entries {
            index.upsert(entry);
        }
        index
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        self.metadata.as_slice()
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Insert entry, replacing any entry with the same source path.
    pub fn upsert(&mut self, entry: MetadataEntry) {
        match self.position(&entry.source.path) {
            Ok(index) => self.metadata[index] = entry,
            Err(index) => self.metadata.insert(index, entry),
        }
    }

    /// Remove entry by source path.
    pub fn remove_path(&mut self, path: &str) -> Option<MetadataEntry> {
        self.position(path).ok().map(|index| self.metadata.remove(index))
    }

    /// Remove every entry of target collection, returning how many were removed.
    pub fn remove_collection(&mut self, collection: &str) -> usize {
        let before = self.metadata.len();
        self.metadata.retain(|entry| entry.collection != collection);
        before - self.metadata.len()
    }

    /// Find entry by source path.
    pub fn get(&self, path: &str) -> Option<&MetadataEntry> {
        self.position(path).ok().map(|index| &self.metadata[index])
    }

    /// Find entry by collection and slug.
    pub fn find(&self, collection: &str, slug: &str) -> Option<&MetadataEntry> {
        self.metadata
            .iter()
            .find(|entry| entry.collection == collection && entry.slug == slug)
    }

    /// Iterate over entries of target collection.
    pub fn entries_in<'a>(
        &'a self,
        collection: &'a str,
    ) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
        self.metadata
            .iter()
            .filter(move |entry| entry.collection == collection)
    }

    /// Record branch head and generation time of index contents.
    pub fn stamp(&mut self, commit: &Oid, now: DateTime<Utc>) {
        self.commit = Some(commit.clone());
        self.generated = now;
    }

    fn position(&self, path: &str) -> Result<usize, usize> {
        self.metadata
            .binary_search_by(|entry| entry.source.path.as_str().cmp(path))
    }
}

impl FromStr for MetadataIndex {
    type Err = MetadataError;

    /// Parse `metadata.json`.
    ///
    /// Repeated keys inside an entry keep their first value, and entries
    /// that still fail to decode are skipped with a warning, so a damaged
    /// index can always be read and rebuilt.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let raw: RawIndex = serde_json::from_str(data).map_err(|source| MetadataError::Parse {
            source,
            path: "metadata.json".into(),
        })?;

        let mut index = Self {
            commit: raw.commit,
            generated: raw.generated,
            metadata: Vec::with_capacity(raw.metadata.len()),
        };

        // INVARIANT: Hand-edited files may be unsorted or hold duplicates.
        for FirstWins(object) in raw.metadata {
            match serde_json::from_value::<MetadataEntry>(Value::Object(object)) {
                Ok(entry) => index.upsert(entry),
                Err(error) => warn!("skip malformed metadata entry: {error}"),
            }
        }

        Ok(index)
    }
}

impl Display for MetadataIndex {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(fmt, "{json}")
    }
}

/// Check if key names a summary field of [`MetadataEntry`].
fn is_summary_key(key: &str) -> bool {
    key == SOURCE_KEY || RESERVED_FIELDS.contains(&key)
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(default)]
    commit: Option<Oid>,
    generated: DateTime<Utc>,
    #[serde(default)]
    metadata: Vec<FirstWins>,
}

/// JSON object keeping the first value of repeated keys.
struct FirstWins(Map<String, Value>);

impl<'de> Deserialize<'de> for FirstWins {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ObjectVisitor;

        impl<'de> Visitor<'de> for ObjectVisitor {
            type Value = FirstWins;

            fn expecting(&self, fmt: &mut Formatter<'_>) -> FmtResult {
                fmt.write_str("a metadata entry object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut object = Map::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    object.entry(key).or_insert(value);
                }
                Ok(FirstWins(object))
            }
        }

        deserializer.deserialize_map(ObjectVisitor)
    }
}
