// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Metadata and schema bookkeeping.
//!
//! Besides documents themselves, a content repository carries a few JSON
//! files that describe and index them:
//!
//! - `metadata.json`: denormalized index of every document's summary fields,
//!   so listing views never have to fetch every document.
//! - `collections.json`: registered collections and where their documents
//!   live.
//! - `singletons.json`: registered singletons.
//! - `<collection>/schema.json`: custom fields of a collection.
//! - `_singletons/<slug>.schema.json`: custom fields of a singleton.
//!
//! # Content Layout
//!
//! All of these files live under the __content root__, which defaults to
//! `outstatic/content`, optionally nested inside a monorepo subdirectory:
//!
//! ```text
//! <monorepo>/outstatic/content/
//! ├── collections.json
//! ├── singletons.json
//! ├── metadata.json
//! ├── posts/
//! │   ├── schema.json
//! │   └── hello-world.md
//! └── _singletons/
//!     ├── about.md
//!     └── about.schema.json
//! ```
//!
//! # Consistency
//!
//! These files must never drift from the file tree. The content store
//! always rewrites them in the same commit as the documents they describe.

pub mod collections;
pub mod index;
pub mod schema;

pub use collections::{CollectionEntry, Collections, SingletonEntry, Singletons};
pub use index::{MetadataEntry, MetadataIndex, SourceInfo};
pub use schema::{CustomField, DataType, FieldType, Schema, TagValue};

/// Directory holding singleton documents, relative to content root.
pub const SINGLETONS_DIR: &str = "_singletons";

/// Collection name singletons are indexed under in the metadata index.
pub const SINGLETONS_COLLECTION: &str = "_singletons";

/// Resolve repository paths of content files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayout {
    root: String,
}

impl ContentLayout {
    /// Construct layout from optional monorepo subdirectory and content path.
    pub fn new(monorepo_path: &str, content_path: &str) -> Self {
        let root = [monorepo_path, content_path]
            .iter()
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self { root }
    }

    /// Content root relative to repository root.
    pub fn root(&self) -> &str {
        self.root.as_str()
    }

    /// Join path onto content root.
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        match (self.root.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => self.root.clone(),
            (false, false) => format!("{}/{path}", self.root),
        }
    }

    pub fn metadata_path(&self) -> String {
        self.join("metadata.json")
    }

    pub fn collections_path(&self) -> String {
        self.join("collections.json")
    }

    pub fn singletons_path(&self) -> String {
        self.join("singletons.json")
    }

    pub fn schema_path(&self, collection: &str) -> String {
        self.join(&format!("{collection}/schema.json"))
    }

    /// Directory holding documents of a collection without custom path.
    pub fn default_collection_dir(&self, collection: &str) -> String {
        self.join(collection)
    }

    pub fn singletons_dir(&self) -> String {
        self.join(SINGLETONS_DIR)
    }

    pub fn singleton_schema_path(&self, slug: &str) -> String {
        self.join(&format!("{SINGLETONS_DIR}/{slug}.schema.json"))
    }
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self::new("", "outstatic/content")
    }
}

/// All possible error types for metadata bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Index file cannot be parsed.
    #[error("failed to parse {:?}", path)]
    Parse {
        #[source]
        source: serde_json::Error,
        path: String,
    },

    /// Index file cannot be serialized.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// Collection slug already registered.
    #[error("collection {0:?} already exists")]
    DuplicateCollection(String),

    /// Custom field name collides with built-in front matter.
    #[error("field name {0:?} is reserved")]
    ReservedField(String),

    /// Custom field already defined.
    #[error("field {0:?} already exists")]
    DuplicateField(String),

    /// Custom field not defined.
    #[error("field {0:?} does not exist")]
    UnknownField(String),

    /// Custom field name is not a plain identifier.
    #[error("invalid field name {0:?}; use letters, digits, and underscores")]
    InvalidFieldName(String),

    /// Required custom field is absent from document.
    #[error("required field {0:?} is missing")]
    MissingField(String),

    /// Custom field holds value of wrong type.
    #[error("field {field:?} must be {expected}")]
    FieldType { field: String, expected: DataType },

    /// Document cannot be rendered or slugged.
    #[error(transparent)]
    Document(#[from] crate::document::DocumentError),

    /// Blob id cannot be computed.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = MetadataError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_paths() {
        let layout = ContentLayout::default();
        assert_eq!(layout.metadata_path(), "outstatic/content/metadata.json");
        assert_eq!(layout.schema_path("posts"), "outstatic/content/posts/schema.json");
        assert_eq!(
            layout.singleton_schema_path("about"),
            "outstatic/content/_singletons/about.schema.json"
        );

        let layout = ContentLayout::new("/apps/web/", "outstatic/content/");
        assert_eq!(layout.root(), "apps/web/outstatic/content");
        assert_eq!(layout.collections_path(), "apps/web/outstatic/content/collections.json");

        let layout = ContentLayout::new("", "");
        assert_eq!(layout.singletons_path(), "singletons.json");
    }
}
