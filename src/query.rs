// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Query-like read API over the metadata index.
//!
//! Sites consuming content rarely need the whole repository. They want
//! "the five latest published posts" or "the post with this slug". A
//! [`Query`] answers these from `metadata.json` alone, and [`LocalContent`]
//! loads full documents from a checked-out content directory only for the
//! entries actually selected.

use crate::{
    document::{Document, DocumentError, Format, Status},
    metadata::{ContentLayout, MetadataEntry, MetadataError, MetadataIndex},
};

use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Direction of a sort.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filter, sort, and page through metadata entries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    collection: Option<String>,
    status: Option<Status>,
    slug: Option<String>,
    fields: Vec<(String, Value)>,
    sort: Vec<(String, SortOrder)>,
    skip: usize,
    limit: Option<usize>,
    select: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Require field to equal value.
    pub fn field_eq(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Sort by field. Later calls break ties of earlier ones.
    pub fn sort(mut self, name: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((name.into(), order));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict [`Query::project`] output to target fields.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Check if entry passes every filter.
    pub fn matches(&self, entry: &MetadataEntry) -> bool {
        if self.collection.as_ref().is_some_and(|c| *c != entry.collection) {
            return false;
        }

        if self.status.is_some_and(|status| status != entry.status) {
            return false;
        }

        if self.slug.as_ref().is_some_and(|slug| *slug != entry.slug) {
            return false;
        }

        self.fields
            .iter()
            .all(|(name, value)| entry.field(name).as_ref() == Some(value))
    }

    /// Select matching entries from index.
    pub fn execute<'a>(&self, index: &'a MetadataIndex) -> Vec<&'a MetadataEntry> {
        let mut entries = index
            .entries()
            .iter()
            .filter(|entry| self.matches(entry))
            .collect::<Vec<_>>();

        if !self.sort.is_empty() {
            entries.sort_by(|lhs, rhs| self.compare(lhs, rhs));
        }

        entries
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Render entry as JSON object holding selected fields only.
    pub fn project(&self, entry: &MetadataEntry) -> Value {
        let Some(select) = &self.select else {
            return serde_json::to_value(entry).unwrap_or(Value::Null);
        };

        let object = select
            .iter()
            .filter_map(|name| entry.field(name).map(|value| (name.clone(), value)))
            .collect::<Map<_, _>>();

        Value::Object(object)
    }

    fn compare(&self, lhs: &MetadataEntry, rhs: &MetadataEntry) -> Ordering {
        for (name, order) in &self.sort {
            let ordering = compare_values(lhs.field(name).as_ref(), rhs.field(name).as_ref());
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

/// Order JSON values of the same kind. Missing values sort last.
fn compare_values(lhs: Option<&Value>, rhs: Option<&Value>) -> Ordering {
    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(lhs)), Some(Value::Number(rhs))) => {
            let lhs = lhs.as_f64().unwrap_or(f64::NAN);
            let rhs = rhs.as_f64().unwrap_or(f64::NAN);
            lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(lhs)), Some(Value::Bool(rhs))) => lhs.cmp(rhs),
        (Some(Value::String(lhs)), Some(Value::String(rhs))) => lhs.cmp(rhs),
        (Some(lhs), Some(rhs)) => lhs.to_string().cmp(&rhs.to_string()),
    }
}

/// Content read from a checked-out repository.
#[derive(Debug, Clone)]
pub struct LocalContent {
    root: PathBuf,
    index: MetadataIndex,
}

impl LocalContent {
    /// Load metadata index of repository checked out at `root`.
    ///
    /// # Errors
    ///
    /// - Return [`QueryError::Read`] if `metadata.json` cannot be read.
    /// - Return [`QueryError::Metadata`] if `metadata.json` is malformed.
    #[instrument(skip(layout), level = "debug")]
    pub fn open(root: impl AsRef<Path> + std::fmt::Debug, layout: &ContentLayout) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let path = root.join(layout.metadata_path());
        let data = fs::read_to_string(&path).map_err(|source| QueryError::Read { source, path })?;
        let index = data.parse::<MetadataIndex>()?;
        debug!("loaded {} metadata entries", index.len());

        Ok(Self { root, index })
    }

    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Select metadata entries matching query.
    pub fn query(&self, query: &Query) -> Vec<&MetadataEntry> {
        query.execute(&self.index)
    }

    /// Load full document by collection and slug.
    ///
    /// Returns `None` if no such document is indexed.
    ///
    /// # Errors
    ///
    /// - Return [`QueryError::Read`] if indexed document file cannot be read.
    /// - Return [`QueryError::Document`] if document is malformed.
    pub fn get_document(&self, collection: &str, slug: &str) -> Result<Option<Document>> {
        let Some(entry) = self.index.find(collection, slug) else {
            return Ok(None);
        };

        self.load(entry).map(Some)
    }

    /// Load full document behind metadata entry.
    ///
    /// # Errors
    ///
    /// - Return [`QueryError::Read`] if document file cannot be read.
    /// - Return [`QueryError::Document`] if document is malformed.
    pub fn load(&self, entry: &MetadataEntry) -> Result<Document> {
        let path = self.root.join(&entry.source.path);
        let data = fs::read_to_string(&path).map_err(|source| QueryError::Read { source, path })?;
        let format = Format::from_path(&entry.source.path).unwrap_or_default();

        Ok(Document::parse(&data, format)?)
    }
}

/// Query error types.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Content file cannot be read from disk.
    #[error("failed to read {:?}", path)]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Friendly result alias :3
type Result<T, E = QueryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commit::oid::Oid, metadata::SourceInfo};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    const OID: &str = "1111111111111111111111111111111111111111";

    fn entry(slug: &str, status: Status, day: u32, rating: i64) -> anyhow::Result<MetadataEntry> {
        let oid: Oid = OID.parse()?;
        Ok(MetadataEntry {
            title: slug.to_uppercase(),
            status,
            slug: slug.into(),
            collection: "posts".into(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap()),
            author: None,
            description: None,
            cover_image: None,
            source: SourceInfo {
                path: format!("outstatic/content/posts/{slug}.md"),
                hash: oid.clone(),
                commit: oid,
            },
            fields: BTreeMap::from([("rating".to_string(), json!(rating))]),
        })
    }

    fn index() -> anyhow::Result<MetadataIndex> {
        Ok(MetadataIndex::from_entries(
            Utc::now(),
            [
                entry("a", Status::Published, 3, 2)?,
                entry("b", Status::Draft, 1, 5)?,
                entry("c", Status::Published, 2, 5)?,
                entry("d", Status::Published, 4, 1)?,
            ],
        ))
    }

    fn slugs(entries: Vec<&MetadataEntry>) -> Vec<&str> {
        entries.into_iter().map(|entry| entry.slug.as_str()).collect()
    }

    #[test]
    fn filter_and_sort() -> anyhow::Result<()> {
        let index = index()?;

        let query = Query::new()
            .collection("posts")
            .status(Status::Published)
            .sort("publishedAt", SortOrder::Descending);
        assert_eq!(slugs(query.execute(&index)), vec!["d", "a", "c"]);

        let query = Query::new()
            .sort("rating", SortOrder::Descending)
            .sort("slug", SortOrder::Ascending);
        assert_eq!(slugs(query.execute(&index)), vec!["b", "c", "a", "d"]);

        let query = Query::new().field_eq("rating", 5);
        assert_eq!(slugs(query.execute(&index)), vec!["b", "c"]);

        Ok(())
    }

    #[test]
    fn skip_and_limit() -> anyhow::Result<()> {
        let index = index()?;
        let query = Query::new().sort("slug", SortOrder::Ascending).skip(1).limit(2);
        assert_eq!(slugs(query.execute(&index)), vec!["b", "c"]);

        let query = Query::new().skip(10);
        assert!(query.execute(&index).is_empty());

        Ok(())
    }

    #[test]
    fn project_selected_fields() -> anyhow::Result<()> {
        let entry = entry("a", Status::Published, 3, 2)?;
        let query = Query::new().select(["title", "rating", "missing"]);

        assert_eq!(query.project(&entry), json!({ "title": "A", "rating": 2 }));

        Ok(())
    }

    #[test]
    fn local_content_loads_documents() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let layout = ContentLayout::default();

        let mut document = Document::new("Hello", "Body.\n");
        document.front_matter.slug = "hello".into();
        document.front_matter.status = Status::Published;
        let rendered = document.render()?;
        let path = format!("{}/posts/hello.md", layout.root());
        let oid: Oid = OID.parse()?;
        let entry = MetadataEntry::from_document("posts", &path, &document, &rendered, &oid)?;
        let index = MetadataIndex::from_entries(Utc::now(), [entry]);

        fs::create_dir_all(root.path().join(layout.root()).join("posts"))?;
        fs::write(root.path().join(&path), &rendered)?;
        fs::write(root.path().join(layout.metadata_path()), index.to_string())?;

        let content = LocalContent::open(root.path(), &layout)?;
        assert_eq!(content.query(&Query::new().status(Status::Published)).len(), 1);
        assert_eq!(content.get_document("posts", "hello")?, Some(document));
        assert_eq!(content.get_document("posts", "nope")?, None);

        Ok(())
    }

    #[test]
    fn local_content_without_index_is_error() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let result = LocalContent::open(root.path(), &ContentLayout::default());
        assert!(matches!(result, Err(QueryError::Read { .. })));

        Ok(())
    }
}
