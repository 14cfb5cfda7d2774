// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Content store operations.
//!
//! The __content store__ is the write side of the CMS. Every operation
//! follows the same shape:
//!
//! 1. Capture the branch head OID.
//! 2. Read `collections.json`, `singletons.json`, and `metadata.json` at
//!    that exact OID.
//! 3. Build one changeset holding the content change _and_ every index
//!    file it affects.
//! 4. Submit the changeset against the captured OID.
//!
//! Because the index files are read and written against the same head, and
//! the commit is rejected if that head moved, a concurrent edit can never
//! leave the index out of sync with the file tree. The losing writer gets
//! [`RemoteError::StaleHead`] and simply retries from a fresh snapshot.

use crate::{
    commit::{
        builder::{normalize_path, CommitBuilder, CommitError},
        oid::Oid,
        submit::submit,
    },
    document::{slugify, Document, DocumentError, Format, Status},
    metadata::{
        CollectionEntry, Collections, ContentLayout, CustomField, MetadataEntry, MetadataError,
        MetadataIndex, Schema, SingletonEntry, Singletons, SINGLETONS_COLLECTION,
    },
    remote::{CommitOutcome, Remote, RemoteError},
};

use chrono::Utc;
use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::{debug, info, instrument, warn};

/// Owner of a custom field schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOwner {
    Collection(String),
    Singleton(String),
}

impl Display for SchemaOwner {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Collection(slug) => write!(fmt, "collection {slug}"),
            Self::Singleton(slug) => write!(fmt, "singleton {slug}"),
        }
    }
}

/// Index files read at a single branch head.
#[derive(Debug, Clone)]
struct Snapshot {
    head: Oid,
    collections: Collections,
    singletons: Singletons,
    index: MetadataIndex,
}

/// Write and read content through a [`Remote`].
pub struct ContentStore<R>
where
    R: Remote,
{
    remote: R,
    layout: ContentLayout,
}

impl<R> ContentStore<R>
where
    R: Remote,
{
    /// Construct new content store.
    pub fn new(remote: R, layout: ContentLayout) -> Self {
        Self { remote, layout }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    /// Register new collection with an empty schema.
    ///
    /// Documents of the collection live in `path`, or in a directory named
    /// after the collection slug under the content root.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Metadata`] if slug is already taken.
    /// - Return [`StoreError::Document`] if title yields no slug.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_collection(
        &self,
        title: &str,
        path: Option<&str>,
    ) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let slug = slugify(title)?;
        let directory = match path {
            Some(path) => normalize_path(path)?,
            None => self.layout.default_collection_dir(&slug),
        };

        snapshot.collections.insert(CollectionEntry {
            title: title.to_string(),
            slug: slug.clone(),
            path: directory.clone(),
            children: Vec::new(),
        })?;

        let schema = Schema::new(title, directory);
        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): create collection {slug}"),
        );
        builder
            .add(self.layout.schema_path(&slug), schema.to_string())?
            .add(self.layout.collections_path(), snapshot.collections.to_string())?;

        self.finish(builder, snapshot).await
    }

    /// Unregister collection and drop it from the metadata index.
    ///
    /// Document files are only removed if `remove_documents` is set.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownCollection`] if collection does not exist.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_collection(
        &self,
        slug: &str,
        remove_documents: bool,
    ) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let entry = snapshot
            .collections
            .remove(slug)
            .ok_or_else(|| StoreError::UnknownCollection(slug.to_string()))?;

        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): delete collection {slug}"),
        );
        let schema_path = self.layout.schema_path(slug);
        if self.exists(&snapshot.head, &schema_path).await? {
            builder.delete(&schema_path)?;
        }

        if remove_documents {
            let files = self.remote.read_dir(&snapshot.head, &entry.path).await?;
            for file in files.iter().filter(|file| Format::from_path(&file.path).is_some()) {
                debug!("remove document {:?}", file.path);
                builder.delete(&file.path)?;
            }
        }

        let removed = snapshot.index.remove_collection(slug);
        debug!("dropped {removed} metadata entries");
        builder.add(self.layout.collections_path(), snapshot.collections.to_string())?;

        self.finish(builder, snapshot).await
    }

    /// Create or update document of a collection.
    ///
    /// Pass the slug the document was loaded under as `previous_slug` when
    /// updating an existing document. If the slug changed, the old file is
    /// removed in the same commit. A new document with a slug already in use
    /// is rejected.
    ///
    /// Published documents without a publication date are stamped with the
    /// current time.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownCollection`] if collection does not exist.
    /// - Return [`StoreError::SlugTaken`] if slug belongs to another document.
    /// - Return [`StoreError::NotFound`] if `previous_slug` is not indexed.
    /// - Return [`StoreError::Metadata`] if document fails schema validation.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self, document), level = "debug")]
    pub async fn save_document(
        &self,
        collection: &str,
        mut document: Document,
        previous_slug: Option<&str>,
    ) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let entry = snapshot
            .collections
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        let schema = self
            .read_schema(&snapshot.head, &self.layout.schema_path(collection))
            .await?
            .unwrap_or_else(|| Schema::new(&entry.title, &entry.path));

        let slug = prepare(&mut document)?;
        schema.validate(&document.front_matter)?;

        let previous = match previous_slug {
            Some(previous) => Some(
                snapshot
                    .index
                    .find(collection, previous)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.to_string(),
                        slug: previous.to_string(),
                    })?,
            ),
            None => None,
        };

        // INVARIANT: Keep file extension of existing documents.
        if let Some(format) = previous.as_ref().and_then(|p| Format::from_path(&p.source.path)) {
            document.format = format;
        }
        let path = format!("{}/{}", entry.path, document.format.file_name(&slug));

        let renamed = previous.as_ref().is_none_or(|previous| previous.slug != slug);
        if renamed {
            let taken = snapshot.index.find(collection, &slug).is_some()
                || self.exists(&snapshot.head, &path).await?;
            if taken {
                return Err(StoreError::SlugTaken {
                    collection: collection.to_string(),
                    slug,
                });
            }
        }

        let headline = match &previous {
            Some(_) => format!("feat(content): update {collection}/{slug}"),
            None => format!("feat(content): create {collection}/{slug}"),
        };
        let mut builder = CommitBuilder::new(snapshot.head.clone(), headline);
        let rendered = document.render()?;
        builder.add(&path, rendered.as_bytes())?;

        if let Some(previous) = &previous {
            if previous.source.path != path {
                info!("rename {:?} to {:?}", previous.source.path, path);
                if self.exists(&snapshot.head, &previous.source.path).await? {
                    builder.delete(&previous.source.path)?;
                }
                snapshot.index.remove_path(&previous.source.path);
            }
        }

        let metadata =
            MetadataEntry::from_document(collection, &path, &document, &rendered, &snapshot.head)?;
        snapshot.index.upsert(metadata);

        self.finish(builder, snapshot).await
    }

    /// Delete document of a collection.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotFound`] if document is not indexed.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_document(&self, collection: &str, slug: &str) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let entry = snapshot
            .index
            .find(collection, slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                slug: slug.to_string(),
            })?;

        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): delete {collection}/{slug}"),
        );
        if self.exists(&snapshot.head, &entry.source.path).await? {
            builder.delete(&entry.source.path)?;
        } else {
            warn!("{:?} is indexed but missing from repository", entry.source.path);
        }
        snapshot.index.remove_path(&entry.source.path);

        self.finish(builder, snapshot).await
    }

    /// Create or update singleton.
    ///
    /// Renaming a singleton carries its schema along to the new slug.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::SlugTaken`] if slug belongs to another singleton.
    /// - Return [`StoreError::NotFound`] if `previous_slug` does not exist.
    /// - Return [`StoreError::Metadata`] if document fails schema validation.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self, document), level = "debug")]
    pub async fn save_singleton(
        &self,
        mut document: Document,
        previous_slug: Option<&str>,
    ) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let slug = prepare(&mut document)?;

        let previous = match previous_slug {
            Some(previous) => Some(snapshot.singletons.get(previous).cloned().ok_or_else(|| {
                StoreError::NotFound {
                    collection: SINGLETONS_COLLECTION.to_string(),
                    slug: previous.to_string(),
                }
            })?),
            None => None,
        };

        let renamed = previous.as_ref().is_none_or(|previous| previous.slug != slug);
        if renamed && snapshot.singletons.get(&slug).is_some() {
            return Err(StoreError::SlugTaken {
                collection: SINGLETONS_COLLECTION.to_string(),
                slug,
            });
        }

        let schema_slug = previous
            .as_ref()
            .map_or(slug.as_str(), |previous| previous.slug.as_str());
        let schema_path = self.layout.singleton_schema_path(schema_slug);
        let schema = self.read_schema(&snapshot.head, &schema_path).await?;
        if let Some(schema) = &schema {
            schema.validate(&document.front_matter)?;
        }

        if let Some(format) = previous.as_ref().and_then(|p| Format::from_path(&p.path)) {
            document.format = format;
        }
        let directory = self.layout.singletons_dir();
        let path = format!("{directory}/{}", document.format.file_name(&slug));

        let headline = match &previous {
            Some(_) => format!("feat(content): update singleton {slug}"),
            None => format!("feat(content): create singleton {slug}"),
        };
        let mut builder = CommitBuilder::new(snapshot.head.clone(), headline);
        let rendered = document.render()?;
        builder.add(&path, rendered.as_bytes())?;

        if let Some(previous) = &previous {
            if previous.path != path {
                info!("rename {:?} to {:?}", previous.path, path);
                if self.exists(&snapshot.head, &previous.path).await? {
                    builder.delete(&previous.path)?;
                }
                snapshot.index.remove_path(&previous.path);
                snapshot.singletons.remove(&previous.slug);
            }

            if let Some(schema) = schema.as_ref().filter(|_| previous.slug != slug) {
                let mut schema = schema.clone();
                schema.path = path.clone();
                builder
                    .delete(&schema_path)?
                    .add(self.layout.singleton_schema_path(&slug), schema.to_string())?;
            }
        }

        snapshot.singletons.upsert(SingletonEntry {
            title: document.front_matter.title.clone(),
            slug: slug.clone(),
            path: path.clone(),
            directory,
            published_at: document.front_matter.published_at,
        });
        builder.add(self.layout.singletons_path(), snapshot.singletons.to_string())?;

        let metadata = MetadataEntry::from_document(
            SINGLETONS_COLLECTION,
            &path,
            &document,
            &rendered,
            &snapshot.head,
        )?;
        snapshot.index.upsert(metadata);

        self.finish(builder, snapshot).await
    }

    /// Delete singleton along with its schema.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotFound`] if singleton does not exist.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_singleton(&self, slug: &str) -> Result<CommitOutcome> {
        let mut snapshot = self.snapshot().await?;
        let entry = snapshot.singletons.remove(slug).ok_or_else(|| StoreError::NotFound {
            collection: SINGLETONS_COLLECTION.to_string(),
            slug: slug.to_string(),
        })?;

        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): delete singleton {slug}"),
        );
        let schema_path = self.layout.singleton_schema_path(slug);
        for path in [entry.path.as_str(), schema_path.as_str()] {
            if self.exists(&snapshot.head, path).await? {
                builder.delete(path)?;
            }
        }
        snapshot.index.remove_path(&entry.path);
        builder.add(self.layout.singletons_path(), snapshot.singletons.to_string())?;

        self.finish(builder, snapshot).await
    }

    /// Define new custom field in schema of collection or singleton.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownCollection`] or [`StoreError::NotFound`]
    ///   if schema owner does not exist.
    /// - Return [`StoreError::Metadata`] if field name is invalid, reserved,
    ///   or already defined.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self, field), level = "debug")]
    pub async fn add_field(
        &self,
        owner: &SchemaOwner,
        name: &str,
        field: CustomField,
    ) -> Result<CommitOutcome> {
        let snapshot = self.snapshot().await?;
        let (path, mut schema) = self.owned_schema(&snapshot, owner).await?;
        schema.add_field(name, field)?;

        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): add field {name} to {owner}"),
        );
        builder.add(path, schema.to_string())?;

        self.finish(builder, snapshot).await
    }

    /// Remove custom field from schema of collection or singleton.
    ///
    /// Documents keep existing values of the removed field.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownCollection`] or [`StoreError::NotFound`]
    ///   if schema owner does not exist.
    /// - Return [`StoreError::Metadata`] if field is not defined.
    /// - Return [`StoreError::Remote`] if commit cannot be applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn remove_field(&self, owner: &SchemaOwner, name: &str) -> Result<CommitOutcome> {
        let snapshot = self.snapshot().await?;
        let (path, mut schema) = self.owned_schema(&snapshot, owner).await?;
        schema.remove_field(name)?;

        let mut builder = CommitBuilder::new(
            snapshot.head.clone(),
            format!("feat(content): remove field {name} from {owner}"),
        );
        builder.add(path, schema.to_string())?;

        self.finish(builder, snapshot).await
    }

    /// Regenerate metadata index from every document in the repository.
    ///
    /// Documents that fail to parse are skipped with a warning. Returns
    /// `None` without committing if the index is already up to date.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::IndicatifStyleTemplate`] if progress bar style
    ///   is malformed.
    /// - Return [`StoreError::Remote`] if repository cannot be read or commit
    ///   cannot be applied.
    #[instrument(skip(self, bar), level = "debug")]
    pub async fn rebuild_metadata(&self, bar: ProgressBar) -> Result<Option<CommitOutcome>> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message("read content directories");

        let mut snapshot = self.snapshot().await?;
        let mut sources = snapshot
            .collections
            .iter()
            .map(|entry| (entry.slug.clone(), entry.path.clone()))
            .collect::<Vec<_>>();
        sources.push((SINGLETONS_COLLECTION.to_string(), self.layout.singletons_dir()));

        let head = &snapshot.head;
        let listings =
            try_join_all(sources.iter().map(|(_, dir)| self.remote.read_dir(head, dir))).await?;

        let total = listings.iter().map(Vec::len).sum::<usize>();
        bar.set_length(total as u64);

        let mut entries = Vec::new();
        for ((collection, _), files) in sources.iter().zip(listings) {
            for file in files {
                bar.inc(1);
                let Some(format) = Format::from_path(&file.path) else {
                    continue;
                };
                bar.set_message(file.path.clone());

                let entry = Document::parse(&file.text, format)
                    .map_err(MetadataError::from)
                    .and_then(|document| {
                        MetadataEntry::from_document(
                            collection,
                            &file.path,
                            &document,
                            &file.text,
                            head,
                        )
                    });
                match entry {
                    Ok(mut entry) => {
                        // INVARIANT: Unchanged documents keep the commit they were indexed at.
                        if let Some(current) = snapshot.index.get(&entry.source.path) {
                            if current.source.hash == entry.source.hash {
                                entry.source.commit = current.source.commit.clone();
                            }
                        }
                        entries.push(entry);
                    }
                    Err(error) => warn!("skip {:?}: {error}", file.path),
                }
            }
        }
        bar.finish_and_clear();

        let rebuilt = MetadataIndex::from_entries(Utc::now(), entries);
        if rebuilt.entries() == snapshot.index.entries() {
            info!("metadata index is up to date");
            return Ok(None);
        }

        info!("rebuilt metadata index with {} entries", rebuilt.len());
        snapshot.index = rebuilt;
        let builder = CommitBuilder::new(snapshot.head.clone(), "chore(content): rebuild metadata");
        self.finish(builder, snapshot).await.map(Some)
    }

    /// List registered collections.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Remote`] if repository cannot be read.
    pub async fn list_collections(&self) -> Result<Vec<CollectionEntry>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.collections.iter().cloned().collect())
    }

    /// List registered singletons.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Remote`] if repository cannot be read.
    pub async fn list_singletons(&self) -> Result<Vec<SingletonEntry>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.singletons.iter().cloned().collect())
    }

    /// List metadata of every document in a collection.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownCollection`] if collection does not exist.
    /// - Return [`StoreError::Remote`] if repository cannot be read.
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<MetadataEntry>> {
        let snapshot = self.snapshot().await?;
        if collection != SINGLETONS_COLLECTION && snapshot.collections.get(collection).is_none() {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }

        Ok(snapshot.index.entries_in(collection).cloned().collect())
    }

    /// Read document by collection and slug.
    ///
    /// Singletons are found under the `_singletons` collection.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotFound`] if document is not indexed or its
    ///   file is missing.
    /// - Return [`StoreError::Document`] if document is malformed.
    pub async fn get_document(&self, collection: &str, slug: &str) -> Result<Document> {
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            slug: slug.to_string(),
        };

        let snapshot = self.snapshot().await?;
        let entry = snapshot.index.find(collection, slug).ok_or_else(not_found)?;
        let data = self
            .remote
            .read_file(&snapshot.head, &entry.source.path)
            .await?
            .ok_or_else(not_found)?;
        let format = Format::from_path(&entry.source.path).unwrap_or_default();

        Ok(Document::parse(&data, format)?)
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let head = self.remote.head_oid().await?;
        let collections_path = self.layout.collections_path();
        let singletons_path = self.layout.singletons_path();
        let metadata_path = self.layout.metadata_path();
        let (collections, singletons, index) = futures::try_join!(
            self.remote.read_file(&head, &collections_path),
            self.remote.read_file(&head, &singletons_path),
            self.remote.read_file(&head, &metadata_path),
        )?;

        let collections = collections
            .map(|data| data.parse::<Collections>())
            .transpose()?
            .unwrap_or_default();
        let singletons = singletons
            .map(|data| data.parse::<Singletons>())
            .transpose()?
            .unwrap_or_default();
        let index = index
            .map(|data| data.parse::<MetadataIndex>())
            .transpose()?
            .unwrap_or_else(|| MetadataIndex::new(Utc::now()));
        debug!("snapshot at {}", head.short());

        Ok(Snapshot {
            head,
            collections,
            singletons,
            index,
        })
    }

    async fn finish(
        &self,
        mut builder: CommitBuilder,
        mut snapshot: Snapshot,
    ) -> Result<CommitOutcome> {
        snapshot.index.stamp(&snapshot.head, Utc::now());
        builder.add(self.layout.metadata_path(), snapshot.index.to_string())?;
        let request = builder.build()?;

        Ok(submit(&self.remote, request).await?)
    }

    async fn exists(&self, at: &Oid, path: &str) -> Result<bool> {
        Ok(self.remote.read_file(at, path).await?.is_some())
    }

    async fn read_schema(&self, at: &Oid, path: &str) -> Result<Option<Schema>> {
        let data = self.remote.read_file(at, path).await?;
        Ok(data.map(|data| data.parse::<Schema>()).transpose()?)
    }

    async fn owned_schema(
        &self,
        snapshot: &Snapshot,
        owner: &SchemaOwner,
    ) -> Result<(String, Schema)> {
        let (path, default) = match owner {
            SchemaOwner::Collection(slug) => {
                let entry = snapshot
                    .collections
                    .get(slug)
                    .ok_or_else(|| StoreError::UnknownCollection(slug.clone()))?;
                (self.layout.schema_path(slug), Schema::new(&entry.title, &entry.path))
            }
            SchemaOwner::Singleton(slug) => {
                let entry = snapshot.singletons.get(slug).ok_or_else(|| StoreError::NotFound {
                    collection: SINGLETONS_COLLECTION.to_string(),
                    slug: slug.clone(),
                })?;
                (self.layout.singleton_schema_path(slug), Schema::new(&entry.title, &entry.path))
            }
        };

        let schema = self.read_schema(&snapshot.head, &path).await?.unwrap_or(default);
        Ok((path, schema))
    }
}

/// Settle slug and publication date of document about to be saved.
fn prepare(document: &mut Document) -> Result<String, DocumentError> {
    let slug = document.resolved_slug()?;
    document.front_matter.slug = slug.clone();

    if document.front_matter.status == Status::Published
        && document.front_matter.published_at.is_none()
    {
        document.front_matter.published_at = Some(Utc::now());
    }

    Ok(slug)
}

/// All possible error types for content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Collection is not registered.
    #[error("collection {0:?} does not exist")]
    UnknownCollection(String),

    /// Slug already belongs to another document.
    #[error("slug {slug:?} is already used in {collection:?}")]
    SlugTaken { collection: String, slug: String },

    /// Document does not exist.
    #[error("document {slug:?} does not exist in {collection:?}")]
    NotFound { collection: String, slug: String },

    /// Repository access fails.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Index or schema bookkeeping fails.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Document cannot be parsed or rendered.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Changeset is malformed.
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prepare_derives_slug_and_publication_date() -> anyhow::Result<()> {
        let mut document = Document::new("Hello World", "");
        assert_eq!(prepare(&mut document)?, "hello-world");
        assert_eq!(document.front_matter.slug, "hello-world");
        assert!(document.front_matter.published_at.is_none());

        document.front_matter.status = Status::Published;
        prepare(&mut document)?;
        assert!(document.front_matter.published_at.is_some());

        Ok(())
    }

    #[test]
    fn schema_owner_display() {
        assert_eq!(SchemaOwner::Collection("posts".into()).to_string(), "collection posts");
        assert_eq!(SchemaOwner::Singleton("about".into()).to_string(), "singleton about");
    }
}
