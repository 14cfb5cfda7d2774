// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RepoFixture;

use anyhow::Result;
use indicatif::ProgressBar;
use indoc::indoc;
use oxistatic::{
    document::{Document, Format, Status},
    metadata::{
        Collections, CustomField, FieldType, MetadataError, MetadataIndex, Schema, Singletons,
    },
    remote::{Remote, RemoteError},
    ContentStore, SchemaOwner, StoreError,
};
use pretty_assertions::assert_eq;

fn post(title: &str, body: &str) -> Document {
    Document::new(title, body)
}

fn index(fixture: &RepoFixture) -> Result<MetadataIndex> {
    let data = fixture.read("outstatic/content/metadata.json")?.unwrap_or_default();
    Ok(data.parse()?)
}

async fn store_with_posts(
    fixture: &RepoFixture,
) -> Result<ContentStore<oxistatic::remote::LocalRemote>> {
    let store = fixture.store()?;
    store.create_collection("Posts", None).await?;
    Ok(store)
}

#[tokio::test]
async fn create_collection_writes_schema_and_registry() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;

    let collections: Collections = fixture
        .read("outstatic/content/collections.json")?
        .unwrap_or_default()
        .parse()?;
    assert_eq!(collections.get("posts").map(|c| c.path.as_str()), Some("outstatic/content/posts"));

    let schema: Schema = fixture
        .read("outstatic/content/posts/schema.json")?
        .unwrap_or_default()
        .parse()?;
    assert_eq!(schema, Schema::new("Posts", "outstatic/content/posts"));
    assert!(index(&fixture)?.is_empty());

    let result = store.create_collection("posts", None).await;
    assert!(matches!(result, Err(StoreError::Metadata(MetadataError::DuplicateCollection(_)))));

    Ok(())
}

#[tokio::test]
async fn save_document_indexes_in_same_commit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;

    let mut document = post("Hello World", "Hi there.\n");
    document.front_matter.status = Status::Published;
    let outcome = store.save_document("posts", document, None).await?;

    assert_eq!(outcome.oid.as_str(), fixture.head()?.to_string());
    let stored = fixture.read("outstatic/content/posts/hello-world.md")?.unwrap_or_default();
    let stored = Document::parse(&stored, Format::Markdown)?;
    assert_eq!(stored.front_matter.slug, "hello-world");
    assert!(stored.front_matter.published_at.is_some());

    let index = index(&fixture)?;
    let entry = index.find("posts", "hello-world").cloned().unwrap();
    assert_eq!(entry.source.path, "outstatic/content/posts/hello-world.md");
    assert_eq!(entry.status, Status::Published);

    let blob = git2::Oid::hash_object(
        git2::ObjectType::Blob,
        fixture.read(&entry.source.path)?.unwrap_or_default().as_bytes(),
    )?;
    assert_eq!(entry.source.hash.as_str(), blob.to_string());

    let listed = store.list_documents("posts").await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(store.get_document("posts", "hello-world").await?.body, "Hi there.\n");

    Ok(())
}

#[tokio::test]
async fn rename_document_removes_old_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    store.save_document("posts", post("First", "one\n"), None).await?;

    let mut document = store.get_document("posts", "first").await?;
    document.front_matter.slug = "renamed".into();
    store.save_document("posts", document, Some("first")).await?;

    assert!(!fixture.exists("outstatic/content/posts/first.md")?);
    assert!(fixture.exists("outstatic/content/posts/renamed.md")?);

    let index = index(&fixture)?;
    assert!(index.find("posts", "first").is_none());
    assert!(index.find("posts", "renamed").is_some());
    assert_eq!(index.len(), 1);

    Ok(())
}

#[tokio::test]
async fn update_keeps_mdx_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;

    let mut document = post("Fancy", "<Chart />\n");
    document.format = Format::Mdx;
    store.save_document("posts", document, None).await?;

    let mut document = store.get_document("posts", "fancy").await?;
    document.format = Format::Markdown;
    document.body = "<Chart data={1} />\n".into();
    store.save_document("posts", document, Some("fancy")).await?;

    assert!(fixture.exists("outstatic/content/posts/fancy.mdx")?);
    assert!(!fixture.exists("outstatic/content/posts/fancy.md")?);

    Ok(())
}

#[tokio::test]
async fn duplicate_slug_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    store.save_document("posts", post("Same", "a\n"), None).await?;
    let before = fixture.head()?;

    let result = store.save_document("posts", post("Same", "b\n"), None).await;
    assert!(matches!(result, Err(StoreError::SlugTaken { slug, .. }) if slug == "same"));

    store.save_document("posts", post("Other", "c\n"), None).await?;
    let mut other = store.get_document("posts", "other").await?;
    other.front_matter.slug = "same".into();
    let result = store.save_document("posts", other, Some("other")).await;
    assert!(matches!(result, Err(StoreError::SlugTaken { .. })));

    assert_ne!(fixture.head()?, before);
    assert_eq!(
        fixture.read("outstatic/content/posts/same.md")?.map(|d| d.contains("a\n")),
        Some(true)
    );

    Ok(())
}

#[tokio::test]
async fn concurrent_edit_leaves_tree_untouched() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    let before_index = fixture.read("outstatic/content/metadata.json")?;

    let head = store.remote().head_oid().await?;
    fixture.stage_and_commit("README.md", "someone else was faster\n")?;
    let moved = fixture.head()?;
    assert_ne!(head.as_str(), moved.to_string());

    // The store snapshots again for every operation, so it only loses a
    // race that happens between snapshot and submit. Emulate one by
    // submitting a request built against the old head.
    let mut builder = oxistatic::commit::CommitBuilder::new(head, "feat(content): stale");
    builder.add("outstatic/content/posts/late.md", "late\n")?;
    let result = oxistatic::commit::submit(store.remote(), builder.build()?).await;

    assert!(matches!(result, Err(RemoteError::StaleHead { .. })));
    assert_eq!(fixture.head()?, moved);
    assert!(!fixture.exists("outstatic/content/posts/late.md")?);
    assert_eq!(fixture.read("outstatic/content/metadata.json")?, before_index);

    // Retrying from a fresh snapshot succeeds.
    store.save_document("posts", post("Late", "late\n"), None).await?;
    assert!(fixture.exists("README.md")?);
    assert!(index(&fixture)?.find("posts", "late").is_some());

    Ok(())
}

#[tokio::test]
async fn delete_document_and_collection() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    store.save_document("posts", post("A", "a\n"), None).await?;
    store.save_document("posts", post("B", "b\n"), None).await?;

    store.delete_document("posts", "a").await?;
    assert!(!fixture.exists("outstatic/content/posts/a.md")?);
    assert!(index(&fixture)?.find("posts", "a").is_none());

    let result = store.delete_document("posts", "a").await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));

    store.delete_collection("posts", true).await?;
    assert!(!fixture.exists("outstatic/content/posts/b.md")?);
    assert!(!fixture.exists("outstatic/content/posts/schema.json")?);
    assert!(index(&fixture)?.is_empty());
    assert!(store.list_collections().await?.is_empty());

    let result = store.delete_collection("posts", false).await;
    assert!(matches!(result, Err(StoreError::UnknownCollection(_))));

    Ok(())
}

#[tokio::test]
async fn schema_validation_blocks_commit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    let owner = SchemaOwner::Collection("posts".into());
    store
        .add_field(&owner, "rating", CustomField::new("Rating", FieldType::Number).required(true))
        .await?;
    let before = fixture.head()?;

    let result = store.save_document("posts", post("Unrated", "x\n"), None).await;
    assert!(matches!(result, Err(StoreError::Metadata(MetadataError::MissingField(_)))));
    assert_eq!(fixture.head()?, before);

    let mut document = post("Rated", "x\n");
    document.front_matter.fields.insert("rating".into(), serde_yaml::Value::from(4));
    store.save_document("posts", document, None).await?;
    let entry = index(&fixture)?.find("posts", "rated").cloned().unwrap();
    assert_eq!(entry.fields.get("rating"), Some(&serde_json::json!(4)));

    let result = store.add_field(&owner, "slug", CustomField::new("Slug", FieldType::String)).await;
    assert!(matches!(result, Err(StoreError::Metadata(MetadataError::ReservedField(_)))));

    store.remove_field(&owner, "rating").await?;
    store.save_document("posts", post("Unrated", "x\n"), None).await?;

    Ok(())
}

#[tokio::test]
async fn singletons_keep_registry_and_index_in_sync() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = fixture.store()?;

    store.save_singleton(post("About", "me\n"), None).await?;
    store
        .add_field(
            &SchemaOwner::Singleton("about".into()),
            "tagline",
            CustomField::new("Tagline", FieldType::String),
        )
        .await?;

    let mut about = store.get_document("_singletons", "about").await?;
    about.front_matter.slug = "about-us".into();
    store.save_singleton(about, Some("about")).await?;

    assert!(fixture.exists("outstatic/content/_singletons/about-us.md")?);
    assert!(fixture.exists("outstatic/content/_singletons/about-us.schema.json")?);
    assert!(!fixture.exists("outstatic/content/_singletons/about.md")?);
    assert!(!fixture.exists("outstatic/content/_singletons/about.schema.json")?);

    let singletons: Singletons = fixture
        .read("outstatic/content/singletons.json")?
        .unwrap_or_default()
        .parse()?;
    assert!(singletons.get("about").is_none());
    assert_eq!(singletons.get("about-us").map(|s| s.title.as_str()), Some("About"));

    store.delete_singleton("about-us").await?;
    assert!(!fixture.exists("outstatic/content/_singletons/about-us.md")?);
    assert!(index(&fixture)?.is_empty());
    assert!(store.list_singletons().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn rebuild_metadata_recovers_drifted_index() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    store.save_document("posts", post("Indexed", "i\n"), None).await?;

    assert!(store.rebuild_metadata(ProgressBar::hidden()).await?.is_none());

    fixture.stage_and_commit(
        "outstatic/content/posts/manual.md",
        indoc! {"
            ---
            title: Manual
            status: published
            slug: manual
            ---

            Added outside the CMS.
        "},
    )?;
    fixture.stage_and_commit("outstatic/content/posts/broken.md", "no front matter\n")?;

    let outcome = store.rebuild_metadata(ProgressBar::hidden()).await?;
    assert!(outcome.is_some());

    let index = index(&fixture)?;
    assert_eq!(index.len(), 2);
    assert_eq!(index.find("posts", "manual").map(|e| e.status), Some(Status::Published));
    assert!(index.find("posts", "indexed").is_some());

    Ok(())
}

#[tokio::test]
async fn front_matter_cannot_shadow_index_fields() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;

    let document = Document::parse(
        indoc! {"
            ---
            title: Imported
            collection: blog
            ---
            Moved over from the old blog.
        "},
        Format::Markdown,
    )?;
    store.save_document("posts", document, None).await?;

    let stored = fixture.read("outstatic/content/metadata.json")?.unwrap_or_default();
    assert_eq!(stored.matches("\"collection\"").count(), 1);

    let listed = store.list_documents("posts").await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].collection, "posts");

    store.save_document("posts", post("Second", "two\n"), None).await?;
    assert_eq!(store.list_documents("posts").await?.len(), 2);
    assert!(store.rebuild_metadata(ProgressBar::hidden()).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn damaged_index_stays_writable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let store = store_with_posts(&fixture).await?;
    store.save_document("posts", post("Kept", "kept\n"), None).await?;

    let damaged = fixture
        .read("outstatic/content/metadata.json")?
        .unwrap_or_default()
        .replacen("\"__outstatic\"", "\"collection\": \"blog\",\n      \"__outstatic\"", 1);
    fixture.stage_and_commit("outstatic/content/metadata.json", damaged)?;

    let listed = store.list_documents("posts").await?;
    assert_eq!(listed.iter().map(|e| e.slug.as_str()).collect::<Vec<_>>(), vec!["kept"]);

    store.save_document("posts", post("Added", "added\n"), None).await?;
    let stored = fixture.read("outstatic/content/metadata.json")?.unwrap_or_default();
    assert_eq!(stored.matches("\"collection\"").count(), 2);
    assert_eq!(index(&fixture)?.entries_in("posts").count(), 2);
    assert!(store.rebuild_metadata(ProgressBar::hidden()).await?.is_none());

    Ok(())
}
