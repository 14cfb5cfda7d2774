// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RepoFixture;

use anyhow::Result;
use oxistatic::{
    commit::{submit, CommitBuilder},
    remote::{LocalRemote, Remote, RemoteError},
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn commit_applies_additions_and_deletions_atomically() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    fixture.stage_and_commit("old.md", "old\n")?;
    let remote = LocalRemote::open(dir.path().join("site.git"), "main")?;

    let head = remote.head_oid().await?;
    let mut builder = CommitBuilder::new(head.clone(), "feat: swap files");
    builder.add("posts/new.md", "new\n")?.delete("old.md")?;
    let outcome = submit(&remote, builder.build()?).await?;

    assert_eq!(outcome.oid.as_str(), fixture.head()?.to_string());
    assert_eq!(fixture.read("posts/new.md")?, Some("new\n".to_string()));
    assert!(!fixture.exists("old.md")?);
    assert_eq!(remote.read_file(&head, "old.md").await?, Some("old\n".to_string()));

    Ok(())
}

#[tokio::test]
async fn stale_head_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let remote = LocalRemote::open(dir.path().join("site.git"), "main")?;

    let head = remote.head_oid().await?;
    fixture.stage_and_commit("concurrent.md", "someone else\n")?;
    let moved = fixture.head()?;

    let mut builder = CommitBuilder::new(head.clone(), "feat: too late");
    builder.add("mine.md", "mine\n")?;
    let result = submit(&remote, builder.build()?).await;

    assert!(matches!(result, Err(RemoteError::StaleHead { expected }) if expected == head));
    assert_eq!(fixture.head()?, moved);
    assert!(!fixture.exists("mine.md")?);

    Ok(())
}

#[tokio::test]
async fn deleting_missing_file_writes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    let remote = LocalRemote::open(dir.path().join("site.git"), "main")?;
    let before = fixture.head()?;

    let mut builder = CommitBuilder::new(remote.head_oid().await?, "feat: partial");
    builder.add("kept.md", "kept\n")?.delete("ghost.md")?;
    let result = submit(&remote, builder.build()?).await;

    assert!(matches!(result, Err(RemoteError::MissingPath(path)) if path == "ghost.md"));
    assert_eq!(fixture.head()?, before);
    assert!(!fixture.exists("kept.md")?);

    Ok(())
}

#[tokio::test]
async fn read_dir_lists_direct_text_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path())?;
    fixture.stage_and_commit("posts/a.md", "a\n")?;
    fixture.stage_and_commit("posts/b.mdx", "b\n")?;
    fixture.stage_and_commit("posts/nested/c.md", "c\n")?;
    let remote = LocalRemote::open(dir.path().join("site.git"), "main")?;
    let head = remote.head_oid().await?;

    let mut paths = remote
        .read_dir(&head, "posts")
        .await?
        .into_iter()
        .map(|file| file.path)
        .collect::<Vec<_>>();
    paths.sort();

    assert_eq!(paths, vec!["posts/a.md".to_string(), "posts/b.mdx".to_string()]);
    assert!(remote.read_dir(&head, "missing").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_branch_is_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    RepoFixture::new(dir.path())?;
    let remote = LocalRemote::open(dir.path().join("site.git"), "drafts")?;

    assert!(matches!(
        remote.head_oid().await,
        Err(RemoteError::NoBranch(branch)) if branch == "drafts"
    ));

    Ok(())
}
