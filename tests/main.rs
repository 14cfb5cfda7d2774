// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use git2::{IndexEntry, IndexTime, Repository};
use oxistatic::{metadata::ContentLayout, remote::LocalRemote, ContentStore};
use std::path::{Path, PathBuf};

/// Bare content repository with a second, independent handle on it.
///
/// The store writes through its own [`LocalRemote`], while the fixture
/// commits behind its back to simulate a concurrent editor.
pub(crate) struct RepoFixture {
    path: PathBuf,
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().join("site.git");
        LocalRemote::init(&path, "main")?;
        let repo = Repository::open_bare(&path)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { path, repo })
    }

    pub(crate) fn store(&self) -> Result<ContentStore<LocalRemote>> {
        let remote = LocalRemote::open(&self.path, "main")?;
        Ok(ContentStore::new(remote, ContentLayout::default()))
    }

    pub(crate) fn head(&self) -> Result<git2::Oid> {
        Ok(self.repo.refname_to_id("refs/heads/main")?)
    }

    /// Read file at branch head.
    pub(crate) fn read(&self, path: impl AsRef<Path>) -> Result<Option<String>> {
        let tree = self.repo.find_commit(self.head()?)?.tree()?;
        let entry = match tree.get_path(path.as_ref()) {
            Ok(entry) => entry,
            Err(error) if error.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let blob = self.repo.find_blob(entry.id())?;

        Ok(Some(String::from_utf8(blob.content().to_vec())?))
    }

    pub(crate) fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.read(path)?.is_some())
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename.as_ref().as_os_str().to_string_lossy().into_owned().as_bytes().to_vec(),
        };

        // INVARIANT: Always stage on top of current branch tree.
        let parent = self.repo.find_commit(self.head()?)?;
        let mut index = git2::Index::new()?;
        index.read_tree(&parent.tree()?)?;
        index.add(&entry)?;
        let tree_oid = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_oid)?;

        let signature = self.repo.signature()?;
        self.repo.commit(
            Some("refs/heads/main"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &[&parent],
        )?;

        Ok(())
    }
}
