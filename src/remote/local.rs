// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local repository remote through libgit2.
//!
//! Mirrors the semantics of GitHub's `createCommitOnBranch` against a
//! repository on disk: a commit is built directly from the parent tree
//! without touching any index or working tree, and it is only written if
//! the branch still points at the expected head.

use crate::{
    commit::{builder::CommitRequest, oid::Oid},
    remote::{CommitOutcome, Remote, RemoteError, RemoteFile, RepositoryRef, Result},
};

use async_trait::async_trait;
use git2::{
    build::TreeUpdateBuilder, ErrorCode, FileMode, ObjectType, Repository, RepositoryInitOptions,
    Signature, Tree,
};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info, instrument};

/// Content repository on local disk.
pub struct LocalRemote {
    repository: Mutex<Repository>,
    reference: RepositoryRef,
}

impl LocalRemote {
    /// Open existing repository.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Git2`] if repository cannot be opened.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>, branch: &str) -> Result<Self> {
        debug!("open local content repository: {:?}", path.as_ref().display());
        let repository = Repository::open(path.as_ref())?;
        Ok(Self::from_repository(repository, path.as_ref(), branch.to_string()))
    }

    /// Initialize new bare repository with an empty root commit on target
    /// branch.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Git2`] if libgit2 operations fail.
    #[instrument(skip(path), level = "debug")]
    pub fn init(path: impl AsRef<Path>, branch: &str) -> Result<Self> {
        let branch = branch.to_string();
        info!("initialize local content repository: {:?}", path.as_ref().display());

        let mut opts = RepositoryInitOptions::new();
        opts.bare(true);
        opts.initial_head(&branch);
        let repository = Repository::init_opts(path.as_ref(), &opts)?;

        {
            let signature = signature(&repository)?;
            let tree_oid = repository.treebuilder(None)?.write()?;
            let tree = repository.find_tree(tree_oid)?;
            repository.commit(
                Some(&format!("refs/heads/{branch}")),
                &signature,
                &signature,
                "chore: initialize content repository",
                &tree,
                &[],
            )?;
        }

        Ok(Self::from_repository(repository, path.as_ref(), branch))
    }

    fn from_repository(repository: Repository, path: &Path, branch: String) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().trim_end_matches(".git").to_string())
            .unwrap_or_else(|| "content".into());

        Self {
            repository: Mutex::new(repository),
            reference: RepositoryRef {
                owner: "local".into(),
                name,
                branch,
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Repository> {
        // INVARIANT: A poisoned lock still guards a consistent repository,
        // because libgit2 writes the branch ref last.
        self.repository
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refname(&self) -> String {
        format!("refs/heads/{}", self.reference.branch)
    }

    fn head(&self, repository: &Repository) -> Result<git2::Oid> {
        match repository.find_reference(&self.refname()) {
            Ok(reference) => reference
                .target()
                .ok_or_else(|| RemoteError::NoBranch(self.reference.branch.clone())),
            Err(error) if error.code() == ErrorCode::NotFound => {
                Err(RemoteError::NoBranch(self.reference.branch.clone()))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait]
impl Remote for LocalRemote {
    fn repository(&self) -> &RepositoryRef {
        &self.reference
    }

    async fn head_oid(&self) -> Result<Oid> {
        let repository = self.lock();
        Ok(self.head(&repository)?.into())
    }

    async fn read_file(&self, at: &Oid, path: &str) -> Result<Option<String>> {
        let repository = self.lock();
        let tree = tree_at(&repository, at)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }

        let blob = repository.find_blob(entry.id())?;
        let text = std::str::from_utf8(blob.content())
            .map_err(|_| RemoteError::NotText(path.to_string()))?;

        Ok(Some(text.to_string()))
    }

    async fn read_dir(&self, at: &Oid, dir: &str) -> Result<Vec<RemoteFile>> {
        let repository = self.lock();
        let root = tree_at(&repository, at)?;
        let dir = dir.trim_matches('/');
        let tree = if dir.is_empty() {
            root
        } else {
            match root.get_path(Path::new(dir)) {
                Ok(entry) if entry.kind() == Some(ObjectType::Tree) => {
                    repository.find_tree(entry.id())?
                }
                Ok(_) => return Ok(Vec::new()),
                Err(error) if error.code() == ErrorCode::NotFound => return Ok(Vec::new()),
                Err(error) => return Err(error.into()),
            }
        };

        let mut files = Vec::new();
        for entry in tree.iter() {
            if entry.kind() != Some(ObjectType::Blob) {
                continue;
            }

            let Some(name) = entry.name() else {
                continue;
            };

            let blob = repository.find_blob(entry.id())?;
            if let Ok(text) = std::str::from_utf8(blob.content()) {
                let path = if dir.is_empty() {
                    name.to_string()
                } else {
                    format!("{dir}/{name}")
                };
                files.push(RemoteFile {
                    path,
                    text: text.to_string(),
                });
            }
        }

        Ok(files)
    }

    #[instrument(skip(self, request), level = "debug")]
    async fn create_commit(&self, request: &CommitRequest) -> Result<CommitOutcome> {
        let repository = self.lock();

        // INVARIANT: Never build on top of anything but the expected head.
        let head = self.head(&repository)?;
        if Oid::from(head) != request.expected_head {
            return Err(RemoteError::StaleHead {
                expected: request.expected_head.clone(),
            });
        }

        let parent = repository.find_commit(head)?;
        let baseline = parent.tree()?;
        let mut builder = TreeUpdateBuilder::new();
        for (path, contents) in request.changes.additions() {
            let blob = repository.blob(contents)?;
            builder.upsert(path, blob, FileMode::Blob);
        }

        for path in request.changes.deletions() {
            match baseline.get_path(Path::new(path)) {
                Ok(_) => {
                    builder.remove(path);
                }
                Err(error) if error.code() == ErrorCode::NotFound => {
                    return Err(RemoteError::MissingPath(path.to_string()));
                }
                Err(error) => return Err(error.into()),
            }
        }

        let tree_oid = builder.create_updated(&repository, &baseline)?;
        let tree = repository.find_tree(tree_oid)?;
        let signature = signature(&repository)?;
        let oid = repository.commit(
            Some(&self.refname()),
            &signature,
            &signature,
            &request.message.to_git_message(),
            &tree,
            &[&parent],
        )?;
        debug!("wrote commit {oid} on {}", self.refname());

        Ok(CommitOutcome {
            oid: oid.into(),
            url: None,
        })
    }
}

fn tree_at<'repo>(repository: &'repo Repository, at: &Oid) -> Result<Tree<'repo>> {
    let oid = git2::Oid::from_str(at.as_str())?;
    Ok(repository.find_commit(oid)?.tree()?)
}

fn signature(repository: &Repository) -> Result<Signature<'static>> {
    // INVARIANT: Always provide valid name and email.
    //   - Git will complain if this is not set in CI/CD environments.
    match repository.signature() {
        Ok(signature) => Ok(signature.to_owned()),
        Err(_) => Ok(Signature::now("oxistatic", "oxistatic@localhost")?),
    }
}
