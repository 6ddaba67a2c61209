use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::index::Index;
use crate::object::{Blob, Object};
use crate::repo::{Repo, REPO_DIR};

/// how a worktree path relates to the index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// present in the worktree, not staged
    New,
    /// staged, but the worktree content differs
    Modified,
    /// staged, but gone from the worktree
    Deleted,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::New => "new file",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
        }
    }
}

/// compare the working tree against the index
///
/// an empty result means the working tree is clean. unchanged tracked
/// files are not reported.
pub fn status(repo: &Repo) -> Result<BTreeMap<String, FileStatus>> {
    let index = Index::load(repo)?;
    let worktree = worktree_files(repo)?;
    let mut out = BTreeMap::new();

    for (path, staged_hash) in index.entries() {
        if worktree.contains(path) {
            let file = repo.work_dir().join(path);
            let content = fs::read(&file).with_path(&file)?;
            let current_hash = Object::Blob(Blob::new(content)).digest();
            if current_hash != *staged_hash {
                out.insert(path.clone(), FileStatus::Modified);
            }
        } else {
            out.insert(path.clone(), FileStatus::Deleted);
        }
    }

    for path in worktree {
        if !index.entries().contains_key(&path) {
            out.insert(path, FileStatus::New);
        }
    }

    Ok(out)
}

/// enumerate regular files in the working tree, skipping `.jit`
fn worktree_files(repo: &Repo) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    let walker = WalkDir::new(repo.work_dir())
        .into_iter()
        .filter_entry(|e| e.file_name() != REPO_DIR);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| repo.work_dir().to_path_buf());
            Error::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(repo.work_dir()) {
            let components: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.insert(components.join("/"));
        }
    }
    Ok(files)
}
