//! the staging area: a flat mapping of worktree paths to blob digests
//!
//! the index bridges the working directory and the object graph. paths are
//! worktree-relative with forward-slash separators; platform paths appear
//! only at filesystem boundaries.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{Blob, EntryKind, Object, Tree, TreeEntry};
use crate::repo::{Repo, REPO_DIR};
use crate::store;

/// staged path -> blob digest mapping, persisted to `.jit/index`
#[derive(Debug, Default)]
pub struct Index {
    entries: BTreeMap<String, Hash>,
}

impl Index {
    /// load the index, empty if the file does not exist yet
    pub fn load(repo: &Repo) -> Result<Self> {
        let path = repo.index_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(Error::Io { path, source }),
        };

        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let (entry_path, hex) = line
                .split_once('\t')
                .ok_or_else(|| Error::MalformedIndex(line.to_string()))?;
            entries.insert(entry_path.to_string(), Hash::from_hex(hex)?);
        }

        Ok(Self { entries })
    }

    /// persist the mapping, one `path TAB digest` line per entry
    pub fn save(&self, repo: &Repo) -> Result<()> {
        let mut content = String::new();
        for (path, hash) in &self.entries {
            content.push_str(&format!("{}\t{}\n", path, hash));
        }
        let path = repo.index_path();
        fs::write(&path, content).with_path(&path)?;
        Ok(())
    }

    /// stage a file or a directory tree
    ///
    /// directories are walked recursively, skipping the repository
    /// directory itself. existing entries for the same path are replaced.
    pub fn add(&mut self, repo: &Repo, path: &Path) -> Result<()> {
        let meta = fs::metadata(path).with_path(path)?;
        if meta.is_dir() {
            let walker = WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| e.file_name() != REPO_DIR);
            for entry in walker {
                let entry = entry.map_err(|e| {
                    let entry_path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| path.to_path_buf());
                    Error::Io {
                        path: entry_path,
                        source: e.into(),
                    }
                })?;
                if entry.file_type().is_file() {
                    self.add_file(repo, entry.path())?;
                }
            }
            return Ok(());
        }
        self.add_file(repo, path)
    }

    fn add_file(&mut self, repo: &Repo, path: &Path) -> Result<()> {
        let rel = worktree_relative(repo, path)?;
        let content = fs::read(path).with_path(path)?;
        let hash = store::store(repo, &Object::Blob(Blob::new(content)))?;
        self.entries.insert(rel, hash);
        Ok(())
    }

    /// materialize the flat mapping into a hierarchy of tree objects
    ///
    /// sub-trees are written to the object store; the root tree is
    /// returned for the caller to store.
    pub fn write_tree(&self, repo: &Repo) -> Result<Tree> {
        let entries: Vec<(String, Hash)> = self
            .entries
            .iter()
            .map(|(path, hash)| (path.clone(), *hash))
            .collect();
        build_tree(repo, &entries)
    }

    /// replace the index contents with the flattened paths of a tree
    pub fn read_tree(&mut self, repo: &Repo, tree_hash: &Hash) -> Result<()> {
        self.entries.clear();
        self.collect_tree(repo, tree_hash, "")
    }

    fn collect_tree(&mut self, repo: &Repo, tree_hash: &Hash, prefix: &str) -> Result<()> {
        let tree = match store::retrieve(repo, tree_hash)? {
            Object::Tree(tree) => tree,
            other => return Err(Error::InvalidObjectType(other.kind().to_string())),
        };
        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            match entry.kind {
                EntryKind::Blob => {
                    self.entries.insert(path, entry.hash);
                }
                EntryKind::Tree => self.collect_tree(repo, &entry.hash, &path)?,
            }
        }
        Ok(())
    }

    /// staged entries, sorted by path
    pub fn entries(&self) -> &BTreeMap<String, Hash> {
        &self.entries
    }
}

/// build one tree level from sorted `(path, hash)` pairs
///
/// entries sharing a first path component are contiguous in sorted order,
/// so each sub-tree is a single run of the slice.
fn build_tree(repo: &Repo, entries: &[(String, Hash)]) -> Result<Tree> {
    let mut tree = Tree::new();
    let mut i = 0;
    while i < entries.len() {
        let (path, hash) = &entries[i];
        match path.split_once('/') {
            None => {
                tree.push(TreeEntry::new(EntryKind::Blob, path.clone(), *hash))?;
                i += 1;
            }
            Some((first, _)) => {
                let mut sub = Vec::new();
                while i < entries.len() {
                    match entries[i].0.split_once('/') {
                        Some((component, rest)) if component == first => {
                            sub.push((rest.to_string(), entries[i].1));
                            i += 1;
                        }
                        _ => break,
                    }
                }
                let subtree = build_tree(repo, &sub)?;
                let sub_hash = store::store(repo, &Object::Tree(subtree))?;
                tree.push(TreeEntry::new(EntryKind::Tree, first, sub_hash))?;
            }
        }
    }
    Ok(tree)
}

/// normalize a path to its worktree-relative forward-slash form
fn worktree_relative(repo: &Repo, path: &Path) -> Result<String> {
    let canon = path.canonicalize().with_path(path)?;
    let rel = canon
        .strip_prefix(repo.work_dir())
        .map_err(|_| Error::OutsideWorkTree(path.to_path_buf()))?;
    let components: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(components.join("/"))
}
