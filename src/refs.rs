//! named pointers into the commit graph
//!
//! a branch is a file under `.jit/refs/` holding a commit digest (empty for
//! a branch with no commits). `HEAD` is either symbolic (`ref: <branch>`)
//! or a bare digest (detached). `MERGE_HEAD` records the other side of an
//! in-progress merge and is absent otherwise.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::repo::Repo;

const HEAD_PREFIX: &str = "ref: ";

/// where HEAD currently points
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// attached to a branch
    Branch(String),
    /// detached at a commit
    Detached(Hash),
}

impl Head {
    /// branch name when attached, digest hex when detached
    pub fn name(&self) -> String {
        match self {
            Head::Branch(branch) => branch.clone(),
            Head::Detached(hash) => hash.to_hex(),
        }
    }
}

/// set HEAD to a branch (attached) or a commit digest (detached)
///
/// the branch namespace wins: an existing branch name attaches HEAD even
/// if it also parses as a digest.
pub fn update_head(repo: &Repo, target: &str) -> Result<()> {
    if is_branch(repo, target) {
        return write_atomic(repo, &repo.head_path(), &format!("{}{}\n", HEAD_PREFIX, target));
    }
    let hash = Hash::from_hex(target).map_err(|_| Error::InvalidRef(target.to_string()))?;
    write_atomic(repo, &repo.head_path(), &format!("{}\n", hash.to_hex()))
}

/// read HEAD
pub fn head(repo: &Repo) -> Result<Head> {
    let head_path = repo.head_path();
    let content = fs::read_to_string(&head_path).with_path(&head_path)?;
    let content = content.trim();
    match content.strip_prefix(HEAD_PREFIX) {
        Some(branch) => Ok(Head::Branch(branch.trim().to_string())),
        None => Ok(Head::Detached(Hash::from_hex(content)?)),
    }
}

/// true iff HEAD is attached to a branch
pub fn is_head_branch(repo: &Repo) -> Result<bool> {
    Ok(matches!(head(repo)?, Head::Branch(_)))
}

/// check if a branch ref exists
pub fn is_branch(repo: &Repo, name: &str) -> bool {
    branch_path(repo, name).is_file()
}

/// resolve a name to a commit digest
///
/// `"HEAD"` resolves through the current branch (one hop at most); a branch
/// name reads its stored digest; a digest resolves to itself. `None` models
/// an unresolvable name or a branch with no commits.
pub fn resolve(repo: &Repo, name: &str) -> Result<Option<Hash>> {
    if name == "HEAD" {
        return match head(repo)? {
            Head::Branch(branch) => read_branch(repo, &branch),
            Head::Detached(hash) => Ok(Some(hash)),
        };
    }
    if is_branch(repo, name) {
        return read_branch(repo, name);
    }
    Ok(Hash::from_hex(name).ok())
}

/// point branch `name` at whatever `target` resolves to
///
/// the target may itself be symbolic (`"HEAD"`, another branch, a digest).
/// creates the branch if absent; a target that resolves to nothing creates
/// the branch with no commits.
pub fn update_ref(repo: &Repo, name: &str, target: &str) -> Result<()> {
    let resolved = resolve(repo, target)?;
    write_branch(repo, name, resolved.as_ref())
}

/// write a branch file directly
pub(crate) fn write_branch(repo: &Repo, name: &str, hash: Option<&Hash>) -> Result<()> {
    validate_ref_name(name)?;
    let path = branch_path(repo, name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    let content = match hash {
        Some(hash) => format!("{}\n", hash.to_hex()),
        None => String::new(),
    };
    write_atomic(repo, &path, &content)
}

/// enumerate branch names, sorted
pub fn list_refs(repo: &Repo) -> Result<Vec<String>> {
    let refs_dir = repo.refs_path();
    let mut refs = Vec::new();

    if refs_dir.exists() {
        collect_refs(&refs_dir, &refs_dir, &mut refs)?;
    }

    refs.sort();
    Ok(refs)
}

/// read MERGE_HEAD; `None` when no merge is pending
pub fn merge_head(repo: &Repo) -> Result<Option<String>> {
    let path = repo.merge_head_path();
    match fs::read_to_string(&path) {
        Ok(content) => {
            let target = content.trim();
            if target.is_empty() {
                Ok(None)
            } else {
                Ok(Some(target.to_string()))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Io { path, source }),
    }
}

/// set MERGE_HEAD, or clear it with `None`
pub fn update_merge_head(repo: &Repo, target: Option<&str>) -> Result<()> {
    let path = repo.merge_head_path();
    match target {
        Some(target) => write_atomic(repo, &path, &format!("{}\n", target)),
        None => match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Io { path, source }),
        },
    }
}

/// get filesystem path for a branch
fn branch_path(repo: &Repo, name: &str) -> PathBuf {
    repo.refs_path().join(name)
}

/// read a branch file; `None` when the branch has no commits yet
fn read_branch(repo: &Repo, name: &str) -> Result<Option<Hash>> {
    let path = branch_path(repo, name);

    let content = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::RefNotFound(name.to_string())
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let hex = content.trim();
    if hex.is_empty() {
        return Ok(None);
    }
    Ok(Some(Hash::from_hex(hex)?))
}

/// atomic write: temp -> fsync -> rename
fn write_atomic(repo: &Repo, path: &Path, content: &str) -> Result<()> {
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(content.as_bytes()).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, path).with_path(path)?;
    Ok(())
}

/// recursively collect refs from directory
fn collect_refs(base: &PathBuf, dir: &PathBuf, refs: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();

        if path.is_dir() {
            collect_refs(base, &path, refs)?;
        } else if path.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                refs.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(())
}

/// validate ref name
fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRef("empty ref name".to_string()));
    }

    if name == "HEAD" {
        return Err(Error::InvalidRef("reserved ref name: HEAD".to_string()));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot start or end with '/': {}",
            name
        )));
    }

    if name.contains("//") {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain '//': {}",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain null byte: {}",
            name
        )));
    }

    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRef(format!(
                "ref name cannot contain '.' or '..': {}",
                name
            )));
        }
    }

    Ok(())
}
