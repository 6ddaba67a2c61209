use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::diff::diff;
use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::index::Index;
use crate::object::{EntryKind, Object};
use crate::refs;
use crate::repo::Repo;
use crate::store;

/// diff the staged tree against the HEAD commit's tree
///
/// one section per file in the HEAD tree: a `---<path>---` header followed
/// by the edit script, or `No Difference Found` for unchanged or unstaged
/// paths.
pub fn diff_index_head(repo: &Repo) -> Result<Vec<String>> {
    let index = Index::load(repo)?;
    let tree = index.write_tree(repo)?;
    let tree_hash = store::store(repo, &Object::Tree(tree))?;

    let mut staged = BTreeMap::new();
    flatten_tree(repo, &tree_hash, "", &mut staged)?;

    let mut out = Vec::new();
    let Some(current) = refs::resolve(repo, "HEAD")? else {
        return Ok(out);
    };
    let Object::Commit(commit) = store::retrieve(repo, &current)? else {
        return Ok(out);
    };

    let mut head = BTreeMap::new();
    flatten_tree(repo, &commit.tree, "", &mut head)?;

    for (path, head_hash) in &head {
        out.push(format!("---{}---", path));
        match staged.get(path) {
            Some(staged_hash) if staged_hash != head_hash => {
                let a = read_blob_lines(repo, head_hash)?;
                let b = read_blob_lines(repo, staged_hash)?;
                out.extend(diff(&a, &b).iter().map(ToString::to_string));
            }
            _ => out.push("No Difference Found".to_string()),
        }
    }

    Ok(out)
}

/// diff a commit against the HEAD commit's tree
///
/// `None` means the argument named no stored commit.
pub fn diff_commit_head(repo: &Repo, target: &str) -> Result<Option<Vec<String>>> {
    let mut head = BTreeMap::new();
    if let Some(current) = refs::resolve(repo, "HEAD")? {
        if let Object::Commit(commit) = store::retrieve(repo, &current)? {
            flatten_tree(repo, &commit.tree, "", &mut head)?;
        }
    }

    let Ok(hash) = Hash::from_hex(target) else {
        return Ok(None);
    };
    let commit = match store::retrieve(repo, &hash) {
        Ok(Object::Commit(commit)) => commit,
        Ok(_) => return Ok(Some(Vec::new())),
        Err(Error::ObjectNotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut other = BTreeMap::new();
    flatten_tree(repo, &commit.tree, "", &mut other)?;

    let mut out = Vec::new();
    for (path, other_hash) in &other {
        out.push(format!("---{}---", path));
        match head.get(path) {
            Some(head_hash) if head_hash != other_hash => {
                let a = read_blob_lines(repo, other_hash)?;
                let b = read_blob_lines(repo, head_hash)?;
                out.extend(diff(&a, &b).iter().map(ToString::to_string));
            }
            _ => out.push("No Difference Found".to_string()),
        }
    }

    Ok(Some(out))
}

/// diff two files on the filesystem
pub fn diff_files(path1: &Path, path2: &Path) -> Result<Vec<String>> {
    let a = read_file_lines(path1)?;
    let b = read_file_lines(path2)?;
    Ok(diff(&a, &b).iter().map(ToString::to_string).collect())
}

/// flatten a tree into full-path -> blob digest pairs by recursive descent
pub(crate) fn flatten_tree(
    repo: &Repo,
    tree_hash: &Hash,
    prefix: &str,
    out: &mut BTreeMap<String, Hash>,
) -> Result<()> {
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
                out.insert(path, entry.hash);
            }
            EntryKind::Tree => flatten_tree(repo, &entry.hash, &path, out)?,
        }
    }
    Ok(())
}

/// retrieve a blob and split it into lines
pub(crate) fn read_blob_lines(repo: &Repo, hash: &Hash) -> Result<Vec<String>> {
    match store::retrieve(repo, hash)? {
        Object::Blob(blob) => Ok(blob.lines()),
        other => Err(Error::InvalidObjectType(other.kind().to_string())),
    }
}

fn read_file_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_path(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("work")).unwrap();
        (dir, repo)
    }

    fn stage(repo: &Repo, name: &str, content: &str) {
        let path = repo.work_dir().join(name);
        fs::write(&path, content).unwrap();
        let mut index = Index::load(repo).unwrap();
        index.add(repo, &path).unwrap();
        index.save(repo).unwrap();
    }

    #[test]
    fn test_diff_index_head_shows_staged_change() {
        let (_dir, repo) = test_repo();

        stage(&repo, "a.txt", "hello\n");
        ops::commit(&repo, "first", None).unwrap();

        stage(&repo, "a.txt", "hello\nworld\n");

        let out = diff_index_head(&repo).unwrap();
        assert_eq!(out, vec!["---a.txt---", " hello", "+world"]);
    }

    #[test]
    fn test_diff_index_head_unchanged() {
        let (_dir, repo) = test_repo();

        stage(&repo, "a.txt", "hello\n");
        ops::commit(&repo, "first", None).unwrap();

        let out = diff_index_head(&repo).unwrap();
        assert_eq!(out, vec!["---a.txt---", "No Difference Found"]);
    }

    #[test]
    fn test_diff_index_head_without_commits() {
        let (_dir, repo) = test_repo();

        stage(&repo, "a.txt", "hello\n");

        assert!(diff_index_head(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_diff_commit_head() {
        let (_dir, repo) = test_repo();

        stage(&repo, "a.txt", "hello\n");
        let first = ops::commit(&repo, "first", None).unwrap();

        stage(&repo, "a.txt", "hello\nworld\n");
        ops::commit(&repo, "second", None).unwrap();

        let out = diff_commit_head(&repo, &first.to_hex()).unwrap().unwrap();
        assert_eq!(out, vec!["---a.txt---", " hello", "+world"]);
    }

    #[test]
    fn test_diff_commit_head_unknown_digest() {
        let (_dir, repo) = test_repo();

        stage(&repo, "a.txt", "hello\n");
        ops::commit(&repo, "first", None).unwrap();

        let missing = crate::hash::compute_hash(b"missing");
        assert_eq!(diff_commit_head(&repo, &missing.to_hex()).unwrap(), None);
        assert_eq!(diff_commit_head(&repo, "not-a-digest").unwrap(), None);
    }

    #[test]
    fn test_diff_files() {
        let dir = tempdir().unwrap();
        let p1 = dir.path().join("one.txt");
        let p2 = dir.path().join("two.txt");
        fs::write(&p1, "shared\nonly in one\n").unwrap();
        fs::write(&p2, "shared\nonly in two\n").unwrap();

        let out = diff_files(&p1, &p2).unwrap();
        assert_eq!(out, vec![" shared", "-only in one", "+only in two"]);
    }

    #[test]
    fn test_diff_files_missing_file() {
        let dir = tempdir().unwrap();
        let p1 = dir.path().join("exists.txt");
        fs::write(&p1, "content\n").unwrap();

        let result = diff_files(&p1, &dir.path().join("missing.txt"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_flatten_tree_nested_paths() {
        let (_dir, repo) = test_repo();

        fs::create_dir_all(repo.work_dir().join("src")).unwrap();
        stage(&repo, "top.txt", "top\n");
        stage(&repo, "src/lib.txt", "lib\n");

        let index = Index::load(&repo).unwrap();
        let tree = index.write_tree(&repo).unwrap();
        let tree_hash = store::store(&repo, &Object::Tree(tree)).unwrap();

        let mut flat = BTreeMap::new();
        flatten_tree(&repo, &tree_hash, "", &mut flat).unwrap();

        let paths: Vec<_> = flat.keys().cloned().collect();
        assert_eq!(paths, vec!["src/lib.txt", "top.txt"]);
    }
}
