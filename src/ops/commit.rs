use crate::error::Result;
use crate::hash::Hash;
use crate::index::Index;
use crate::object::{Commit, Object};
use crate::refs::{self, Head};
use crate::repo::Repo;
use crate::store;

/// record the staged tree as a new commit and advance the current branch
///
/// the first parent is whatever HEAD resolves to; a pending MERGE_HEAD
/// contributes the second parent and is cleared. a detached HEAD still
/// creates the commit, it just moves no branch.
pub fn commit(repo: &Repo, message: &str, author: Option<&str>) -> Result<Hash> {
    let index = Index::load(repo)?;

    let current = refs::resolve(repo, "HEAD")?;

    let tree = index.write_tree(repo)?;
    let tree_hash = store::store(repo, &Object::Tree(tree))?;

    let mut parents = Vec::new();
    if let Some(parent) = current {
        parents.push(parent);
    }
    if let Some(merge_target) = refs::merge_head(repo)? {
        if let Some(other) = refs::resolve(repo, &merge_target)? {
            parents.push(other);
        }
        refs::update_merge_head(repo, None)?;
    }

    let author = author.unwrap_or(&repo.config().author);
    let commit = Commit::new(tree_hash, parents, author, message);
    let commit_hash = store::store(repo, &Object::Commit(commit))?;

    if let Head::Branch(branch) = refs::head(repo)? {
        refs::update_ref(repo, &branch, &commit_hash.to_hex())?;
    }

    Ok(commit_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("work")).unwrap();
        (dir, repo)
    }

    fn stage_file(repo: &Repo, name: &str, content: &str) {
        let path = repo.work_dir().join(name);
        fs::write(&path, content).unwrap();
        let mut index = Index::load(repo).unwrap();
        index.add(repo, &path).unwrap();
        index.save(repo).unwrap();
    }

    #[test]
    fn test_first_commit_is_root() {
        let (_dir, repo) = test_repo();

        stage_file(&repo, "a.txt", "hello\n");
        let hash = commit(&repo, "first", None).unwrap();

        // the branch advanced to the new commit
        assert_eq!(refs::resolve(&repo, "main").unwrap(), Some(hash));

        let stored = match store::retrieve(&repo, &hash).unwrap() {
            Object::Commit(c) => c,
            other => panic!("expected commit, got {}", other.kind()),
        };
        assert!(stored.is_root());
        assert_eq!(stored.message, "first");
        assert_eq!(stored.author, "jit");
    }

    #[test]
    fn test_second_commit_has_first_as_parent() {
        let (_dir, repo) = test_repo();

        stage_file(&repo, "a.txt", "v1\n");
        let first = commit(&repo, "first", None).unwrap();

        stage_file(&repo, "a.txt", "v2\n");
        let second = commit(&repo, "second", None).unwrap();

        let stored = match store::retrieve(&repo, &second).unwrap() {
            Object::Commit(c) => c,
            other => panic!("expected commit, got {}", other.kind()),
        };
        assert_eq!(stored.parents, vec![first]);
        assert_eq!(refs::resolve(&repo, "main").unwrap(), Some(second));
    }

    #[test]
    fn test_commit_author_override() {
        let (_dir, repo) = test_repo();

        stage_file(&repo, "a.txt", "hello\n");
        let hash = commit(&repo, "first", Some("someone else")).unwrap();

        let stored = match store::retrieve(&repo, &hash).unwrap() {
            Object::Commit(c) => c,
            other => panic!("expected commit, got {}", other.kind()),
        };
        assert_eq!(stored.author, "someone else");
    }

    #[test]
    fn test_commit_consumes_merge_head() {
        let (_dir, repo) = test_repo();

        stage_file(&repo, "a.txt", "base\n");
        let first = commit(&repo, "first", None).unwrap();

        // pretend a divergent merge recorded the other side
        stage_file(&repo, "other.txt", "other\n");
        let other = commit(&repo, "other side", None).unwrap();
        refs::update_merge_head(&repo, Some(&first.to_hex())).unwrap();

        stage_file(&repo, "a.txt", "merged\n");
        let merged = commit(&repo, "merge", None).unwrap();

        let stored = match store::retrieve(&repo, &merged).unwrap() {
            Object::Commit(c) => c,
            other => panic!("expected commit, got {}", other.kind()),
        };
        assert_eq!(stored.parents, vec![other, first]);
        assert!(stored.is_merge());
        // MERGE_HEAD is cleared by the commit
        assert_eq!(refs::merge_head(&repo).unwrap(), None);
    }

    #[test]
    fn test_commit_detached_head_moves_no_branch() {
        let (_dir, repo) = test_repo();

        stage_file(&repo, "a.txt", "v1\n");
        let first = commit(&repo, "first", None).unwrap();

        refs::update_head(&repo, &first.to_hex()).unwrap();

        stage_file(&repo, "a.txt", "v2\n");
        let second = commit(&repo, "detached", None).unwrap();

        // main still points at the first commit
        assert_eq!(refs::resolve(&repo, "main").unwrap(), Some(first));
        assert_ne!(first, second);
    }
}
