use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::diff::{diff, DiffLine, DiffTag};
use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{Commit, Object};
use crate::refs::{self, Head};
use crate::repo::Repo;
use crate::store;

use super::diff::{flatten_tree, read_blob_lines};

/// what a merge did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// the branch was a descendant of HEAD; the ref moved forward
    FastForward,
    /// divergent histories were overlaid with conflict markers
    Merged,
    /// HEAD does not name a commit to merge into
    DetachedHead,
    /// the named branch does not resolve to a commit
    UnknownBranch,
}

/// merge a branch into HEAD
///
/// fast-forwards when HEAD is an ancestor of the branch tip. otherwise
/// overlays the incoming tree file by file: new paths are materialized,
/// common paths get the edit script folded into conflict markers, and
/// MERGE_HEAD records the other side for the next commit.
pub fn merge(repo: &Repo, branch: &str) -> Result<MergeOutcome> {
    if !refs::is_head_branch(repo)? {
        return Ok(MergeOutcome::DetachedHead);
    }
    let Some((our_hash, ours)) = resolve_commit(repo, "HEAD")? else {
        return Ok(MergeOutcome::DetachedHead);
    };
    let Some((their_hash, theirs)) = resolve_commit(repo, branch)? else {
        return Ok(MergeOutcome::UnknownBranch);
    };

    // fast-forward: breadth-first over the ancestors of the incoming tip
    let mut queue = VecDeque::from([(their_hash, theirs.clone())]);
    let mut visited = HashSet::new();
    while let Some((hash, commit)) = queue.pop_front() {
        if !visited.insert(hash) {
            continue;
        }
        if hash == our_hash {
            log::debug!("fast-forward: {} is an ancestor of {}", our_hash, their_hash);
            let Head::Branch(current) = refs::head(repo)? else {
                return Ok(MergeOutcome::DetachedHead);
            };
            refs::update_ref(repo, &current, branch)?;
            store::reconstruct(repo, &theirs.tree, repo.work_dir())?;
            return Ok(MergeOutcome::FastForward);
        }
        for parent in &commit.parents {
            match store::retrieve(repo, parent) {
                Ok(Object::Commit(parent_commit)) => queue.push_back((*parent, parent_commit)),
                Ok(_) => {}
                Err(Error::ObjectNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }

    log::debug!("divergent merge of {} into {}", their_hash, our_hash);

    let mut our_blobs = BTreeMap::new();
    let mut their_blobs = BTreeMap::new();
    flatten_tree(repo, &ours.tree, "", &mut our_blobs)?;
    flatten_tree(repo, &theirs.tree, "", &mut their_blobs)?;

    for (path, their_blob) in &their_blobs {
        let target = repo.work_dir().join(path);
        match our_blobs.get(path) {
            None => {
                // new incoming file
                store::reconstruct(repo, their_blob, &target)?;
            }
            Some(our_blob) => {
                let our_lines = read_blob_lines(repo, our_blob)?;
                let their_lines = read_blob_lines(repo, their_blob)?;
                let script = diff(&our_lines, &their_lines);
                let merged = fold_conflicts(&script, branch);
                std::fs::write(&target, merged).with_path(&target)?;
            }
        }
    }

    refs::update_merge_head(repo, Some(&their_hash.to_hex()))?;

    Ok(MergeOutcome::Merged)
}

/// resolve a name through the refs and the store to a commit
fn resolve_commit(repo: &Repo, name: &str) -> Result<Option<(Hash, Commit)>> {
    let Some(hash) = refs::resolve(repo, name)? else {
        return Ok(None);
    };
    match store::retrieve(repo, &hash) {
        Ok(Object::Commit(commit)) => Ok(Some((hash, commit))),
        Ok(_) => Ok(None),
        Err(Error::ObjectNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// fold an edit script into a single file with conflict markers
///
/// a three-state marker cycles HEAD lines, the separator and incoming
/// lines; it advances until it matches each line's tag and is cycled back
/// to close any open region at the end.
fn fold_conflicts(script: &[DiffLine], branch: &str) -> String {
    let mut out = String::new();
    let mut marker: i32 = -1;

    fn advance(out: &mut String, marker: &mut i32, branch: &str) {
        match *marker {
            0 => out.push_str("<<<<<<<<< HEAD\n"),
            1 => out.push_str("========\n"),
            2 => {
                out.push_str(">>>>>>>>> ");
                out.push_str(branch);
                out.push('\n');
            }
            _ => {}
        }
        *marker = (*marker + 1) % 3;
    }

    for line in script {
        let want = match line.tag {
            DiffTag::Common => 0,
            DiffTag::Removed => 1,
            DiffTag::Added => 2,
        };
        while marker != want {
            advance(&mut out, &mut marker, branch);
        }
        out.push_str(&line.text);
        out.push('\n');
    }
    while marker != 0 {
        advance(&mut out, &mut marker, branch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffLine;
    use crate::index::Index;
    use crate::ops;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("work")).unwrap();
        (dir, repo)
    }

    fn stage_and_commit(repo: &Repo, name: &str, content: &str, message: &str) -> Hash {
        let path = repo.work_dir().join(name);
        fs::write(&path, content).unwrap();
        let mut index = Index::load(repo).unwrap();
        index.add(repo, &path).unwrap();
        index.save(repo).unwrap();
        ops::commit(repo, message, None).unwrap()
    }

    #[test]
    fn test_fast_forward_merge() {
        let (_dir, repo) = test_repo();

        stage_and_commit(&repo, "a.txt", "hello\n", "first");
        refs::update_ref(&repo, "feature", "HEAD").unwrap();

        ops::checkout(&repo, "feature").unwrap();
        let tip = stage_and_commit(&repo, "a.txt", "hi\n", "on feature");

        ops::checkout(&repo, "main").unwrap();
        let outcome = merge(&repo, "feature").unwrap();

        assert_eq!(outcome, MergeOutcome::FastForward);
        assert_eq!(refs::resolve(&repo, "main").unwrap(), Some(tip));
        assert_eq!(
            refs::resolve(&repo, "main").unwrap(),
            refs::resolve(&repo, "feature").unwrap()
        );
        let content = fs::read_to_string(repo.work_dir().join("a.txt")).unwrap();
        assert_eq!(content, "hi\n");
        // a fast-forward needs no merge commit
        assert_eq!(refs::merge_head(&repo).unwrap(), None);
    }

    #[test]
    fn test_divergent_merge_writes_conflict_markers() {
        let (_dir, repo) = test_repo();

        stage_and_commit(&repo, "a.txt", "hello\n", "first");
        refs::update_ref(&repo, "feature", "HEAD").unwrap();

        stage_and_commit(&repo, "a.txt", "hello\nmain\n", "m");

        ops::checkout(&repo, "feature").unwrap();
        let their_tip = stage_and_commit(&repo, "a.txt", "hello\nfeature\n", "f");

        ops::checkout(&repo, "main").unwrap();
        let outcome = merge(&repo, "feature").unwrap();

        assert_eq!(outcome, MergeOutcome::Merged);
        let content = fs::read_to_string(repo.work_dir().join("a.txt")).unwrap();
        assert_eq!(
            content,
            "hello\n<<<<<<<<< HEAD\nmain\n========\nfeature\n>>>>>>>>> feature\n"
        );
        assert_eq!(
            refs::merge_head(&repo).unwrap(),
            Some(their_tip.to_hex())
        );
    }

    #[test]
    fn test_divergent_merge_brings_new_files() {
        let (_dir, repo) = test_repo();

        stage_and_commit(&repo, "a.txt", "shared\n", "first");
        refs::update_ref(&repo, "feature", "HEAD").unwrap();

        stage_and_commit(&repo, "a.txt", "shared\nmain extra\n", "on main");

        ops::checkout(&repo, "feature").unwrap();
        stage_and_commit(&repo, "incoming.txt", "from feature\n", "on feature");

        ops::checkout(&repo, "main").unwrap();
        let outcome = merge(&repo, "feature").unwrap();

        assert_eq!(outcome, MergeOutcome::Merged);
        let incoming = fs::read_to_string(repo.work_dir().join("incoming.txt")).unwrap();
        assert_eq!(incoming, "from feature\n");
    }

    #[test]
    fn test_merge_then_commit_has_two_parents() {
        let (_dir, repo) = test_repo();

        stage_and_commit(&repo, "a.txt", "hello\n", "first");
        refs::update_ref(&repo, "feature", "HEAD").unwrap();

        let our_tip = stage_and_commit(&repo, "a.txt", "hello\nmain\n", "m");

        ops::checkout(&repo, "feature").unwrap();
        let their_tip = stage_and_commit(&repo, "a.txt", "hello\nfeature\n", "f");

        ops::checkout(&repo, "main").unwrap();
        merge(&repo, "feature").unwrap();

        let merge_commit = ops::commit(&repo, "merge feature", None).unwrap();
        let stored = match store::retrieve(&repo, &merge_commit).unwrap() {
            Object::Commit(c) => c,
            other => panic!("expected commit, got {}", other.kind()),
        };
        assert_eq!(stored.parents, vec![our_tip, their_tip]);
        assert!(stored.is_merge());
        assert_eq!(refs::merge_head(&repo).unwrap(), None);
    }

    #[test]
    fn test_merge_unknown_branch() {
        let (_dir, repo) = test_repo();

        stage_and_commit(&repo, "a.txt", "hello\n", "first");

        assert_eq!(
            merge(&repo, "nonexistent").unwrap(),
            MergeOutcome::UnknownBranch
        );
    }

    #[test]
    fn test_merge_detached_head() {
        let (_dir, repo) = test_repo();

        let first = stage_and_commit(&repo, "a.txt", "hello\n", "first");
        refs::update_ref(&repo, "feature", "HEAD").unwrap();
        refs::update_head(&repo, &first.to_hex()).unwrap();

        assert_eq!(merge(&repo, "feature").unwrap(), MergeOutcome::DetachedHead);
    }

    #[test]
    fn test_fold_conflicts_uncontested_change() {
        let script = vec![
            DiffLine {
                tag: DiffTag::Common,
                text: "keep".to_string(),
            },
            DiffLine {
                tag: DiffTag::Added,
                text: "incoming".to_string(),
            },
        ];
        let folded = fold_conflicts(&script, "feature");
        // the overlay marks even uncontested insertions
        assert_eq!(
            folded,
            "keep\n<<<<<<<<< HEAD\n========\nincoming\n>>>>>>>>> feature\n"
        );
    }

    #[test]
    fn test_fold_conflicts_all_common() {
        let script = vec![
            DiffLine {
                tag: DiffTag::Common,
                text: "one".to_string(),
            },
            DiffLine {
                tag: DiffTag::Common,
                text: "two".to_string(),
            },
        ];
        assert_eq!(fold_conflicts(&script, "feature"), "one\ntwo\n");
    }
}
