use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::index::Index;
use crate::object::Object;
use crate::refs;
use crate::repo::Repo;
use crate::store;

/// switch the working tree to a branch or a commit digest
///
/// resolves against the branch namespace first, then treats the target as
/// a digest. reconstructs the commit's tree over the working tree (files
/// absent from the tree are left behind), resets the index to the tree and
/// moves HEAD. returns `false` when the target names no commit.
pub fn checkout(repo: &Repo, target: &str) -> Result<bool> {
    let hash = if refs::is_branch(repo, target) {
        refs::resolve(repo, target)?
    } else {
        Hash::from_hex(target).ok()
    };
    let Some(hash) = hash else {
        return Ok(false);
    };

    let commit = match store::retrieve(repo, &hash) {
        Ok(Object::Commit(commit)) => commit,
        Ok(_) => return Ok(false),
        Err(Error::ObjectNotFound(_)) => return Ok(false),
        Err(e) => return Err(e),
    };

    store::reconstruct(repo, &commit.tree, repo.work_dir())?;

    let mut index = Index::load(repo)?;
    index.read_tree(repo, &commit.tree)?;
    refs::update_head(repo, target)?;
    index.save(repo)?;

    Ok(true)
}
