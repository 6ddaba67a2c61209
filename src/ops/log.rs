use crate::error::Result;
use crate::hash::Hash;
use crate::refs;
use crate::repo::Repo;
use crate::store;

/// commit history reachable from HEAD as `(digest, message)` pairs
///
/// `None` when the current branch has no commits yet.
pub fn log(repo: &Repo) -> Result<Option<Vec<(Hash, String)>>> {
    match refs::resolve(repo, "HEAD")? {
        None => Ok(None),
        Some(head) => Ok(Some(store::retrieve_log(repo, &head)?)),
    }
}
