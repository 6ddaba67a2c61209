//! content-addressed object persistence under `.jit/objects/`
//!
//! objects are stored one file per digest, fanned out as
//! `objects/<2 hex>/<62 hex>`. writes are idempotent: an object that is
//! already present is left untouched.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{compute_hash, Hash};
use crate::object::Object;
use crate::repo::Repo;

/// serialize an object and write it under its digest
///
/// returns the digest. storing an object that already exists is a no-op.
pub fn store(repo: &Repo, object: &Object) -> Result<Hash> {
    let bytes = object.serialize();
    let hash = compute_hash(&bytes);

    let (dir, file) = hash.to_path_components();
    let object_dir = repo.objects_path().join(&dir);
    let object_path = object_dir.join(&file);

    // dedup: identical content is already on disk under the same name
    if object_path.exists() {
        return Ok(hash);
    }

    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    // atomic write: temp -> fsync -> rename
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&bytes).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &object_path).with_path(&object_path)?;

    log::debug!("stored {} {}", object.kind(), hash);
    Ok(hash)
}

/// read and parse an object by digest
///
/// the digest is verified against the stored bytes before parsing.
pub fn retrieve(repo: &Repo, hash: &Hash) -> Result<Object> {
    let path = object_path(repo, hash);

    let bytes = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hash)
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    if compute_hash(&bytes) != *hash {
        return Err(Error::CorruptObject(*hash));
    }

    Object::parse(&bytes)
}

/// filesystem path of an object
pub fn object_path(repo: &Repo, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check whether an object exists
pub fn object_exists(repo: &Repo, hash: &Hash) -> bool {
    object_path(repo, hash).exists()
}

/// materialize an object onto the filesystem at `target`
///
/// a blob becomes a file, a tree becomes a directory with its entries
/// materialized recursively. existing files at conflicting paths are
/// overwritten; files not named by the tree are left in place.
pub fn reconstruct(repo: &Repo, hash: &Hash, target: &Path) -> Result<()> {
    match retrieve(repo, hash)? {
        Object::Blob(blob) => {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).with_path(parent)?;
            }
            fs::write(target, blob.content()).with_path(target)?;
        }
        Object::Tree(tree) => {
            fs::create_dir_all(target).with_path(target)?;
            for entry in tree.entries() {
                reconstruct(repo, &entry.hash, &target.join(&entry.name))?;
            }
        }
        Object::Commit(_) => {
            return Err(Error::InvalidObjectType("commit".to_string()));
        }
    }
    Ok(())
}

/// walk the commit graph from `start`, collecting `(digest, message)` pairs
///
/// depth-first from the first parent; a visited set keeps merge ancestry
/// from being reported twice and guarantees termination.
pub fn retrieve_log(repo: &Repo, start: &Hash) -> Result<Vec<(Hash, String)>> {
    let mut out = Vec::new();
    let mut to_visit = vec![*start];
    let mut visited = HashSet::new();

    while let Some(hash) = to_visit.pop() {
        if !visited.insert(hash) {
            continue;
        }

        let commit = match retrieve(repo, &hash)? {
            Object::Commit(c) => c,
            other => return Err(Error::InvalidObjectType(other.kind().to_string())),
        };

        // push in reverse so the first parent is visited first
        for parent in commit.parents.iter().rev() {
            to_visit.push(*parent);
        }

        out.push((hash, commit.message));
    }

    Ok(out)
}
