//! jit - content-addressed version control
//!
//! tracks snapshots of a working directory as an immutable object graph
//! with git-like semantics: blobs, trees and commits keyed by SHA-256,
//! a staging index, branches, Myers line diffs and naive merging.
//!
//! # Core concepts
//!
//! - **Blob**: file content, stored once per distinct byte sequence
//! - **Tree**: one directory level referencing blobs and sub-trees
//! - **Commit**: a tree snapshot plus parents, author and message
//! - **Ref**: a named pointer to a commit (branches, HEAD, MERGE_HEAD)
//! - **Index**: the staged path -> blob mapping between worktree and graph
//!
//! # Example usage
//!
//! ```no_run
//! use std::path::Path;
//! use jit::{ops, Index, Repo};
//!
//! // initialize a repository and stage a file
//! let repo = Repo::init(Path::new("/path/to/project")).unwrap();
//! let mut index = Index::load(&repo).unwrap();
//! index.add(&repo, &repo.work_dir().join("notes.txt")).unwrap();
//! index.save(&repo).unwrap();
//!
//! // commit the staged tree
//! let hash = ops::commit(&repo, "initial commit", None).unwrap();
//! println!("committed {}", hash);
//! ```

mod config;
mod error;
mod hash;
mod repo;

pub mod diff;
pub mod index;
pub mod object;
pub mod ops;
pub mod refs;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::{compute_hash, Hash};
pub use index::Index;
pub use object::{Blob, Commit, EntryKind, Object, Tree, TreeEntry};
pub use refs::Head;
pub use repo::{Repo, RepoLock, DEFAULT_BRANCH, REPO_DIR};
