use crate::hash::Hash;

/// a commit: a snapshot of the tree plus history metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// root tree hash
    pub tree: Hash,
    /// parent commit hashes (empty for root, 1 for linear, 2 for merge)
    pub parents: Vec<Hash>,
    /// author identity
    pub author: String,
    /// commit message
    pub message: String,
}

impl Commit {
    pub fn new(
        tree: Hash,
        parents: Vec<Hash>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parents,
            author: author.into(),
            message: message.into(),
        }
    }

    /// is this an initial commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// is this a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
