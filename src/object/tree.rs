use crate::error::{Error, Result};
use crate::hash::Hash;

/// kind of object a tree entry points at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(EntryKind::Blob),
            "tree" => Ok(EntryKind::Tree),
            other => Err(Error::InvalidObjectType(other.to_string())),
        }
    }
}

/// a single entry in a tree: one named blob or sub-tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub name: String,
    pub hash: Hash,
}

impl TreeEntry {
    pub fn new(kind: EntryKind, name: impl Into<String>, hash: Hash) -> Self {
        Self {
            kind,
            name: name.into(),
            hash,
        }
    }
}

/// one directory level: a sequence of named entries
///
/// entries keep insertion order; the order is part of the serialized form
/// and therefore of the digest. a tree never references a commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// create a tree from entries, validating names and uniqueness
    pub fn from_entries(entries: Vec<TreeEntry>) -> Result<Self> {
        let mut tree = Self::new();
        for entry in entries {
            tree.push(entry)?;
        }
        Ok(tree)
    }

    /// append an entry, validating its name and rejecting duplicates
    pub fn push(&mut self, entry: TreeEntry) -> Result<()> {
        validate_entry_name(&entry.name)?;
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(Error::DuplicateEntryName(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// get entries slice
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// look up entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// validate an entry name: one path component, no separators
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains('/') {
        return Err(Error::InvalidEntryName(format!(
            "name contains '/': {}",
            name
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidEntryName(format!("reserved name: {}", name)));
    }
    Ok(())
}
