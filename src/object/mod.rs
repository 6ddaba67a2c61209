//! the three object kinds and their canonical serialized form
//!
//! every object is framed as `"<kind> <len>\0<body>"`; the digest is
//! computed over the full framed bytes, so identity is structural.

pub mod blob;
pub mod commit;
pub mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tree::{EntryKind, Tree, TreeEntry};

use crate::error::{Error, Result};
use crate::hash::{compute_hash, Hash};

/// a stored object: blob, tree or commit
///
/// the kind is recovered from the serialized header on retrieval and
/// matched at the call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Blob(_) => "blob",
            Object::Tree(_) => "tree",
            Object::Commit(_) => "commit",
        }
    }

    /// canonical serialized form: `"<kind> <len>\0<body>"`
    pub fn serialize(&self) -> Vec<u8> {
        let body = match self {
            Object::Blob(blob) => blob.content().to_vec(),
            Object::Tree(tree) => tree_body(tree).into_bytes(),
            Object::Commit(commit) => commit_body(commit).into_bytes(),
        };
        let mut out = format!("{} {}\0", self.kind(), body.len()).into_bytes();
        out.extend_from_slice(&body);
        out
    }

    /// digest of the serialized form
    pub fn digest(&self) -> Hash {
        compute_hash(&self.serialize())
    }

    /// parse a serialized object, dispatching on the header keyword
    pub fn parse(bytes: &[u8]) -> Result<Object> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::MalformedObject("missing header terminator".to_string()))?;
        let header = std::str::from_utf8(&bytes[..nul])
            .map_err(|_| Error::MalformedObject("header is not UTF-8".to_string()))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| Error::MalformedObject(format!("bad header: {}", header)))?;
        let len: usize = len
            .parse()
            .map_err(|_| Error::MalformedObject(format!("bad length: {}", len)))?;

        let body = &bytes[nul + 1..];
        if body.len() != len {
            return Err(Error::MalformedObject(format!(
                "length mismatch: header says {}, body is {}",
                len,
                body.len()
            )));
        }

        match kind {
            "blob" => Ok(Object::Blob(Blob::new(body))),
            "tree" => Ok(Object::Tree(parse_tree(body)?)),
            "commit" => Ok(Object::Commit(parse_commit(body)?)),
            other => Err(Error::InvalidObjectType(other.to_string())),
        }
    }
}

/// tree body: one `<kind> <name> <hash>` line per entry, in stored order
fn tree_body(tree: &Tree) -> String {
    let mut body = String::new();
    for entry in tree.entries() {
        body.push_str(&format!(
            "{} {} {}\n",
            entry.kind.as_str(),
            entry.name,
            entry.hash
        ));
    }
    body
}

fn parse_tree(body: &[u8]) -> Result<Tree> {
    let body = std::str::from_utf8(body)
        .map_err(|_| Error::MalformedObject("tree body is not UTF-8".to_string()))?;
    let mut tree = Tree::new();
    for line in body.lines() {
        let (kind, rest) = line
            .split_once(' ')
            .ok_or_else(|| Error::MalformedObject(format!("bad tree entry: {}", line)))?;
        // the name may contain spaces; the hash never does
        let (name, hash) = rest
            .rsplit_once(' ')
            .ok_or_else(|| Error::MalformedObject(format!("bad tree entry: {}", line)))?;
        tree.push(TreeEntry::new(
            EntryKind::parse(kind)?,
            name,
            Hash::from_hex(hash)?,
        ))?;
    }
    Ok(tree)
}

/// commit body: `tree`, `parent`* and `author` headers, a blank line,
/// then the message verbatim
fn commit_body(commit: &Commit) -> String {
    let mut body = String::new();
    body.push_str(&format!("tree {}\n", commit.tree));
    for parent in &commit.parents {
        body.push_str(&format!("parent {}\n", parent));
    }
    body.push_str(&format!("author {}\n", commit.author));
    body.push('\n');
    body.push_str(&commit.message);
    body
}

fn parse_commit(body: &[u8]) -> Result<Commit> {
    let body = std::str::from_utf8(body)
        .map_err(|_| Error::MalformedObject("commit body is not UTF-8".to_string()))?;
    let (header, message) = body
        .split_once("\n\n")
        .ok_or_else(|| Error::MalformedObject("commit missing blank line".to_string()))?;

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    for line in header.lines() {
        if let Some(rest) = line.strip_prefix("tree ") {
            tree = Some(Hash::from_hex(rest)?);
        } else if let Some(rest) = line.strip_prefix("parent ") {
            parents.push(Hash::from_hex(rest)?);
        } else if let Some(rest) = line.strip_prefix("author ") {
            author = Some(rest.to_string());
        } else {
            return Err(Error::MalformedObject(format!(
                "unknown commit header: {}",
                line
            )));
        }
    }

    let tree = tree.ok_or_else(|| Error::MalformedObject("commit missing tree".to_string()))?;
    let author =
        author.ok_or_else(|| Error::MalformedObject("commit missing author".to_string()))?;

    Ok(Commit::new(tree, parents, author, message))
}
