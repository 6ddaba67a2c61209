/// file content stored in the object graph
///
/// a blob is opaque bytes; jit attaches no metadata to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    content: Vec<u8>,
}

impl Blob {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// raw content bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// consume and return the content
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// content split into lines for diffing
    ///
    /// non-UTF-8 bytes are replaced; diff and merge operate on text.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.content)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_lines() {
        let blob = Blob::new(&b"hello\nworld\n"[..]);
        assert_eq!(blob.lines(), vec!["hello", "world"]);
    }

    #[test]
    fn test_blob_lines_no_trailing_newline() {
        let blob = Blob::new(&b"hello\nworld"[..]);
        assert_eq!(blob.lines(), vec!["hello", "world"]);
    }

    #[test]
    fn test_blob_empty_lines() {
        let blob = Blob::new(Vec::new());
        assert!(blob.lines().is_empty());
    }
}
