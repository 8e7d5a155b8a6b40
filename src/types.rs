use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Client-facing projection of one stored document
///
/// Recomputed on every list call; the repository is the source of truth and
/// nothing is cached locally. `id` is always the repository path, and `name`
/// is always its last segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDescriptor {
    pub id: String,
    pub path: String,
    pub name: String,
    pub url: String,
    /// Byte length as reported by the tree API; may be absent for entries
    /// the store has not sized yet
    pub size: Option<u64>,
    /// Blob digest used as the optimistic-concurrency token on writes
    #[serde(rename = "contentHash")]
    pub content_hash: String,
}

/// Result of a successful create-or-update write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: String,
    pub url: String,
    #[serde(rename = "contentHash")]
    pub content_hash: String,
}

/// One node from a recursive tree listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    /// Raw upstream node type: "blob" for files, "tree" for directories
    #[serde(rename = "type")]
    pub kind: String,
    pub size: Option<u64>,
    pub sha: String,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "blob"
    }
}

/// Upstream raw-content response, projected for proxying
///
/// `body` is a pull-based chunk stream bridging the upstream connection to
/// the downstream response; the document is never buffered whole. Dropping
/// the stream aborts the upstream transfer.
pub struct RawDocument {
    pub status: u16,
    /// Upstream response headers as received; the proxy copies an allow-list
    pub headers: Vec<(String, String)>,
    pub body: Option<BoxStream<'static, Result<Bytes>>>,
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

impl RawDocument {
    /// Look up an upstream header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serializes_camel_case_hash() {
        let fd = FileDescriptor {
            id: "pdfs/a.pdf".into(),
            path: "pdfs/a.pdf".into(),
            name: "a.pdf".into(),
            url: "https://raw.example/a.pdf".into(),
            size: Some(42),
            content_hash: "abc123".into(),
        };
        let v = serde_json::to_value(&fd).unwrap();
        assert_eq!(v["contentHash"], "abc123");
        assert!(v.get("content_hash").is_none());
    }

    #[test]
    fn test_tree_entry_kind() {
        let blob: TreeEntry = serde_json::from_value(serde_json::json!({
            "path": "pdfs/a.pdf", "type": "blob", "size": 10, "sha": "s"
        }))
        .unwrap();
        assert!(blob.is_file());

        let tree: TreeEntry = serde_json::from_value(serde_json::json!({
            "path": "pdfs", "type": "tree", "sha": "s"
        }))
        .unwrap();
        assert!(!tree.is_file());
        assert_eq!(tree.size, None);
    }

    #[test]
    fn test_raw_document_header_lookup() {
        let doc = RawDocument {
            status: 206,
            headers: vec![("Content-Range".into(), "bytes 0-99/1000".into())],
            body: None,
        };
        assert_eq!(doc.header("content-range"), Some("bytes 0-99/1000"));
        assert_eq!(doc.header("etag"), None);
    }
}
