use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::{
    config::Config,
    error::{ApiError, Result},
    github::RemoteStore,
    types::{FileDescriptor, RawDocument, WriteOutcome},
};

/// Extension filter applied to tree entries, case-insensitively
const DOC_EXTENSION: &str = ".pdf";

/// Fallback name for uploads that arrive without one
const DEFAULT_NAME: &str = "document.pdf";

/// Document library over one remote store
///
/// Stateless service layer: listing walks the repository tree on every call,
/// uploads round-trip an existence probe plus one contents write, and
/// fetches validate the path before touching upstream. Nothing is cached;
/// the repository is the sole source of truth.
pub struct Library {
    store: Arc<dyn RemoteStore>,
    config: Arc<Config>,
}

/// Last `/`-delimited segment of a repository path
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Collapse every whitespace run (including leading/trailing) to a single
/// underscore. This is the only sanitization applied to upload names.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

fn is_document(path: &str) -> bool {
    path.to_lowercase().ends_with(DOC_EXTENSION)
}

impl Library {
    pub fn new(store: Arc<dyn RemoteStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Enumerate all documents on the configured branch
    ///
    /// Keeps file entries matching the extension filter and projects them
    /// into descriptors, preserving the order the tree API returned.
    pub async fn list(&self) -> Result<Vec<FileDescriptor>> {
        let entries = self.store.list_tree().await?;
        let files = entries
            .into_iter()
            .filter(|entry| entry.is_file() && is_document(&entry.path))
            .map(|entry| FileDescriptor {
                id: entry.path.clone(),
                name: file_name(&entry.path).to_string(),
                url: self.store.raw_url(&entry.path),
                size: entry.size,
                content_hash: entry.sha,
                path: entry.path,
            })
            .collect();
        Ok(files)
    }

    /// Commit an uploaded payload, creating or updating the target path
    ///
    /// Create-vs-update is decided by an existence probe; a prior hash is
    /// passed as the write precondition so a racing writer loses with
    /// `Conflict` instead of silently overwriting. No retry on failure.
    pub async fn upload(&self, payload: Bytes, suggested_name: &str) -> Result<WriteOutcome> {
        if !self.config.writable() {
            return Err(ApiError::NotConfigured {
                message: "Missing GH_TOKEN on server".to_string(),
            });
        }
        if payload.is_empty() {
            return Err(ApiError::NoFile);
        }

        let name = if suggested_name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            sanitize_name(suggested_name)
        };
        let target = self.target_path(&name);

        let prior = self.store.existing_hash(&target).await?;
        let message = match prior {
            Some(_) => format!("Update {}", name),
            None => format!("Upload {}", name),
        };

        info!(path = %target, update = prior.is_some(), bytes = payload.len(), "committing upload");
        self.store
            .write_content(&target, &payload, &message, prior.as_deref())
            .await
    }

    /// Fetch raw document bytes, forwarding a Range header verbatim
    ///
    /// The traversal check runs on the raw, pre-encoding path string and
    /// rejects before any upstream call.
    pub async fn fetch_document(&self, path: &str, range: Option<&str>) -> Result<RawDocument> {
        if path.is_empty() {
            return Err(ApiError::BadRequest {
                message: "Missing path query parameter".to_string(),
            });
        }
        if path.contains("..") {
            return Err(ApiError::BadPath {
                path: path.to_string(),
            });
        }
        self.store.fetch_raw(path, range).await
    }

    fn target_path(&self, name: &str) -> String {
        let base = self.config.base_path.trim_end_matches('/');
        if base.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", base, name)
        }
    }
}
