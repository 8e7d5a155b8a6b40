use crate::error::{ApiError, Result};

/// Server configuration, environment-derived
///
/// Built once at startup and passed by `Arc` into every component; business
/// logic never reads the environment directly. Owner/repo may legitimately
/// be absent at boot, so repo-touching endpoints re-check per request and
/// fail closed with `BadConfig` instead of falling back to a demo repo.
#[derive(Clone, Debug)]
pub struct Config {
    /// Repository owner (user or organization)
    pub owner: Option<String>,
    /// Repository name
    pub repo: Option<String>,
    /// Branch ref documents live on
    pub branch: String,
    /// Directory prefix uploads land under (may be empty for repo root)
    pub base_path: String,
    /// Write credential; absent means read-only mode
    pub token: Option<String>,
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Transport-layer cap on upload request bodies
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            branch: "main".to_string(),
            base_path: "pdfs".to_string(),
            token: None,
            host: "0.0.0.0".to_string(),
            port: 8787,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// "owner/repo" slug for display, if identity is configured
    pub fn repo_slug(&self) -> Option<String> {
        match (&self.owner, &self.repo) {
            (Some(o), Some(r)) => Some(format!("{}/{}", o, r)),
            _ => None,
        }
    }

    /// Repository identity, or `BadConfig` when either half is missing
    pub fn identity(&self) -> Result<(&str, &str)> {
        match (self.owner.as_deref(), self.repo.as_deref()) {
            (Some(o), Some(r)) if !o.is_empty() && !r.is_empty() => Ok((o, r)),
            _ => Err(ApiError::BadConfig {
                message: "Missing owner/repo".to_string(),
            }),
        }
    }

    /// Whether a write credential is configured
    pub fn writable(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
