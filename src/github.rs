use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ApiError, Result},
    types::{RawDocument, TreeEntry, WriteOutcome},
};

const API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Gateway to the remote document store
///
/// Implementors wrap one repository on one branch. Read operations work
/// without a credential against public repositories; writes require one.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Recursively list every entry under the configured branch
    async fn list_tree(&self) -> Result<Vec<TreeEntry>>;

    /// Probe whether a path exists, returning its content hash if so
    ///
    /// Absence is a normal outcome (`Ok(None)`), not a failure: it is what
    /// decides create-vs-update semantics downstream.
    async fn existing_hash(&self, path: &str) -> Result<Option<String>>;

    /// Create (`precondition: None`) or update (`Some(hash)`) a file
    ///
    /// Returns `ApiError::Conflict` when the store rejects a stale hash.
    async fn write_content(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        precondition: Option<&str>,
    ) -> Result<WriteOutcome>;

    /// Fetch raw bytes for a path, forwarding a Range header verbatim
    async fn fetch_raw(&self, path: &str, range: Option<&str>) -> Result<RawDocument>;

    /// Deterministic raw-content URL for a path (used in descriptors)
    fn raw_url(&self, path: &str) -> String;
}

/// GitHub-backed remote store
///
/// Uses the Git Trees API for recursive listings, the Contents API for
/// existence probes and base64 create/update writes, and
/// raw.githubusercontent.com for byte fetches.
#[derive(Clone)]
pub struct GitHubStore {
    client: Client,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
    api_base: String,
    raw_base: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct ContentProbe {
    sha: String,
}

#[derive(Serialize)]
struct WriteBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct WriteResponse {
    content: Option<WrittenContent>,
}

#[derive(Deserialize)]
struct WrittenContent {
    path: String,
    sha: String,
}

/// Percent-encode each `/`-delimited segment independently, preserving the
/// separators themselves. Filenames may contain spaces and other reserved
/// characters.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl GitHubStore {
    /// Create a store for one repository/branch
    pub fn new(owner: String, repo: String, branch: String, token: Option<String>) -> Self {
        Self::with_endpoints(
            owner,
            repo,
            branch,
            token,
            API_BASE.to_string(),
            RAW_BASE.to_string(),
        )
    }

    /// Create a store pointed at custom API/raw endpoints (tests)
    pub fn with_endpoints(
        owner: String,
        repo: String,
        branch: String,
        token: Option<String>,
        api_base: String,
        raw_base: String,
    ) -> Self {
        let client = Client::builder()
            .user_agent(concat!("pdfshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            owner,
            repo,
            branch,
            token,
            api_base,
            raw_base,
        }
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base,
            self.owner,
            self.repo,
            urlencoding::encode(&self.branch)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            encode_path(path)
        )
    }

    /// Attach the Accept header GitHub's REST API expects, plus the
    /// credential when configured (reads work without one)
    fn api_request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/vnd.github.v3+json");
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn upstream_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::Upstream { status, body }
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn list_tree(&self) -> Result<Vec<TreeEntry>> {
        let response = self
            .api_request(self.client.get(self.tree_url()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }

        let data: TreeResponse = response.json().await?;
        if data.truncated {
            warn!(
                owner = %self.owner,
                repo = %self.repo,
                "tree listing truncated by upstream; some documents may be missing"
            );
        }
        Ok(data.tree)
    }

    async fn existing_hash(&self, path: &str) -> Result<Option<String>> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(path),
            urlencoding::encode(&self.branch)
        );
        let response = self.api_request(self.client.get(url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let probe: ContentProbe = response.json().await?;
                Ok(Some(probe.sha))
            }
            _ => Err(Self::upstream_error(response).await),
        }
    }

    async fn write_content(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        precondition: Option<&str>,
    ) -> Result<WriteOutcome> {
        let body = WriteBody {
            message,
            content: general_purpose::STANDARD.encode(bytes),
            branch: &self.branch,
            sha: precondition,
        };

        let response = self
            .api_request(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Err(ApiError::Conflict {
                path: path.to_string(),
            }),
            status if status.is_success() => {
                let data: WriteResponse = response.json().await?;
                let written = data.content.ok_or_else(|| {
                    ApiError::Internal("write response missing content".to_string())
                })?;
                Ok(WriteOutcome {
                    url: self.raw_url(&written.path),
                    path: written.path,
                    content_hash: written.sha,
                })
            }
            _ => Err(Self::upstream_error(response).await),
        }
    }

    async fn fetch_raw(&self, path: &str, range: Option<&str>) -> Result<RawDocument> {
        let mut request = self
            .client
            .get(self.raw_url(path))
            .header("Accept", "application/octet-stream");
        if let Some(range) = range {
            request = request.header("Range", range);
        }
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        // 204/304 carry no body by definition; everything else streams
        let body = if status == 204 || status == 304 {
            None
        } else {
            Some(
                response
                    .bytes_stream()
                    .map_err(ApiError::from)
                    .boxed(),
            )
        };

        Ok(RawDocument {
            status,
            headers,
            body,
        })
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base,
            self.owner,
            self.repo,
            urlencoding::encode(&self.branch),
            encode_path(path)
        )
    }
}
