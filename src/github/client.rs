use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode, Url};
use tracing::{debug, warn};

use super::types::{CommitEntry, ContentEntry, Contents, ContentsResponse};
use crate::config::GitHubConfig;
use crate::error::{FetchError, FetchResult};
use crate::revision::{RevisionMeta, RevisionSource};

const GITHUB_JSON: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("portal-diff/", env!("CARGO_PKG_VERSION"));

/// Revision source backed by the GitHub REST API. Repositories are looked up
/// under a single configured owner.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    owner: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let api_base =
            Url::parse(&config.api_base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            http,
            api_base,
            owner: config.owner.clone(),
            token: config.token.clone(),
        })
    }

    /// `{api_base}/repos/{owner}/{repo}/{section}/{path...}` with every path
    /// segment percent-encoded on its own.
    fn endpoint(&self, repo: &str, section: &str, path: &str) -> FetchResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl(self.api_base.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), repo, section])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    async fn send(&self, url: Url) -> FetchResult<Response> {
        debug!(%url, "GitHub request");
        let mut request = self.http.get(url).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// Directory listing or file content at the default branch.
    pub async fn contents(&self, repo: &str, path: &str) -> FetchResult<Contents> {
        let url = self.endpoint(repo, "contents", path)?;
        let response = ensure_success(self.send(url).await?)?;
        let body: ContentsResponse = response.json().await?;
        contents_from_response(body)
    }
}

#[async_trait]
impl RevisionSource for GitHubClient {
    async fn list_recent_revisions(
        &self,
        repo: &str,
        path: &str,
        limit: usize,
    ) -> FetchResult<Vec<RevisionMeta>> {
        let mut url = self.endpoint(repo, "commits", "")?;
        url.query_pairs_mut()
            .append_pair("path", path)
            .append_pair("per_page", &limit.to_string());

        let response = ensure_success(self.send(url).await?)?;
        let commits: Vec<CommitEntry> = response.json().await?;
        debug!(repo, path, count = commits.len(), "listed commits");

        Ok(commits.into_iter().take(limit).map(RevisionMeta::from).collect())
    }

    async fn fetch_content_at(
        &self,
        repo: &str,
        path: &str,
        revision_id: &str,
    ) -> FetchResult<String> {
        let mut url = self.endpoint(repo, "contents", path)?;
        url.query_pairs_mut().append_pair("ref", revision_id);

        let response = self.send(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(repo, path, revision_id, "file absent at revision");
            return Ok(String::new());
        }
        let response = ensure_success(response)?;

        match response.json::<ContentsResponse>().await? {
            ContentsResponse::File(file) => match file.content {
                Some(encoded) => decode_content(&encoded),
                None => {
                    warn!(repo, path, revision_id, "contents API returned no inline content");
                    Ok(String::new())
                }
            },
            ContentsResponse::Dir(_) => {
                warn!(repo, path, revision_id, "path is a directory at this revision");
                Ok(String::new())
            }
        }
    }

    async fn resolve_revision(&self, repo: &str, revision_id: &str) -> FetchResult<RevisionMeta> {
        let url = self.endpoint(repo, "commits", revision_id)?;
        let response = self.send(url).await?;
        // 422 is GitHub's answer for a malformed or unknown sha.
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            return Err(FetchError::RevisionNotFound(revision_id.to_string()));
        }
        let commit: CommitEntry = ensure_success(response)?.json().await?;
        Ok(RevisionMeta::from(commit))
    }

    fn name(&self) -> &str {
        "github"
    }
}

fn ensure_success(response: Response) -> FetchResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Decode the API's base64 `content` field into text. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn decode_content(encoded: &str) -> FetchResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Directories first, then files, each alphabetical.
pub fn contents_from_response(body: ContentsResponse) -> FetchResult<Contents> {
    match body {
        ContentsResponse::Dir(raw) => {
            let mut items: Vec<ContentEntry> = raw.into_iter().map(ContentEntry::from).collect();
            items.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));
            Ok(Contents::Dir { items })
        }
        ContentsResponse::File(file) => {
            let content = match file.content.as_deref() {
                Some(encoded) if !encoded.trim().is_empty() => Some(decode_content(encoded)?),
                _ => None,
            };
            Ok(Contents::File {
                name: file.name,
                path: file.path,
                size: file.size.unwrap_or(0),
                content,
                download_url: file.download_url,
            })
        }
    }
}
