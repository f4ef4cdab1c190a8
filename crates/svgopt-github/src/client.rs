//! GitHub REST client
//!
//! Implements [`RepositoryContentService`] against the pull request and
//! contents endpoints of the GitHub REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use svgopt_core::{
    ChangeDescriptor, ChangeId, ChangeStatus, CommitResult, Encoding, FileContent, FileUpdate,
    RepositoryContentService, RepositoryResult,
};
use tracing::debug;

use crate::config::GitHubConfig;
use crate::error::GitHubError;
use crate::event::EventContext;

/// Page size for listing pull request files (the API maximum).
pub const FILES_PER_PAGE: usize = 100;

/// The files endpoint lists at most 3000 files.
const MAX_FILE_PAGES: usize = 30;

const USER_AGENT: &str = concat!("svgopt/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct PullFile {
    filename: String,
    status: ChangeStatus,
}

#[derive(Deserialize)]
struct ContentsResponse {
    path: String,
    sha: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Deserialize)]
struct UpdateResponse {
    commit: CommitInfo,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: String,
    html_url: Option<String>,
}

/// GitHub client for one repository and (optionally) one pull request
pub struct GitHubClient {
    config: GitHubConfig,
    event: Option<EventContext>,
    base: Url,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new client. `event` is the pull request the run is for.
    pub fn new(config: GitHubConfig, event: Option<EventContext>) -> Result<Self, GitHubError> {
        config.validate()?;
        let base = Url::parse(&config.api_url)
            .map_err(|e| GitHubError::Config(format!("invalid API URL '{}': {e}", config.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(GitHubError::Config(format!(
                "API URL '{}' cannot be a base",
                config.api_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GitHubClient {
            config,
            event,
            base,
            http_client,
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    pub fn event(&self) -> Option<&EventContext> {
        self.event.as_ref()
    }

    /// `{api_url}/repos/{owner}/{name}/{segments...}`, each segment percent-encoded.
    fn repo_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, GitHubError> {
        let (owner, name) = self.config.owner_and_name()?;
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::Config("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["repos", owner, name])
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn contents_url(&self, path: &str) -> Result<Url, GitHubError> {
        self.repo_url(std::iter::once("contents").chain(path.split('/')))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .http_client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, GitHubError> {
        let response = request.send().await?;
        let body = Self::check_status(response, what).await?;
        serde_json::from_str(&body).map_err(|e| GitHubError::Decode {
            what: what.to_string(),
            reason: e.to_string(),
        })
    }

    async fn check_status(response: Response, what: &str) -> Result<String, GitHubError> {
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// List every file of pull request `number`, following pagination.
    pub async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangeDescriptor>, GitHubError> {
        let number = number.to_string();
        let mut files = Vec::new();

        for page in 1..=MAX_FILE_PAGES {
            let mut url = self.repo_url(["pulls", number.as_str(), "files"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &FILES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<PullFile> = self
                .send(self.request(Method::GET, url), &format!("pull request #{number} files"))
                .await?;
            debug!(page = page, count = batch.len(), "fetched pull request files");

            let short = batch.len() < FILES_PER_PAGE;
            files.extend(
                batch
                    .into_iter()
                    .map(|f| ChangeDescriptor::new(f.filename, f.status)),
            );
            if short {
                break;
            }
        }

        Ok(files)
    }

    /// Fetch `path` at the pull request head (or the default branch without one).
    pub async fn get_contents(&self, path: &str) -> Result<FileContent, GitHubError> {
        let mut url = self.contents_url(path)?;
        if let Some(event) = &self.event {
            url.query_pairs_mut().append_pair("ref", &event.head_ref);
        }

        let contents: ContentsResponse = self.send(self.request(Method::GET, url), path).await?;
        Ok(FileContent {
            path: contents.path,
            encoding: contents.encoding,
            raw_content: contents.content,
            sha: contents.sha,
        })
    }

    /// Create or update `update.path` on the pull request head branch.
    pub async fn put_contents(&self, update: &FileUpdate) -> Result<CommitResult, GitHubError> {
        let content = match update.encoding {
            Encoding::Base64 => update.content.clone(),
            other => {
                let text = other.decode(&update.content).map_err(|e| GitHubError::Decode {
                    what: update.path.clone(),
                    reason: e.to_string(),
                })?;
                Encoding::Base64.encode(&text)
            }
        };

        let body = UpdateRequest {
            message: &update.message,
            content: &content,
            sha: update.sha.as_deref(),
            branch: self.event.as_ref().map(|e| e.head_ref.as_str()),
        };

        let url = self.contents_url(&update.path)?;
        let response: UpdateResponse = self
            .send(self.request(Method::PUT, url).json(&body), &update.path)
            .await?;

        Ok(CommitResult {
            path: update.path.clone(),
            commit_sha: response.commit.sha,
            url: response.commit.html_url,
        })
    }
}

#[async_trait]
impl RepositoryContentService for GitHubClient {
    async fn resolve_change_id(&self) -> RepositoryResult<Option<ChangeId>> {
        Ok(self.event.as_ref().map(EventContext::change_id))
    }

    async fn list_changed_files(&self, id: &ChangeId) -> RepositoryResult<Vec<ChangeDescriptor>> {
        Ok(self.pull_request_files(id.0).await?)
    }

    async fn fetch_file_content(&self, path: &str) -> RepositoryResult<FileContent> {
        Ok(self.get_contents(path).await?)
    }

    async fn commit_file(&self, update: &FileUpdate) -> RepositoryResult<CommitResult> {
        Ok(self.put_contents(update).await?)
    }
}
