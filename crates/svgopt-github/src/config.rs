//! GitHub client configuration

use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL (`https://api.github.com`, or `https://host/api/v3`)
    pub api_url: String,
    /// Repository as `owner/name`
    pub repository: String,
    /// Token used as bearer authentication
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl GitHubConfig {
    /// Create config for `repository` against the public API
    pub fn new(api_url: &str, repository: &str) -> Self {
        GitHubConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }

    /// Create config from the variables GitHub Actions sets
    pub fn from_env() -> Result<Self, GitHubError> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| GitHubError::Config("GITHUB_REPOSITORY is not set".to_string()))?;
        let api_url =
            std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mut config = Self::new(&api_url, &repository);
        config.token = std::env::var("GITHUB_TOKEN").ok();
        config.validate()?;
        Ok(config)
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Split `repository` into owner and name.
    pub fn owner_and_name(&self) -> Result<(&str, &str), GitHubError> {
        match self.repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner, name))
            }
            _ => Err(GitHubError::Config(format!(
                "repository must be 'owner/name', got '{}'",
                self.repository
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), GitHubError> {
        self.owner_and_name()?;
        if self.timeout_secs == 0 {
            return Err(GitHubError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}
