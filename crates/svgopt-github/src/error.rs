//! Error types for svgopt-github

use svgopt_core::RepositoryError;
use thiserror::Error;

/// Errors that can occur while talking to GitHub
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Client configuration is unusable
    #[error("Invalid GitHub configuration: {0}")]
    Config(String),

    /// The event payload could not be read or parsed
    #[error("Invalid event payload: {0}")]
    Event(String),

    /// Request could not be sent or the response body not read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success status other than 404
    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response from {what}: {reason}")]
    Decode { what: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<GitHubError> for RepositoryError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(what) => RepositoryError::NotFound(what),
            GitHubError::Decode { .. } | GitHubError::Event(_) => {
                RepositoryError::InvalidResponse(err.to_string())
            }
            GitHubError::Config(_)
            | GitHubError::Http(_)
            | GitHubError::Status { .. }
            | GitHubError::Io(_) => RepositoryError::Transport(err.to_string()),
        }
    }
}
