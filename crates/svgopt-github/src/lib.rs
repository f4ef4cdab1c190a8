//! GitHub content service for svgopt
//!
//! [`GitHubClient`] lists the files of a pull request, fetches their content
//! at the head branch, and commits optimized content back through the REST
//! contents API. The pull request comes from the workflow event payload
//! ([`EventContext`]).

pub mod client;
pub mod config;
pub mod error;
pub mod event;

pub use client::{GitHubClient, FILES_PER_PAGE};
pub use config::{GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;
pub use event::EventContext;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GitHubError>;
