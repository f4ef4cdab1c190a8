//! Error types for svgopt-core
//!
//! Helpers (codec, filter, optimizer, content service) return their own typed
//! errors. The pipeline is the only place that decides whether an error aborts
//! the run ([`RunAbort`]) or only the file being processed ([`FileError`]).

use thiserror::Error;

/// Errors raised while converting between a transport encoding and text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The encoding name is not one of the supported encodings.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The data could not be converted with a supported encoding.
    #[error("Malformed {encoding} data: {reason}")]
    Malformed { encoding: String, reason: String },
}

/// Errors raised by the optimization engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizeError {
    /// The engine rejected the input (e.g. malformed SVG).
    #[error("Optimization failed: {0}")]
    Engine(String),

    /// The document holds content the engine would silently drop.
    #[error("Optimization would drop <{0}> content")]
    LossyContent(String),

    /// The blocking optimization task panicked or was cancelled.
    #[error("Optimization task failed: {0}")]
    Task(String),
}

/// Errors raised by a repository content service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request could not be completed (network, auth, server error).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with something that could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised while building run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An ignore pattern is not a valid glob.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// The optimizer configuration could not be parsed.
    #[error("Invalid optimizer configuration in '{path}': {reason}")]
    InvalidOptimizerConfig { path: String, reason: String },

    /// The optimizer configuration could not be read.
    #[error("Failed to read optimizer configuration '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: RepositoryError,
    },
}

/// A failure isolated to a single candidate file, tagged by the step that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] RepositoryError),

    #[error("decode failed: {0}")]
    Decode(#[source] CodecError),

    #[error("optimize failed: {0}")]
    Optimize(#[source] OptimizeError),

    #[error("commit failed: {0}")]
    Commit(#[source] RepositoryError),
}

impl FileError {
    /// Name of the pipeline step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            FileError::Fetch(_) => "fetch",
            FileError::Decode(_) => "decode",
            FileError::Optimize(_) => "optimize",
            FileError::Commit(_) => "commit",
        }
    }
}

/// A run-level failure. No candidate is processed after one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunAbort {
    /// The change (pull request) could not be identified from the execution context.
    #[error("Could not get the pull request number from context")]
    ChangeNotFound,

    /// Resolving the change failed at the transport level.
    #[error("Failed to resolve the change: {0}")]
    ResolveChange(#[source] RepositoryError),

    /// The list of changed files could not be fetched.
    #[error("Failed to list changed files: {0}")]
    ListFiles(#[source] RepositoryError),
}
