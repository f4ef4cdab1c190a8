//! svgopt core library
//!
//! Selects the SVG files touched by a pull request, optimizes each one, and
//! commits the result back to the pull request's head branch. Repository
//! access sits behind [`RepositoryContentService`]; the SVG engine behind
//! [`SvgEngine`].

pub mod change;
pub mod codec;
pub mod config;
pub mod error;
pub mod fakes;
pub mod filter;
pub mod obs;
pub mod optimizer;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod repository;
pub mod runner;
pub mod state;
pub mod telemetry;

pub use change::{
    ChangeDescriptor, ChangeId, ChangeStatus, CommitResult, FileContent, FileUpdate,
};
pub use codec::Encoding;
pub use config::{
    load_optimization_config, parse_ignore_list, CommitMessage, RunOptions,
    DEFAULT_OPTIMIZER_CONFIG_PATH,
};
pub use error::{
    CodecError, ConfigError, FileError, OptimizeError, RepositoryError, RunAbort,
};
pub use filter::{ChangeFilter, IgnoreSet, SuffixMatch, SVG_FILE_EXTENSION};
pub use optimizer::{IndentStyle, OptimizationConfig, Optimizer, SvgEngine, UsvgEngine};
pub use pipeline::{RunReport, SvgPipeline};
pub use policy::{FailurePolicy, RunVerdict};
pub use report::{render_markdown, RunSummary};
pub use repository::{RepositoryContentService, RepositoryResult};
pub use runner::{FileOutcome, FileRunner, FileStatus};
pub use state::{InvalidTransition, RunState};
pub use telemetry::init_tracing;
