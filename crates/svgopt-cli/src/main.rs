//! svgopt - optimize the SVG files of a pull request
//!
//! ## Commands
//!
//! - `pr`: optimize the SVGs changed in the current pull request and commit
//!   them back to its head branch (meant to run inside a GitHub workflow)
//! - `file`: optimize local SVG files in place

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};

use svgopt_core::{
    load_optimization_config, parse_ignore_list, render_markdown, CommitMessage, FailurePolicy,
    FileStatus, OptimizationConfig, Optimizer, RepositoryContentService, RunOptions, RunReport,
    SuffixMatch, SvgPipeline, DEFAULT_OPTIMIZER_CONFIG_PATH,
};
use svgopt_github::{EventContext, GitHubClient, GitHubConfig, DEFAULT_API_URL};

#[derive(Parser)]
#[command(name = "svgopt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Optimize the SVG files changed in a pull request", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the SVGs changed in the current pull request and commit them
    Pr(PrArgs),

    /// Optimize local SVG files in place
    File {
        /// SVG files to optimize
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Optimizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the optimized documents instead of rewriting the files
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(clap::Args, Debug)]
struct PrArgs {
    /// Token used to read and commit repository contents (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_REPO-TOKEN", hide_env_values = true)]
    repo_token: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Path to the workflow event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Globs of paths to leave alone, separated by commas or newlines
    #[arg(long, env = "INPUT_IGNORE", default_value = "")]
    ignore: String,

    /// Optimize but do not commit
    #[arg(long, env = "INPUT_DRY-RUN", value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Repository path of the optimizer configuration (JSON)
    #[arg(long, env = "INPUT_SVGO-CONFIG", default_value = DEFAULT_OPTIMIZER_CONFIG_PATH)]
    svgo_config: String,

    /// Succeed even when some files fail
    #[arg(long)]
    lenient: bool,

    /// Commit message template; `{path}` is replaced by the file path
    #[arg(long)]
    commit_message: Option<String>,

    /// Match the `.svg` extension case-insensitively
    #[arg(long)]
    case_insensitive: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Also write the run report as JSON to this file
    #[arg(long)]
    report_json: Option<PathBuf>,
}

impl PrArgs {
    fn run_options(&self) -> Result<RunOptions> {
        let suffix_match = if self.case_insensitive {
            SuffixMatch::CaseInsensitive
        } else {
            SuffixMatch::Exact
        };
        let policy = if self.lenient {
            FailurePolicy::Lenient
        } else {
            FailurePolicy::Strict
        };

        let mut options = RunOptions::new(
            parse_ignore_list(&self.ignore),
            suffix_match,
            self.dry_run,
            policy,
        )
        .context("Invalid ignore pattern")?;
        if let Some(template) = &self.commit_message {
            options = options.with_commit_message(CommitMessage::new(template.as_str()));
        }
        Ok(options)
    }

    fn client(&self) -> Result<GitHubClient> {
        let event = match &self.event_path {
            Some(path) => EventContext::from_file(path)
                .with_context(|| format!("Failed to read event payload {:?}", path))?,
            None => None,
        };

        let token = self
            .repo_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());

        let mut config =
            GitHubConfig::new(&self.api_url, &self.repository).with_timeout(self.timeout);
        config.token = token;

        GitHubClient::new(config, event).context("Failed to create GitHub client")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    svgopt_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Pr(args) => cmd_pr(&args).await,
        Commands::File {
            paths,
            config,
            dry_run,
        } => cmd_file(&paths, config.as_deref(), dry_run).await,
    }
}

async fn cmd_pr(args: &PrArgs) -> Result<()> {
    let client = args.client()?;
    let report = run_pr(&client, args).await?;

    print_report(&report);

    if let Ok(summary_path) = std::env::var("GITHUB_STEP_SUMMARY") {
        write_step_summary(Path::new(&summary_path), &report)?;
    }
    if let Some(path) = &args.report_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report {:?}", path))?;
    }

    if report.success {
        Ok(())
    } else {
        anyhow::bail!("SVG optimization failed: {}", report.summary())
    }
}

/// Load the optimizer configuration and run the pipeline against `service`.
///
/// The configuration is read from the repository only once a pull request
/// resolves; otherwise the pipeline runs with defaults and reports the abort.
async fn run_pr(service: &dyn RepositoryContentService, args: &PrArgs) -> Result<RunReport> {
    let options = args.run_options()?;

    let config = match service.resolve_change_id().await {
        Ok(Some(_)) => {
            let config = load_optimization_config(service, &args.svgo_config)
                .await
                .context("Failed to load optimizer configuration")?;
            info!(path = %args.svgo_config, fingerprint = %config.fingerprint(), "optimizer configuration loaded");
            config
        }
        Ok(None) | Err(_) => {
            debug!("no pull request resolved, skipping optimizer configuration");
            OptimizationConfig::default()
        }
    };

    let optimizer = Optimizer::usvg(config);
    Ok(SvgPipeline::run(service, &optimizer, &options).await)
}

fn print_report(report: &RunReport) {
    match report.change_id {
        Some(id) => println!("Pull request: {}", id),
        None => println!("Pull request: unknown"),
    }
    println!("Status: {}", if report.success { "✓ PASSED" } else { "✗ FAILED" });
    println!("Duration: {}ms", report.duration_ms);
    println!();

    for outcome in &report.outcomes {
        let (mark, detail) = match &outcome.status {
            FileStatus::Committed { commit } => ("✓", format!("committed {}", commit.commit_sha)),
            FileStatus::DryRun { encoded_len } => {
                ("✓", format!("dry run, {} encoded bytes", encoded_len))
            }
            FileStatus::Unchanged => ("✓", "already optimized".to_string()),
            FileStatus::NotSmaller {
                original_len,
                optimized_len,
            } => (
                "✓",
                format!("not smaller, {} -> {} bytes", original_len, optimized_len),
            ),
            FileStatus::Failed { error } => ("✗", error.to_string()),
        };
        println!("  {} {} ({}ms, {})", mark, outcome.path, outcome.duration_ms, detail);
    }

    if let Some(verdict) = &report.verdict {
        if !verdict.violations.is_empty() {
            println!();
            println!("Violations:");
            for violation in &verdict.violations {
                println!("  - {}", violation);
            }
        }
    }

    println!();
    println!("Summary: {}", report.summary());
}

/// Append the Markdown report to the job summary file.
fn write_step_summary(path: &Path, report: &RunReport) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open step summary {:?}", path))?;
    file.write_all(render_markdown(report).as_bytes())
        .with_context(|| format!("Failed to write step summary {:?}", path))?;
    Ok(())
}

fn load_local_config(path: Option<&Path>) -> Result<OptimizationConfig> {
    let Some(path) = path else {
        return Ok(OptimizationConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read optimizer configuration {:?}", path))?;
    OptimizationConfig::from_json(&text)
        .with_context(|| format!("Invalid optimizer configuration {:?}", path))
}

async fn cmd_file(paths: &[PathBuf], config: Option<&Path>, dry_run: bool) -> Result<()> {
    let optimizer = Optimizer::usvg(load_local_config(config)?);
    let failed = optimize_files(&optimizer, paths, dry_run).await;

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} file(s) failed", failed.len(), paths.len())
    }
}

/// Optimize each file, returning the paths that failed.
async fn optimize_files(optimizer: &Optimizer, paths: &[PathBuf], dry_run: bool) -> Vec<PathBuf> {
    let mut failed = Vec::new();
    for path in paths {
        match optimize_file(optimizer, path, dry_run).await {
            Ok(LocalOutcome::Optimized { before, after }) => {
                println!("✓ {} ({} -> {} bytes)", path.display(), before, after)
            }
            Ok(LocalOutcome::Unchanged) => println!("✓ {} (already optimized)", path.display()),
            Ok(LocalOutcome::NotSmaller { before, after }) => println!(
                "✓ {} (left alone, {} -> {} bytes)",
                path.display(),
                before,
                after
            ),
            Err(e) => {
                println!("✗ {}: {:#}", path.display(), e);
                failed.push(path.clone());
            }
        }
    }
    failed
}

/// What happened to one local file.
#[derive(Debug, PartialEq, Eq)]
enum LocalOutcome {
    /// Rewritten (or printed, in a dry run).
    Optimized { before: usize, after: usize },
    Unchanged,
    /// Optimizing would not shrink the file, so it was left alone.
    NotSmaller { before: usize, after: usize },
}

async fn optimize_file(optimizer: &Optimizer, path: &Path, dry_run: bool) -> Result<LocalOutcome> {
    let original = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let optimized = optimizer.optimize(&original).await?;

    if optimized == original {
        return Ok(LocalOutcome::Unchanged);
    }
    if optimized.len() >= original.len() {
        return Ok(LocalOutcome::NotSmaller {
            before: original.len(),
            after: optimized.len(),
        });
    }

    if dry_run {
        println!("{}", optimized);
    } else {
        tokio::fs::write(path, &optimized)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    Ok(LocalOutcome::Optimized {
        before: original.len(),
        after: optimized.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use svgopt_core::fakes::{MemoryRepository, RecordingEngine};
    use svgopt_core::{ChangeStatus, RunState};

    fn pr_args(extra: &[&str]) -> PrArgs {
        let mut argv = vec!["svgopt", "pr", "--repository", "octo/site"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Pr(args) => args,
            _ => panic!("expected pr command"),
        }
    }

    #[test]
    fn test_cli_parse_pr_flags() {
        let args = pr_args(&[
            "--ignore",
            "vendor/**, dist/*.svg",
            "--dry-run",
            "--lenient",
            "--case-insensitive",
            "--commit-message",
            "chore: shrink {path}",
        ]);

        let options = args.run_options().unwrap();
        assert!(options.dry_run);
        assert_eq!(options.failure_policy, FailurePolicy::Lenient);
        assert_eq!(options.filter.ignore().patterns(), ["vendor/**", "dist/*.svg"]);
        assert_eq!(options.commit_message.for_path("a.svg"), "chore: shrink a.svg");
    }

    #[test]
    fn test_cli_rejects_bad_glob() {
        let args = pr_args(&["--ignore", "icons/[abc.svg"]);
        assert!(args.run_options().is_err());
    }

    #[test]
    fn test_cli_parse_file() {
        let cli = Cli::try_parse_from(["svgopt", "-v", "file", "a.svg", "b.svg"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::File { paths, dry_run, .. } => {
                assert_eq!(paths.len(), 2);
                assert!(!dry_run);
            }
            _ => panic!("expected file command"),
        }
    }

    #[tokio::test]
    async fn test_run_pr_loads_repository_config() {
        let repo = MemoryRepository::new();
        repo.insert_text_file(".svgo.json", r#"{ "use_single_quote": true }"#);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><!-- {} --><rect width="5" height="5"/></svg>"#,
            "padding ".repeat(60)
        );
        repo.add_svg_change("logo.svg", ChangeStatus::Added, &svg);

        let report = run_pr(&repo, &pr_args(&[])).await.unwrap();

        assert!(report.success, "{:?}", report.outcomes);
        assert_eq!(report.committed_count(), 1);
        let expected = OptimizationConfig {
            use_single_quote: true,
            ..Default::default()
        };
        assert_eq!(report.config_fingerprint, expected.fingerprint());
        let committed = repo.text_of("logo.svg").unwrap();
        assert!(committed.contains("xmlns='http://www.w3.org/2000/svg'"));
    }

    #[tokio::test]
    async fn test_run_pr_rejects_malformed_config() {
        let repo = MemoryRepository::new();
        repo.insert_text_file(".svgo.json", "{ not json");

        let result = run_pr(&repo, &pr_args(&[])).await;
        assert!(result.is_err());
        assert_eq!(repo.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_run_pr_without_pull_request_fails() {
        let repo = MemoryRepository::new();
        repo.set_change_id(None);

        let report = run_pr(&repo, &pr_args(&[])).await.unwrap();
        assert_eq!(report.state, RunState::Failed);
        assert!(!report.success);
        assert_eq!(repo.fetch_calls(), 0, "configuration is not read without a pull request");
        assert_eq!(repo.list_calls(), 0);
    }

    #[test]
    fn test_write_step_summary_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        std::fs::write(&path, "previous step\n").unwrap();

        let repo_report = RunReport {
            change_id: None,
            state: RunState::Failed,
            success: false,
            total_changes: 0,
            candidates: 0,
            outcomes: Vec::new(),
            aborted: Some(svgopt_core::RunAbort::ChangeNotFound),
            verdict: None,
            dry_run: false,
            config_fingerprint: String::new(),
            duration_ms: 0,
        };
        write_step_summary(&path, &repo_report).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("previous step\n# SVG optimization"));
        assert!(written.contains("Could not get the pull request number from context"));
    }

    #[tokio::test]
    async fn test_optimize_files_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let loose = dir.path().join("loose.svg");
        let tight = dir.path().join("tight.svg");
        let broken = dir.path().join("broken.svg");
        std::fs::write(&loose, "<svg>\n  <g/>\n</svg>").unwrap();
        std::fs::write(&tight, "<svg><g/></svg>").unwrap();
        std::fs::write(&broken, "<svg>FAIL</svg>").unwrap();

        let engine = Arc::new(RecordingEngine::new());
        engine.fail_on("FAIL");
        let optimizer = Optimizer::new(engine.clone(), OptimizationConfig::default());

        let failed = optimize_files(
            &optimizer,
            &[loose.clone(), tight.clone(), broken.clone()],
            false,
        )
        .await;

        assert_eq!(failed, vec![broken]);
        assert_eq!(std::fs::read_to_string(&loose).unwrap(), "<svg><g/></svg>");
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_optimize_file_dry_run_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.svg");
        std::fs::write(&path, "<svg>\n</svg>").unwrap();
        let optimizer = Optimizer::new(Arc::new(RecordingEngine::new()), OptimizationConfig::default());

        let outcome = optimize_file(&optimizer, &path, true).await.unwrap();

        assert_eq!(outcome, LocalOutcome::Optimized { before: 12, after: 11 });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg>\n</svg>");
    }

    #[tokio::test]
    async fn test_optimize_file_keeps_file_that_would_grow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.svg");
        let compact = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="5" height="5"/></svg>"#;
        std::fs::write(&path, compact).unwrap();
        let optimizer = Optimizer::usvg(OptimizationConfig::default());

        let outcome = optimize_file(&optimizer, &path, false).await.unwrap();

        assert!(matches!(outcome, LocalOutcome::NotSmaller { before, after } if after >= before));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), compact);
    }

    #[test]
    fn test_load_local_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svgo.json");
        std::fs::write(&path, r#"{ "coordinates_precision": 3 }"#).unwrap();

        let config = load_local_config(Some(&path)).unwrap();
        assert_eq!(config.coordinates_precision, 3);
        assert_eq!(load_local_config(None).unwrap(), OptimizationConfig::default());
        assert!(load_local_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
