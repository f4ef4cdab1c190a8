//! Tracing initialisation for svgopt binaries.
//!
//! Call [`init_tracing`] once at program start. Logs go to stderr so that
//! stdout stays free for reports.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow the requested verbosity.
const SVGOPT_TARGETS: [&str; 3] = ["svgopt", "svgopt_core", "svgopt_github"];

/// Verbosity for everything else (usvg, reqwest, hyper).
const DEPENDENCY_LEVEL: &str = "warn";

/// Filter directive used when `RUST_LOG` is unset: `level` for svgopt's own
/// crates, `warn` for dependencies.
pub fn default_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directive = DEPENDENCY_LEVEL.to_string();
    for target in SVGOPT_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Initialise the global tracing subscriber.
///
/// * `json` emits newline-delimited JSON log lines carrying the current
///   run span (`change_id`).
/// * `level` is the verbosity of svgopt's crates when `RUST_LOG` is not set.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
