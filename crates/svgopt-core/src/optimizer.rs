//! SVG optimization behind a "text in, text out" contract.
//!
//! The rewriting itself is done by an [`SvgEngine`]. [`Optimizer`] pairs one
//! engine with one [`OptimizationConfig`] for the whole run; the config cannot
//! be changed after construction, so every file in a run sees the same one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::OptimizeError;

/// Indentation of the rewritten document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// Everything on one line.
    #[default]
    None,
    Tabs,
    Spaces(u8),
}

impl From<IndentStyle> for usvg::Indent {
    fn from(style: IndentStyle) -> Self {
        match style {
            IndentStyle::None => usvg::Indent::None,
            IndentStyle::Tabs => usvg::Indent::Tabs,
            IndentStyle::Spaces(n) => usvg::Indent::Spaces(n),
        }
    }
}

/// Engine configuration, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationConfig {
    /// Decimal places kept for coordinates.
    pub coordinates_precision: u8,

    /// Decimal places kept for transform matrices.
    pub transforms_precision: u8,

    /// Quote attribute values with `'` instead of `"`.
    pub use_single_quote: bool,

    pub indent: IndentStyle,

    pub attributes_indent: IndentStyle,

    /// DPI used to resolve absolute units.
    pub dpi: f32,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            coordinates_precision: 8,
            transforms_precision: 8,
            use_single_quote: false,
            indent: IndentStyle::None,
            attributes_indent: IndentStyle::None,
            dpi: 96.0,
        }
    }
}

impl OptimizationConfig {
    /// Parse a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// SHA-256 of the canonical JSON form. Equal configs give equal fingerprints.
    pub fn fingerprint(&self) -> String {
        // Plain numeric/bool/enum fields: serialization cannot fail.
        let canonical =
            serde_json::to_vec(self).expect("OptimizationConfig serializes to JSON");
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }

    fn write_options(&self) -> usvg::WriteOptions {
        usvg::WriteOptions {
            coordinates_precision: self.coordinates_precision,
            transforms_precision: self.transforms_precision,
            use_single_quote: self.use_single_quote,
            indent: self.indent.into(),
            attributes_indent: self.attributes_indent.into(),
            ..Default::default()
        }
    }
}

/// An SVG rewriting engine.
///
/// Implementations must be deterministic: identical input and configuration
/// give identical output.
pub trait SvgEngine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Rewrite `svg` according to `config`.
    fn optimize(&self, svg: &str, config: &OptimizationConfig) -> Result<String, OptimizeError>;
}

/// Elements the usvg tree cannot carry through a rewrite. Without font
/// support `<text>` is dropped on parse; `<foreignObject>` is never rendered.
const DROPPED_ELEMENTS: [&str; 2] = ["text", "foreignObject"];

/// Engine that parses the document into a `usvg` tree and writes it back out.
///
/// Parsing resolves styles, converts shapes to paths and drops elements that
/// do not render; writing applies the precision and formatting settings.
/// Documents holding content the tree would lose are rejected instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsvgEngine;

impl UsvgEngine {
    fn check_lossless(doc: &usvg::roxmltree::Document) -> Result<(), OptimizeError> {
        let dropped = doc
            .descendants()
            .filter(|n| n.is_element())
            .find(|n| {
                let name = n.tag_name().name();
                DROPPED_ELEMENTS.iter().any(|dropped| *dropped == name)
            });

        match dropped {
            Some(node) => Err(OptimizeError::LossyContent(node.tag_name().name().to_string())),
            None => Ok(()),
        }
    }
}

impl SvgEngine for UsvgEngine {
    fn name(&self) -> &str {
        "usvg"
    }

    fn optimize(&self, svg: &str, config: &OptimizationConfig) -> Result<String, OptimizeError> {
        let xml_options = usvg::roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = usvg::roxmltree::Document::parse_with_options(svg, xml_options)
            .map_err(|e| OptimizeError::Engine(e.to_string()))?;
        Self::check_lossless(&doc)?;

        let usvg_options = usvg::Options {
            dpi: config.dpi,
            ..Default::default()
        };
        let tree = usvg::Tree::from_xmltree(&doc, &usvg_options)
            .map_err(|e| OptimizeError::Engine(e.to_string()))?;

        Ok(tree.to_string(&config.write_options()))
    }
}

/// Run-scoped optimizer: one engine, one immutable configuration.
#[derive(Clone)]
pub struct Optimizer {
    engine: Arc<dyn SvgEngine>,
    config: Arc<OptimizationConfig>,
}

impl Optimizer {
    pub fn new(engine: Arc<dyn SvgEngine>, config: OptimizationConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }

    /// Optimizer backed by [`UsvgEngine`].
    pub fn usvg(config: OptimizationConfig) -> Self {
        Self::new(Arc::new(UsvgEngine), config)
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Optimize one document on the blocking thread pool.
    pub async fn optimize(&self, svg: &str) -> Result<String, OptimizeError> {
        let engine = Arc::clone(&self.engine);
        let config = Arc::clone(&self.config);
        let svg = svg.to_string();

        tokio::task::spawn_blocking(move || engine.optimize(&svg, &config))
            .await
            .map_err(|e| OptimizeError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .finish()
    }
}
