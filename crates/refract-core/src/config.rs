//! Configuration surface for the pipeline.
//!
//! [`ResolutionConfig`] is the document-level layer of option resolution; it
//! may be shared by every document or computed per document. Per-reference
//! attributes read from the markup always take precedence over it (see
//! [`crate::pipeline::resolve`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Document-level resolution configuration.
///
/// Every `Option` field distinguishes "never specified" (`None`) from an
/// explicit value; `None` fields stay absent from the resolved job rather
/// than being defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Root directory reference paths are resolved against
    pub input_dir: PathBuf,

    /// Root directory derivative output mirrors into
    pub output_dir: PathBuf,

    /// Prefix applied to every reference path before root mapping.
    /// Normalized to end with exactly one `/` before use.
    pub src_prefix: Option<String>,

    /// Default derivative width for references without a valid width attribute
    pub width: Option<u32>,

    /// Default encoder quality for references without a valid quality attribute
    pub quality: Option<u32>,

    /// WebP derivative switch, copied onto every job (absent leaves the
    /// generator's own default in force)
    pub webp: Option<bool>,

    /// AVIF derivative switch, copied onto every body job
    pub avif: Option<bool>,
}

/// How the per-document [`ResolutionConfig`] is obtained.
pub enum DocumentConfig {
    /// One configuration shared by every document
    Static(ResolutionConfig),

    /// Computed from the document path, invoked once per document
    PerDocument(Box<dyn Fn(&Path) -> ResolutionConfig + Send + Sync>),
}

impl DocumentConfig {
    /// Resolve the configuration for one document.
    pub fn for_document(&self, path: &Path) -> ResolutionConfig {
        match self {
            DocumentConfig::Static(config) => config.clone(),
            DocumentConfig::PerDocument(compute) => compute(path),
        }
    }
}

impl fmt::Debug for DocumentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentConfig::Static(config) => f.debug_tuple("Static").field(config).finish(),
            DocumentConfig::PerDocument(_) => f.write_str("PerDocument(..)"),
        }
    }
}

impl From<ResolutionConfig> for DocumentConfig {
    fn from(config: ResolutionConfig) -> Self {
        DocumentConfig::Static(config)
    }
}

/// Caller-facing options for one batch run.
#[derive(Debug)]
pub struct PipelineOptions {
    /// Glob pattern(s) selecting the markdown documents to process. Required:
    /// an empty list is a configuration error before any I/O happens.
    pub files: Vec<String>,

    /// Recognize raw inline `<img>` HTML in markdown bodies
    pub include_img: bool,

    /// Front-matter keys whose string values are treated as image references
    pub front_matter_keys: Vec<String>,

    /// Per-document resolution configuration
    pub resolution: DocumentConfig,

    /// Maximum concurrent derivative generations
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            include_img: false,
            front_matter_keys: Vec::new(),
            resolution: DocumentConfig::Static(ResolutionConfig::default()),
            max_concurrency: 4,
        }
    }
}
