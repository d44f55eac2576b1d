//! Error types for the Refract pipeline.
//!
//! Errors are organized by concern: configuration problems are raised
//! synchronously before any I/O starts, pipeline errors carry the document
//! or image path they occurred on.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Top-level error type for Refract operations.
#[derive(Error, Debug)]
pub enum RefractError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
///
/// These surface from [`crate::MarkdownPipeline::new`] before any document
/// has been read.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No document glob pattern was configured
    #[error("At least one document glob pattern is required")]
    MissingFiles,

    /// A glob pattern failed to compile
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document read failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Glob enumeration failed mid-walk
    #[error("Failed to enumerate '{pattern}': {source}")]
    Enumerate {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    /// Source image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Derivative generation failed
    #[error("Generation failed for {path}: {message}")]
    Generate { path: PathBuf, message: String },

    /// Failure of a deduplicated job, delivered to every submitter
    #[error(transparent)]
    Job(#[from] Arc<PipelineError>),
}

/// Convenience type alias for Refract results.
pub type Result<T> = std::result::Result<T, RefractError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
