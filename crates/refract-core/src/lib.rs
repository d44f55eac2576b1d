//! Refract Core - markdown image derivative scheduling library.
//!
//! Refract scans markdown documents for image references — inline markup and
//! front-matter fields — resolves per-reference generation options against
//! document-level configuration, and schedules resize/format derivative
//! generation through a shared, deduplicating queue.
//!
//! # Architecture
//!
//! ```text
//! Documents (glob) → Read → Split front matter
//!                            ├─ Body: Parse → Scan img refs → Resolve → Submit
//!                            └─ Metadata keys: Resolve → Submit
//!                                     ↓
//!                     Queue (dedup + bounded concurrency)
//!                                     ↓
//!                          ImageGenerator → Derivatives
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use refract_core::{MarkdownPipeline, PipelineOptions, ResolutionConfig};
//!
//! #[tokio::main]
//! async fn main() -> refract_core::Result<()> {
//!     let options = PipelineOptions {
//!         files: vec!["content/**/*.md".into()],
//!         resolution: ResolutionConfig {
//!             input_dir: "static".into(),
//!             output_dir: "static/g".into(),
//!             width: Some(1280),
//!             ..Default::default()
//!         }
//!         .into(),
//!         ..Default::default()
//!     };
//!     let summary = MarkdownPipeline::new(options)?.run().await?;
//!     println!("{} job(s) scheduled", summary.jobs_submitted);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod queue;

// Re-exports for convenient access
pub use config::{DocumentConfig, PipelineOptions, ResolutionConfig};
pub use error::{ConfigError, PipelineError, PipelineResult, RefractError, Result};
pub use generate::{DerivativeGenerator, DerivativeImage, ImageGenerator};
pub use pipeline::{BatchSummary, ImageReference, MarkdownPipeline};
pub use queue::{JobOptions, ProcessJob, ProcessingQueue};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
