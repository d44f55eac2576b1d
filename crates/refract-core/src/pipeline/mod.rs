//! The reference-resolution and scheduling pipeline.
//!
//! ```text
//! scan (tree → references) → resolve (options) → paths (roots/prefix)
//!                          → transform (submit per tree)
//!                          → batch (documents → join)
//! ```

mod batch;
pub mod paths;
pub mod resolve;
mod scan;
mod transform;

pub use batch::{BatchSummary, MarkdownPipeline};
pub use scan::{image_refs, ImageRefs, ImageReference};
pub use transform::process_tree;
