//! Per-tree reference transformation: scan, resolve, submit.

use futures_util::future::try_join_all;

use crate::config::ResolutionConfig;
use crate::document::DocumentTree;
use crate::error::PipelineResult;
use crate::queue::{JobOptions, ProcessJob, ProcessingQueue};

use super::scan::{image_refs, ImageReference};
use super::{paths, resolve};

/// Resolve and submit every image reference in `tree`.
///
/// The tree itself is left untouched; the side effect is job submission.
/// Jobs are submitted concurrently in document order and this function
/// returns once every submission has settled, so serialization never races
/// ahead of scheduling. Submission settles at generation completion (see
/// [`ProcessingQueue::submit`]).
///
/// Returns the number of jobs submitted.
pub async fn process_tree(
    tree: &DocumentTree,
    config: &ResolutionConfig,
    queue: &ProcessingQueue,
) -> PipelineResult<usize> {
    let jobs: Vec<ProcessJob> = image_refs(tree)
        .map(|reference| resolve_job(&reference, config))
        .collect();
    let submitted = jobs.len();

    try_join_all(jobs.into_iter().map(|job| queue.submit(job))).await?;
    Ok(submitted)
}

/// Build the job for one reference under one document's configuration.
///
/// Only attributes that resolved to a defined value appear in the options;
/// the document-level `webp`/`avif` flags are copied through unconditionally
/// (absent stays absent).
fn resolve_job(reference: &ImageReference, config: &ResolutionConfig) -> ProcessJob {
    let effective = paths::apply_prefix(&reference.src, config.src_prefix.as_deref());
    let (input_file, output_dir) =
        paths::job_paths(&effective, &config.input_dir, &config.output_dir);

    let width = resolve::numeric(reference.width.as_deref(), config.width);
    let quality = resolve::numeric(reference.quality.as_deref(), config.quality);

    ProcessJob {
        input_file,
        output_dir,
        options: JobOptions {
            widths: width.map(|w| vec![w]),
            quality,
            webp: config.webp,
            avif: config.avif,
            skip_generation: None,
        },
    }
}
