//! Batch driver: enumerate documents, process bodies and front matter, join.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::try_join_all;

use crate::config::{PipelineOptions, ResolutionConfig};
use crate::document::{self, Metadata};
use crate::error::{ConfigError, PipelineError, PipelineResult, RefractError, Result};
use crate::generate::{DerivativeGenerator, ImageGenerator};
use crate::queue::{JobOptions, ProcessJob, ProcessingQueue};

use super::{paths, transform};

/// Outcome counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSummary {
    /// Documents read and processed
    pub documents: usize,
    /// Jobs submitted, before deduplication
    pub jobs_submitted: usize,
    /// Distinct generation jobs after deduplication
    pub distinct_jobs: usize,
}

/// The markdown image pipeline: one instance per batch run.
///
/// Construction validates the configuration synchronously; [`run`] does all
/// the I/O. Every document fans out concurrently and the run fails fast on
/// the first document or generation error.
///
/// [`run`]: MarkdownPipeline::run
pub struct MarkdownPipeline {
    options: PipelineOptions,
    queue: Arc<ProcessingQueue>,
}

impl MarkdownPipeline {
    /// Validate the configuration and build a pipeline with the built-in
    /// generator.
    pub fn new(options: PipelineOptions) -> std::result::Result<Self, ConfigError> {
        Self::with_generator(options, Arc::new(DerivativeGenerator))
    }

    /// Same as [`MarkdownPipeline::new`] with a caller-supplied generator.
    pub fn with_generator(
        options: PipelineOptions,
        generator: Arc<dyn ImageGenerator>,
    ) -> std::result::Result<Self, ConfigError> {
        if options.files.iter().all(|pattern| pattern.trim().is_empty()) {
            return Err(ConfigError::MissingFiles);
        }
        for pattern in &options.files {
            glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        let queue = Arc::new(ProcessingQueue::new(generator, options.max_concurrency));
        Ok(Self { options, queue })
    }

    /// Run the batch to completion.
    ///
    /// An empty glob match is not an error: the run resolves immediately
    /// without touching the parser or the queue.
    pub async fn run(&self) -> Result<BatchSummary> {
        let documents = self.enumerate()?;
        if documents.is_empty() {
            tracing::info!("no documents matched; nothing to do");
            return Ok(BatchSummary::default());
        }
        tracing::info!("processing {} document(s)", documents.len());

        let job_counts = try_join_all(
            documents
                .iter()
                .map(|path| self.process_document(path)),
        )
        .await
        .map_err(RefractError::from)?;

        Ok(BatchSummary {
            documents: documents.len(),
            jobs_submitted: job_counts.iter().sum(),
            distinct_jobs: self.queue.distinct_jobs(),
        })
    }

    /// Expand the configured glob patterns into an ordered document list.
    fn enumerate(&self) -> Result<Vec<PathBuf>> {
        let mut documents = Vec::new();
        let mut seen = HashSet::new();
        for pattern in &self.options.files {
            if pattern.trim().is_empty() {
                continue;
            }
            let entries = glob::glob(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            for entry in entries {
                let path = entry.map_err(|source| PipelineError::Enumerate {
                    pattern: pattern.clone(),
                    source,
                })?;
                if path.is_file() && seen.insert(path.clone()) {
                    documents.push(path);
                }
            }
        }
        Ok(documents)
    }

    /// Drive one document: read, split, then body transform and metadata
    /// jobs concurrently. Returns the number of jobs submitted.
    async fn process_document(&self, path: &Path) -> PipelineResult<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PipelineError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let (metadata, body) = document::split(&raw);
        let config = self.options.resolution.for_document(path);

        let (body_jobs, metadata_jobs) = tokio::try_join!(
            self.process_body(&body, &config),
            self.process_metadata(&metadata, &config),
        )?;

        tracing::debug!(
            document = %path.display(),
            jobs = body_jobs + metadata_jobs,
            "document settled"
        );
        Ok(body_jobs + metadata_jobs)
    }

    /// Parse → transform → serialize. The serialized HTML is discarded: the
    /// pipeline's product is the scheduled generation work, and rendering
    /// belongs to the site generator that owns the documents.
    async fn process_body(
        &self,
        body: &str,
        config: &ResolutionConfig,
    ) -> PipelineResult<usize> {
        let parser = document::MarkdownParser::new(self.options.include_img);
        let tree = parser.parse(body);
        let submitted = transform::process_tree(&tree, config, &self.queue).await?;
        let _rendered = document::to_html(&tree);
        Ok(submitted)
    }

    /// One job per configured front-matter key with a non-empty string
    /// value. The value is the reference path; generation is forced even
    /// over fresh derivatives.
    async fn process_metadata(
        &self,
        metadata: &Metadata,
        config: &ResolutionConfig,
    ) -> PipelineResult<usize> {
        let mut jobs = Vec::new();
        for key in &self.options.front_matter_keys {
            let Some(image) = document::string_value(metadata, key) else {
                continue;
            };
            let (input_file, output_dir) =
                paths::job_paths(image, &config.input_dir, &config.output_dir);
            jobs.push(ProcessJob {
                input_file,
                output_dir,
                options: JobOptions {
                    widths: config.width.map(|width| vec![width]),
                    quality: None,
                    webp: config.webp,
                    avif: None,
                    skip_generation: Some(false),
                },
            });
        }

        let submitted = jobs.len();
        try_join_all(jobs.into_iter().map(|job| self.queue.submit(job))).await?;
        Ok(submitted)
    }
}
