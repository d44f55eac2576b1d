//! Cross-document processing queue: deduplication and bounded concurrency.
//!
//! One queue is created per batch run and shared by every document's
//! transform stage. Jobs are fingerprinted; an identical job submitted
//! anywhere in the run generates at most once, and every submitter observes
//! that single outcome. `submit` resolves at job *completion*, not
//! acknowledgment, so generation failures surface through the fail-fast
//! batch join. Completed entries are retained for the life of the run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{PipelineError, PipelineResult};
use crate::generate::{DerivativeImage, ImageGenerator};

/// Generation options carried by one job.
///
/// `None` means the attribute was never specified at any configuration layer
/// and stays absent from the serialized job; `Some(false)` is preserved and
/// is a different value than absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobOptions {
    /// Derivative widths to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widths: Option<Vec<u32>>,

    /// Encoder quality for lossy formats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,

    /// WebP derivative switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webp: Option<bool>,

    /// AVIF derivative switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avif: Option<bool>,

    /// `Some(true)` suppresses pixel work; `Some(false)` forces it even over
    /// a fresh derivative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_generation: Option<bool>,
}

/// The unit of work submitted to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessJob {
    /// Source image file
    pub input_file: PathBuf,

    /// Directory derivatives are written into (mirrors the source layout)
    pub output_dir: PathBuf,

    /// Resolved generation options
    pub options: JobOptions,
}

impl ProcessJob {
    /// Content fingerprint identifying this job for deduplication.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).expect("job serializes to JSON");
        blake3::hash(&canonical).to_hex().to_string()
    }
}

type JobOutcome = Result<Vec<DerivativeImage>, Arc<PipelineError>>;
type SharedJob = Shared<BoxFuture<'static, JobOutcome>>;

/// Deduplicating, concurrency-bounded job queue shared across documents.
pub struct ProcessingQueue {
    generator: Arc<dyn ImageGenerator>,
    permits: Arc<Semaphore>,
    jobs: Mutex<HashMap<String, SharedJob>>,
}

impl ProcessingQueue {
    /// Create a queue driving `generator` with at most `max_concurrency`
    /// generations in flight.
    pub fn new(generator: Arc<dyn ImageGenerator>, max_concurrency: usize) -> Self {
        Self {
            generator,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct jobs accepted so far.
    pub fn distinct_jobs(&self) -> usize {
        self.jobs.lock().expect("job table poisoned").len()
    }

    /// Submit a job, resolving when its (possibly shared) generation
    /// completes.
    ///
    /// The dedup table is updated under a synchronous lock, before any await
    /// point, so a re-entrant identical submission during an in-flight job
    /// still deduplicates.
    pub async fn submit(&self, job: ProcessJob) -> PipelineResult<Vec<DerivativeImage>> {
        let fingerprint = job.fingerprint();
        let input = job.input_file.clone();

        let (task, deduplicated) = {
            let mut jobs = self.jobs.lock().expect("job table poisoned");
            match jobs.get(&fingerprint) {
                Some(existing) => (existing.clone(), true),
                None => {
                    let task = self.generation_task(job);
                    jobs.insert(fingerprint.clone(), task.clone());
                    (task, false)
                }
            }
        };

        tracing::debug!(
            fingerprint = &fingerprint[..12],
            path = %input.display(),
            deduplicated,
            "job submitted"
        );

        task.await.map_err(PipelineError::from)
    }

    /// Build the shared future that performs one generation under a permit.
    fn generation_task(&self, job: ProcessJob) -> SharedJob {
        let generator = Arc::clone(&self.generator);
        let permits = Arc::clone(&self.permits);

        async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| {
                    Arc::new(PipelineError::Generate {
                        path: job.input_file.clone(),
                        message: "queue semaphore closed".to_string(),
                    })
                })?;
            generator
                .generate(&job.input_file, &job.output_dir, &job.options)
                .await
                .map_err(Arc::new)
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Mock generator recording calls and observed concurrency.
    struct MockGenerator {
        call_count: AtomicU32,
        in_flight: AtomicU32,
        max_concurrent: AtomicU32,
        delay: Option<Duration>,
        fail: bool,
    }

    impl MockGenerator {
        fn new() -> Self {
            Self {
                call_count: AtomicU32::new(0),
                in_flight: AtomicU32::new(0),
                max_concurrent: AtomicU32::new(0),
                delay: None,
                fail: false,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for MockGenerator {
        async fn generate(
            &self,
            input_file: &Path,
            _output_dir: &Path,
            _options: &JobOptions,
        ) -> PipelineResult<Vec<DerivativeImage>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::Generate {
                    path: input_file.to_path_buf(),
                    message: "mock failure".to_string(),
                });
            }
            Ok(vec![DerivativeImage {
                path: input_file.to_path_buf(),
                width: 100,
                format: "jpeg".to_string(),
            }])
        }
    }

    fn job(input: &str) -> ProcessJob {
        ProcessJob {
            input_file: PathBuf::from(input),
            output_dir: PathBuf::from("out"),
            options: JobOptions::default(),
        }
    }

    #[test]
    fn test_fingerprint_distinguishes_absent_from_false() {
        let unspecified = job("a.jpg");
        let disabled = ProcessJob {
            options: JobOptions {
                webp: Some(false),
                ..JobOptions::default()
            },
            ..job("a.jpg")
        };
        assert_ne!(unspecified.fingerprint(), disabled.fingerprint());
        assert_eq!(unspecified.fingerprint(), job("a.jpg").fingerprint());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_identical_jobs_generate_once() {
        let generator = Arc::new(MockGenerator::new().with_delay(Duration::from_millis(50)));
        let queue = Arc::new(ProcessingQueue::new(generator.clone(), 4));

        let (a, b) = tokio::join!(queue.submit(job("a.jpg")), queue.submit(job("a.jpg")));
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(generator.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(queue.distinct_jobs(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_completed_jobs_stay_deduplicated() {
        let generator = Arc::new(MockGenerator::new());
        let queue = ProcessingQueue::new(generator.clone(), 4);

        queue.submit(job("a.jpg")).await.unwrap();
        queue.submit(job("a.jpg")).await.unwrap();

        assert_eq!(generator.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_different_options_are_different_jobs() {
        let generator = Arc::new(MockGenerator::new());
        let queue = ProcessingQueue::new(generator.clone(), 4);

        queue.submit(job("a.jpg")).await.unwrap();
        let mut wider = job("a.jpg");
        wider.options.widths = Some(vec![500]);
        queue.submit(wider).await.unwrap();

        assert_eq!(generator.call_count.load(Ordering::SeqCst), 2);
        assert_eq!(queue.distinct_jobs(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let generator = Arc::new(MockGenerator::new().with_delay(Duration::from_millis(100)));
        let queue = Arc::new(ProcessingQueue::new(generator.clone(), 2));

        let submissions: Vec<_> = (0..6)
            .map(|i| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.submit(job(&format!("img-{i}.jpg"))).await })
            })
            .collect();
        for handle in submissions {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(generator.call_count.load(Ordering::SeqCst), 6);
        assert!(
            generator.max_concurrent.load(Ordering::SeqCst) <= 2,
            "semaphore violated: max concurrent was {}",
            generator.max_concurrent.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shared_failure_reaches_every_submitter() {
        let generator = Arc::new(MockGenerator::failing().with_delay(Duration::from_millis(50)));
        let queue = Arc::new(ProcessingQueue::new(generator.clone(), 4));

        let (a, b) = tokio::join!(queue.submit(job("a.jpg")), queue.submit(job("a.jpg")));

        assert_eq!(generator.call_count.load(Ordering::SeqCst), 1);
        assert!(a.is_err());
        assert!(b.is_err());
    }
}
