//! Image derivative generation.
//!
//! The queue drives an [`ImageGenerator`]; [`DerivativeGenerator`] is the
//! built-in implementation on the `image` crate. Skip and freshness policy
//! live here, not in option resolution: an absent format flag means the
//! derivative is produced.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::queue::JobOptions;

/// One generated derivative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivativeImage {
    /// Where the derivative was written
    pub path: PathBuf,
    /// Pixel width of the derivative
    pub width: u32,
    /// Encoded format ("jpeg", "webp", ...)
    pub format: String,
}

/// Image generation collaborator driven by the queue.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the queue holds an `Arc<dyn ImageGenerator>`).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate all derivatives for one source image.
    async fn generate(
        &self,
        input_file: &Path,
        output_dir: &Path,
        options: &JobOptions,
    ) -> PipelineResult<Vec<DerivativeImage>>;
}

/// Built-in generator.
///
/// Resizes to each requested width (never upscaling) and writes the source
/// format plus WebP — and AVIF when the `avif` feature is compiled in —
/// under the job's output directory. A derivative that already exists and is
/// at least as fresh as its source is left alone unless the job forces
/// regeneration (`skip_generation: Some(false)`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivativeGenerator;

#[async_trait]
impl ImageGenerator for DerivativeGenerator {
    async fn generate(
        &self,
        input_file: &Path,
        output_dir: &Path,
        options: &JobOptions,
    ) -> PipelineResult<Vec<DerivativeImage>> {
        let input = input_file.to_path_buf();
        let output = output_dir.to_path_buf();
        let options = options.clone();

        // Decode/resize/encode is CPU-bound; keep it off the async runtime
        let task = tokio::task::spawn_blocking(move || generate_blocking(&input, &output, &options));
        task.await.map_err(|join_error| PipelineError::Generate {
            path: input_file.to_path_buf(),
            message: format!("generation task failed: {join_error}"),
        })?
    }
}

fn generate_blocking(
    input_file: &Path,
    output_dir: &Path,
    options: &JobOptions,
) -> PipelineResult<Vec<DerivativeImage>> {
    if options.skip_generation == Some(true) {
        tracing::debug!(path = %input_file.display(), "generation skipped by request");
        return Ok(Vec::new());
    }

    let source = image::open(input_file).map_err(|e| PipelineError::Decode {
        path: input_file.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::create_dir_all(output_dir).map_err(|e| PipelineError::Generate {
        path: input_file.to_path_buf(),
        message: format!("creating {}: {e}", output_dir.display()),
    })?;

    let force = options.skip_generation == Some(false);
    let stem = input_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    let source_ext = input_file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();

    let widths = match &options.widths {
        Some(widths) => widths.clone(),
        None => vec![source.width()],
    };

    let mut extensions = vec![source_ext.clone()];
    if options.webp.unwrap_or(true) && source_ext != "webp" {
        extensions.push("webp".to_string());
    }
    #[cfg(feature = "avif")]
    if options.avif.unwrap_or(true) && source_ext != "avif" {
        extensions.push("avif".to_string());
    }
    #[cfg(not(feature = "avif"))]
    if options.avif == Some(true) {
        tracing::debug!(
            path = %input_file.display(),
            "avif requested but the avif feature is not compiled in"
        );
    }

    let mut derivatives = Vec::new();
    for requested in widths {
        // Never upscale
        let width = requested.clamp(1, source.width());
        let resized = if width < source.width() {
            source.resize(width, u32::MAX, image::imageops::FilterType::Lanczos3)
        } else {
            source.clone()
        };

        for extension in &extensions {
            let dest = output_dir.join(format!("{stem}.w{width}.{extension}"));
            if !force && is_fresh(input_file, &dest) {
                tracing::debug!(path = %dest.display(), "derivative up to date");
            } else {
                write_derivative(&resized, &dest, options.quality).map_err(|e| {
                    PipelineError::Generate {
                        path: input_file.to_path_buf(),
                        message: format!("writing {}: {e}", dest.display()),
                    }
                })?;
                tracing::debug!(path = %dest.display(), width = resized.width(), "derivative written");
            }
            derivatives.push(DerivativeImage {
                path: dest,
                width: resized.width(),
                format: format_name(extension),
            });
        }
    }

    Ok(derivatives)
}

/// True when `dest` exists and is at least as fresh as the source image.
fn is_fresh(input_file: &Path, dest: &Path) -> bool {
    let (Ok(input_meta), Ok(dest_meta)) =
        (std::fs::metadata(input_file), std::fs::metadata(dest))
    else {
        return false;
    };
    match (input_meta.modified(), dest_meta.modified()) {
        (Ok(input_time), Ok(dest_time)) => dest_time >= input_time,
        _ => false,
    }
}

fn write_derivative(
    image: &DynamicImage,
    dest: &Path,
    quality: Option<u32>,
) -> image::ImageResult<()> {
    match dest.extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => {
            let writer = BufWriter::new(File::create(dest)?);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                writer,
                quality.unwrap_or(75).clamp(1, 100) as u8,
            );
            image.write_with_encoder(encoder)
        }
        Some("webp") => {
            let writer = BufWriter::new(File::create(dest)?);
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer);
            // WebP encoding wants 8-bit RGB/RGBA
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
        #[cfg(feature = "avif")]
        Some("avif") => {
            let writer = BufWriter::new(File::create(dest)?);
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                writer,
                8,
                quality.unwrap_or(80).clamp(1, 100) as u8,
            );
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
        _ => image.save(dest),
    }
}

fn format_name(extension: &str) -> String {
    match extension {
        "jpg" | "jpeg" => "jpeg".to_string(),
        other => other.to_string(),
    }
}
