//! Flag and config-file handling: build `PipelineOptions` and run the batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use refract_core::{
    BatchSummary, DocumentConfig, MarkdownPipeline, PipelineOptions, ResolutionConfig,
};
use serde::Deserialize;

/// Config file consulted when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "refract.toml";

/// Arguments for a batch run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Glob pattern(s) selecting the markdown documents to process
    #[arg(short, long)]
    pub files: Vec<String>,

    /// Root directory image reference paths are resolved against
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Root directory derivatives are written under (mirrors the input layout)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Default derivative width for references without a width attribute
    #[arg(long)]
    pub width: Option<u32>,

    /// Default encoder quality for references without a quality attribute
    #[arg(long)]
    pub quality: Option<u32>,

    /// Disable WebP derivatives
    #[arg(long)]
    pub no_webp: bool,

    /// Disable AVIF derivatives
    #[arg(long)]
    pub no_avif: bool,

    /// Prefix applied to reference paths before resolving against input-dir
    #[arg(long)]
    pub src_prefix: Option<String>,

    /// Front-matter key whose value is an image reference (repeatable)
    #[arg(long = "front-matter-key")]
    pub front_matter_keys: Vec<String>,

    /// Recognize raw inline <img> HTML in markdown bodies
    #[arg(long)]
    pub include_img: bool,

    /// Maximum concurrent image generations
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// TOML config file; explicit flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// On-disk configuration. Field for field the same surface as the flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    files: Vec<String>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    width: Option<u32>,
    quality: Option<u32>,
    webp: Option<bool>,
    avif: Option<bool>,
    src_prefix: Option<String>,
    front_matter_keys: Vec<String>,
    include_img: Option<bool>,
    max_concurrency: Option<usize>,
}

/// Execute a batch run.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let file = load_config(args.config.as_deref())?;
    let options = merge(args, file);

    let pipeline = MarkdownPipeline::new(options)?;
    let start = std::time::Instant::now();
    let summary = pipeline.run().await?;

    print_summary(&summary, start.elapsed());
    Ok(())
}

/// Read the config file: the explicit `--config` path must exist, the
/// default `refract.toml` is optional.
fn load_config(path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !required && !path.exists() {
        return Ok(FileConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

/// Layer explicit flags over the config file.
fn merge(args: RunArgs, file: FileConfig) -> PipelineOptions {
    let files = if args.files.is_empty() {
        file.files
    } else {
        args.files
    };
    let front_matter_keys = if args.front_matter_keys.is_empty() {
        file.front_matter_keys
    } else {
        args.front_matter_keys
    };

    let resolution = ResolutionConfig {
        input_dir: args.input_dir.or(file.input_dir).unwrap_or_default(),
        output_dir: args.output_dir.or(file.output_dir).unwrap_or_default(),
        src_prefix: args.src_prefix.or(file.src_prefix),
        width: args.width.or(file.width),
        quality: args.quality.or(file.quality),
        webp: if args.no_webp { Some(false) } else { file.webp },
        avif: if args.no_avif { Some(false) } else { file.avif },
    };

    PipelineOptions {
        files,
        include_img: args.include_img || file.include_img.unwrap_or(false),
        front_matter_keys,
        resolution: DocumentConfig::Static(resolution),
        max_concurrency: args
            .max_concurrency
            .or(file.max_concurrency)
            .unwrap_or_else(|| PipelineOptions::default().max_concurrency),
    }
}

/// Print a formatted summary after the batch run.
fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    let deduplicated = summary.jobs_submitted - summary.distinct_jobs;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Documents:    {:>8}", summary.documents);
    eprintln!("    Jobs:         {:>8}", summary.jobs_submitted);
    if deduplicated > 0 {
        eprintln!("    Deduplicated: {:>8}", deduplicated);
    }
    eprintln!("    Generated:    {:>8}", summary.distinct_jobs);
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_resolution(options: &PipelineOptions) -> ResolutionConfig {
        match &options.resolution {
            DocumentConfig::Static(config) => config.clone(),
            other => panic!("expected static resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let args = RunArgs {
            files: vec!["flag/*.md".to_string()],
            width: Some(900),
            ..Default::default()
        };
        let file = FileConfig {
            files: vec!["file/*.md".to_string()],
            width: Some(500),
            quality: Some(70),
            ..Default::default()
        };

        let options = merge(args, file);
        assert_eq!(options.files, vec!["flag/*.md".to_string()]);
        let resolution = static_resolution(&options);
        assert_eq!(resolution.width, Some(900));
        assert_eq!(resolution.quality, Some(70));
    }

    #[test]
    fn test_no_webp_flag_is_an_explicit_false() {
        let args = RunArgs {
            no_webp: true,
            ..Default::default()
        };
        let file = FileConfig {
            webp: Some(true),
            ..Default::default()
        };

        let resolution = static_resolution(&merge(args, file));
        assert_eq!(resolution.webp, Some(false));
    }

    #[test]
    fn test_unset_format_flags_stay_absent() {
        let resolution = static_resolution(&merge(RunArgs::default(), FileConfig::default()));
        assert_eq!(resolution.webp, None);
        assert_eq!(resolution.avif, None);
    }

    #[test]
    fn test_config_file_round_trip() {
        let raw = r#"
            files = ["content/**/*.md"]
            input_dir = "static"
            output_dir = "static/g"
            width = 1280
            webp = false
            front_matter_keys = ["cover", "thumbnail"]
            include_img = true
        "#;
        let file: FileConfig = toml::from_str(raw).unwrap();
        let options = merge(RunArgs::default(), file);

        assert_eq!(options.files, vec!["content/**/*.md".to_string()]);
        assert!(options.include_img);
        assert_eq!(
            options.front_matter_keys,
            vec!["cover".to_string(), "thumbnail".to_string()]
        );
        let resolution = static_resolution(&options);
        assert_eq!(resolution.input_dir, PathBuf::from("static"));
        assert_eq!(resolution.webp, Some(false));
        assert_eq!(resolution.avif, None);
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("unknown_key = 1").is_err());
    }

    #[test]
    fn test_load_config_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "files = [\"a/*.md\"]\nwidth = 640\n").unwrap();

        let file = load_config(Some(path.as_path())).unwrap();
        assert_eq!(file.files, vec!["a/*.md".to_string()]);
        assert_eq!(file.width, Some(640));
    }

    #[test]
    fn test_load_config_requires_explicit_path_to_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
