//! Refract CLI - scans markdown documents and pre-generates image derivatives.
//!
//! Refract finds image references in markdown bodies and front matter,
//! resolves per-reference width/quality/format options, and generates
//! resized derivatives once per distinct job, no matter how many documents
//! share a reference.
//!
//! # Usage
//!
//! ```bash
//! # Process a content tree
//! refract --files 'content/**/*.md' --input-dir static --output-dir static/g
//!
//! # Front-matter cover images, with a document-level default width
//! refract --files 'posts/*.md' --input-dir static --output-dir static/g \
//!     --front-matter-key cover --width 1280
//!
//! # Everything from a config file
//! refract --config refract.toml
//! ```

use clap::Parser;

mod cli;
mod logging;

/// Refract - markdown image derivative pipeline.
#[derive(Parser, Debug)]
#[command(name = "refract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    run: cli::RunArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    tracing::debug!("Refract v{}", refract_core::VERSION);

    cli::execute(cli.run).await
}
