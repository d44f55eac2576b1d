//! Reference path normalization and job path mapping.

use std::path::{Path, PathBuf};

/// Apply the configured source prefix to a raw reference path.
///
/// A set, non-empty prefix is normalized to end with exactly one `/` before
/// concatenation (idempotent when the prefix already carries one); otherwise
/// the raw path is returned unchanged.
pub fn apply_prefix(raw: &str, src_prefix: Option<&str>) -> String {
    match src_prefix {
        Some(prefix) if !prefix.is_empty() => {
            if prefix.ends_with('/') {
                format!("{prefix}{raw}")
            } else {
                format!("{prefix}/{raw}")
            }
        }
        _ => raw.to_string(),
    }
}

/// Map an effective reference path to the job's input file and output
/// directory.
///
/// The output directory mirrors the reference's relative directory under the
/// output root; the filename is not appended — the generator derives
/// derivative filenames itself.
pub fn job_paths(effective: &str, input_dir: &Path, output_dir: &Path) -> (PathBuf, PathBuf) {
    let input_file = input_dir.join(effective);
    let relative_dir = Path::new(effective)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty());
    let output_dir = match relative_dir {
        Some(dir) => output_dir.join(dir),
        None => output_dir.to_path_buf(),
    };
    (input_file, output_dir)
}
