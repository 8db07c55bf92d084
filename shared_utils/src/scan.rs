//! File Discovery Module
//!
//! Recursive `.heic` discovery under a directory, in deterministic order.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognized as HEIC candidates (lowercase, no dot).
pub const HEIC_EXTENSIONS: &[&str] = &["heic"];

/// Collect all regular `.heic` files under `dir`, recursively.
///
/// Entries that cannot be read (permission errors, dangling links) are
/// skipped rather than aborting the scan. Results come back in lexical
/// order so repeated scans of the same tree agree.
pub fn collect_heic_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| crate::common_utils::has_extension(e.path(), HEIC_EXTENSIONS))
        .map(|e| e.path().to_path_buf())
        .collect()
}
