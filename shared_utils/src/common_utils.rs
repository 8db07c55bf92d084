//! Common Utilities Module
//!
//! Small helpers shared between the converter library and the binary:
//! - Extension handling
//! - Directory creation with context
//! - Default output directory naming

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Extract the file extension, lowercased. Empty string when absent.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::get_extension_lowercase;
///
/// assert_eq!(get_extension_lowercase(Path::new("photo.HEIC")), "heic");
/// assert_eq!(get_extension_lowercase(Path::new("noext")), "");
/// ```
pub fn get_extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Check whether the file extension is in `extensions` (case-insensitive).
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::has_extension;
///
/// assert!(has_extension(Path::new("IMG_0001.HEIC"), &["heic"]));
/// assert!(!has_extension(Path::new("IMG_0001.jpg"), &["heic"]));
/// ```
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = get_extension_lowercase(path);
    extensions.contains(&ext.as_str())
}

/// Create a directory (including parents) if it does not exist yet.
pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Build a timestamped directory name: `<prefix>_<YYYYMMDD>_<HHMMSS>`.
pub fn timestamped_dir_name(prefix: &str) -> String {
    format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Default output directory: a timestamped folder under the user's home.
///
/// Falls back to the current directory when no home directory can be
/// resolved (e.g. stripped-down containers).
pub fn home_output_dir(prefix: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(timestamped_dir_name(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension_lowercase() {
        assert_eq!(get_extension_lowercase(Path::new("a.HEIC")), "heic");
        assert_eq!(get_extension_lowercase(Path::new("a.heic")), "heic");
        assert_eq!(get_extension_lowercase(Path::new("a.png")), "png");
        assert_eq!(get_extension_lowercase(Path::new("a")), "");
        assert_eq!(get_extension_lowercase(Path::new(".hidden")), "");
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("x.heic"), &["heic"]));
        assert!(has_extension(Path::new("x.HeIc"), &["heic"]));
        assert!(!has_extension(Path::new("x.heif"), &["heic"]));
        assert!(!has_extension(Path::new("heic"), &["heic"]));
    }

    #[test]
    fn test_timestamped_dir_name_shape() {
        let name = timestamped_dir_name("heic2png");
        assert!(name.starts_with("heic2png_"));
        // heic2png_YYYYMMDD_HHMMSS
        assert_eq!(name.len(), "heic2png".len() + 1 + 8 + 1 + 6);
    }

    #[test]
    fn test_ensure_dir_exists_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        // idempotent
        ensure_dir_exists(&nested).unwrap();
    }
}
