//! Platform file-browser opening.
//!
//! Best effort only: a failure to open the folder is logged and swallowed,
//! it never becomes a batch error.

use std::path::Path;
use std::process::Command;
use tracing::warn;

#[cfg(target_os = "macos")]
const OPEN_COMMAND: &str = "open";
#[cfg(target_os = "windows")]
const OPEN_COMMAND: &str = "explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPEN_COMMAND: &str = "xdg-open";

/// Reveal `dir` in the platform file browser.
///
/// Returns whether the spawn succeeded; callers are expected to ignore it.
pub fn open_in_file_browser(dir: &Path) -> bool {
    match Command::new(OPEN_COMMAND).arg(dir).spawn() {
        Ok(_) => true,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not open output folder");
            false
        }
    }
}
