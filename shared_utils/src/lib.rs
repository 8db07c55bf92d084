//! Shared Utilities for the heic2png tool
//!
//! This crate provides the plumbing the converter binary and library lean on:
//! - Recursive `.heic` discovery
//! - Progress bar with ETA
//! - Safety checks (dangerous directory detection)
//! - Summary reporting
//! - File logging setup
//! - Platform file-browser opening

pub mod common_utils;
pub mod logging;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scan;
pub mod sysopen;

pub use common_utils::{
    ensure_dir_exists, get_extension_lowercase, has_extension, home_output_dir,
    timestamped_dir_name,
};
pub use progress::{create_progress_bar, format_duration};
pub use report::print_summary_report;
pub use safety::check_dangerous_directory;
pub use scan::{collect_heic_files, HEIC_EXTENSIONS};
pub use sysopen::open_in_file_browser;
