//! Report Module
//!
//! Terminal summary for a finished conversion batch.

use crate::progress::format_duration;
use console::style;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How many failed paths the summary lists before eliding the rest.
pub const FAILED_PREVIEW_LIMIT: usize = 5;

pub fn print_summary_report(
    total: usize,
    converted: usize,
    failed: &[PathBuf],
    skipped: usize,
    output_dir: &Path,
    duration: Duration,
) {
    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║          📊 Conversion Summary               ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  📁 Files:                         {:>6}    ║", total);
    println!("║  ✅ Converted:                     {:>6}    ║", converted);
    println!("║  ❌ Failed:                        {:>6}    ║", failed.len());
    if skipped > 0 {
        println!("║  ⏭️  Not started:                   {:>6}    ║", skipped);
    }
    println!(
        "║  ⏱️  Total Time:               {:>10}    ║",
        format_duration(duration)
    );
    println!("╚══════════════════════════════════════════════╝");

    if failed.is_empty() && skipped == 0 {
        println!(
            "{} All {} files converted successfully",
            style("✅").green(),
            total
        );
    } else if converted == 0 && skipped == 0 {
        println!("{} No file could be converted", style("❌").red());
    } else {
        println!(
            "{} {} of {} converted, {} failed",
            style("⚠️").yellow(),
            converted,
            total,
            failed.len()
        );
    }

    if !failed.is_empty() {
        println!("\n{} Failed files:", style("❌").red());
        for path in failed.iter().take(FAILED_PREVIEW_LIMIT) {
            println!("   {}", path.display());
        }
        if failed.len() > FAILED_PREVIEW_LIMIT {
            println!("   … and {} more", failed.len() - FAILED_PREVIEW_LIMIT);
        }
    }

    println!("\n📂 Output directory: {}", output_dir.display());
}
