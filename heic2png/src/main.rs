use clap::{Parser, Subcommand, ValueEnum};
use heic2png::{CancelToken, Engine, FileSet};
use serde_json::json;
use shared_utils::{
    check_dangerous_directory, create_progress_bar, ensure_dir_exists, home_output_dir,
    open_in_file_browser, print_summary_report,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "heic2png")]
#[command(version, about = "Batch HEIC → PNG converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the HEIC files a run would pick up, without converting.
    Scan {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Convert HEIC files and/or directories of them to PNG.
    Run {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory; created if missing.
        /// Default: heic2png_<timestamp> under your home directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop these paths from the set before converting.
        #[arg(long, value_name = "PATH")]
        exclude: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value = "human")]
        report: ReportFormat,

        /// Do not open the output folder when the batch finishes.
        #[arg(long)]
        no_open: bool,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Human,
    Json,
}

fn main() -> anyhow::Result<()> {
    let _ = shared_utils::logging::init_logging(
        "heic2png",
        shared_utils::logging::LogConfig::default(),
    );

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { inputs } => scan(&inputs),
        Commands::Run {
            inputs,
            output,
            exclude,
            report,
            no_open,
            verbose,
        } => run(&inputs, output, &exclude, report, no_open, verbose),
    }
}

fn scan(inputs: &[PathBuf]) -> anyhow::Result<()> {
    let mut set = FileSet::new();
    set.add(inputs);

    for path in set.iter() {
        println!("{}", path.display());
    }
    println!("📂 {} HEIC file(s) found", set.len());

    Ok(())
}

fn run(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    exclude: &[PathBuf],
    report_format: ReportFormat,
    no_open: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut set = FileSet::new();
    let added = set.add(inputs);

    if !exclude.is_empty() {
        let doomed: HashSet<PathBuf> = exclude.iter().cloned().collect();
        set.remove(&doomed);
    }

    if set.is_empty() {
        eprintln!("❌ Error: no HEIC files found in the given inputs");
        std::process::exit(1);
    }
    if verbose {
        println!("📂 Found {} files to process ({} added this run)", set.len(), added);
    }

    let output_dir = output.unwrap_or_else(|| home_output_dir("heic2png"));
    if let Err(e) = check_dangerous_directory(&output_dir) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    ensure_dir_exists(&output_dir)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    let ctrlc_result = ctrlc::set_handler(move || {
        eprintln!("\n🛑 Cancelling... jobs already running will finish");
        handler_token.cancel();
    });
    if verbose {
        if let Err(e) = &ctrlc_result {
            eprintln!("⚠️  Could not install Ctrl-C handler: {}", e);
        }
        println!(
            "🔧 Worker pool: {} threads (CPU cores: {})",
            heic2png::concurrency_degree(),
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        );
    }

    let total = set.len();
    let pb = create_progress_bar(total as u64, "Converting");
    let start_time = Instant::now();

    let engine = Engine::new();
    let outcome = engine.run_batch(
        set.paths(),
        &output_dir,
        &|done, _total| pb.set_position(done as u64),
        &cancel,
    )?;

    if outcome.was_cancelled() {
        pb.abandon_with_message("Cancelled");
    } else {
        pb.finish_with_message("Complete!");
    }

    let report = outcome.report();
    match report_format {
        ReportFormat::Json => {
            let mut value = serde_json::to_value(report)?;
            value["cancelled"] = json!(outcome.was_cancelled());
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ReportFormat::Human => {
            print_summary_report(
                report.total,
                report.converted,
                &report.failed,
                report.not_started,
                &output_dir,
                start_time.elapsed(),
            );
            if outcome.was_cancelled() {
                println!("🛑 Batch cancelled before all jobs started");
            }
        }
    }

    // Best effort; a failed open never becomes a batch error.
    if !no_open && !outcome.was_cancelled() && report_format == ReportFormat::Human {
        open_in_file_browser(&output_dir);
    }

    if report.converted < report.total {
        std::process::exit(1);
    }
    Ok(())
}
