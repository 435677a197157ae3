use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use datesort_core::{ProcessOptions, TransferAction};

#[derive(Parser)]
#[command(name = "datesort", version, about = "Sort photos and videos into YYYY/MM-DD folders by capture date")]
struct Cli {
    /// Directory to read media from (searched recursively)
    input: PathBuf,

    /// Root of the dated folder tree
    output: PathBuf,

    /// Move files instead of copying them
    #[arg(long = "move")]
    move_files: bool,

    /// Log every action without touching the filesystem
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// `DATESORT_LOG` wins over the command-line verbosity.
fn init_logging(cli: &Cli) {
    let default = match (cli.quiet, cli.verbose, cli.progress) {
        (true, _, _) => "error",
        (false, 0, true) => "warn",
        (false, 0, false) => "info",
        (false, 1, _) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DATESORT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);
    let t_total = Instant::now();

    let options = ProcessOptions {
        input: cli.input,
        output: cli.output,
        action: if cli.move_files {
            TransferAction::Move
        } else {
            TransferAction::Copy
        },
        dry_run: cli.dry_run,
    };

    let bar = cli.progress.then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    });

    let summary = datesort_core::process(&options, &|stage, current, total, message| {
        if let Some(pb) = &bar {
            pb.set_length(total);
            pb.set_position(current + 1);
            pb.set_message(format!("[{}] {}", stage, message));
        }
    })?;

    if let Some(pb) = &bar {
        pb.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    eprintln!(
        "Done! {} processed, {} skipped, {} warnings, {} errors{} ({:.2}s)",
        summary.processed,
        summary.skipped,
        summary.warnings,
        summary.errors,
        if options.dry_run { " [dry run]" } else { "" },
        t_total.elapsed().as_secs_f64()
    );

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
