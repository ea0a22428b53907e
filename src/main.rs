use clap::Parser;
use extsort::cli::{OutputMode, run_cli_with_config};
use extsort::logging::{LogLevel, init_tracing};
use extsort::output::OutputFormatter;
use extsort::sorter::SortOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Organize files into subdirectories named after their extension"
)]
struct Args {
    /// Directory to organize
    #[arg(value_hint = clap::ValueHint::DirPath)]
    directory: PathBuf,

    /// Also organize files in subdirectories, then remove directories left empty
    #[arg(short, long)]
    recursive: bool,

    /// Show what would be moved without touching any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// TOML filter configuration (defaults to <DIRECTORY>/.extsortrc.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the run report as JSON instead of the summary table
    #[arg(long)]
    json: bool,

    /// Increase diagnostic output (-v moves, -vv skips, -vvv everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(LogLevel::from_flags(args.verbose, args.quiet)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let options = SortOptions {
        recursive: args.recursive,
        dry_run: args.dry_run,
    };
    let output = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match run_cli_with_config(options, &args.directory, args.config.as_deref(), output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
