//! Command-line orchestration for extsort.
//!
//! This module glues the pieces together for the binary:
//! - Root validation
//! - Filter configuration loading
//! - Running the sorter with a progress bar
//! - Rendering the report (human-readable or JSON)

use crate::config::FilterConfig;
use crate::output::OutputFormatter;
use crate::sorter::{ExtensionSorter, SortOptions, SortReport, validate_root};
use std::path::Path;

/// How the result of a run is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Colored progress and summary table.
    #[default]
    Human,
    /// The full report as pretty-printed JSON on stdout.
    Json,
}

/// Organizes `dir_path` with the configuration found in that directory, if any.
///
/// # Examples
///
/// ```no_run
/// use extsort::cli::run_cli;
/// use extsort::sorter::SortOptions;
/// use std::path::Path;
///
/// let options = SortOptions { recursive: false, dry_run: true };
/// match run_cli(options, Path::new("/path/to/directory")) {
///     Ok(report) => println!("{} files would move", report.moved.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(options: SortOptions, dir_path: &Path) -> Result<SortReport, String> {
    run_cli_with_config(options, dir_path, None, OutputMode::Human)
}

/// Organizes `dir_path` with an optional explicit configuration file.
///
/// Returns an error only when the directory is invalid or the configuration cannot
/// be loaded; nothing has been touched in that case. Files that fail to move are
/// listed in the returned report.
pub fn run_cli_with_config(
    options: SortOptions,
    dir_path: &Path,
    config_path: Option<&Path>,
    output: OutputMode,
) -> Result<SortReport, String> {
    validate_root(dir_path).map_err(|e| e.to_string())?;

    let filters = FilterConfig::load(config_path, dir_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let sorter = ExtensionSorter::new(dir_path, options).with_filters(filters);

    match output {
        OutputMode::Human => organize_with_summary(&sorter, options, dir_path),
        OutputMode::Json => {
            let report = sorter.organize().map_err(|e| e.to_string())?;
            println!("{}", render_json(&report)?);
            Ok(report)
        }
    }
}

fn organize_with_summary(
    sorter: &ExtensionSorter,
    options: SortOptions,
    dir_path: &Path,
) -> Result<SortReport, String> {
    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir_path.display()));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", dir_path.display()));
    }

    let progress = OutputFormatter::create_progress_bar(0);
    let report = sorter
        .organize_with_progress(&progress)
        .map_err(|e| e.to_string())?;
    progress.finish_and_clear();

    print_summary(&report, dir_path);
    Ok(report)
}

fn print_summary(report: &SortReport, dir_path: &Path) {
    if report.moved.is_empty() {
        OutputFormatter::plain("No files to organize.");
    } else {
        if report.dry_run {
            OutputFormatter::header("Files would be organized as follows:");
            for moved in &report.moved {
                let from = moved
                    .original_path
                    .strip_prefix(dir_path)
                    .unwrap_or(moved.original_path.as_path());
                let to = moved.new_path.strip_prefix(dir_path).unwrap_or(moved.new_path.as_path());
                OutputFormatter::plain(&format!(" - {} → {}", from.display(), to.display()));
            }
        }
        OutputFormatter::summary_table(&report.bucket_counts(), report.moved.len());
    }

    if report.already_sorted > 0 {
        OutputFormatter::plain(&format!("Already sorted: {}", report.already_sorted));
    }
    if report.excluded > 0 {
        OutputFormatter::plain(&format!("Excluded by filters: {}", report.excluded));
    }

    if !report.removed_dirs.is_empty() {
        OutputFormatter::header("Removed empty directories:");
        for dir in &report.removed_dirs {
            OutputFormatter::plain(&format!(" - {}", dir.display()));
        }
    }

    if !report.is_complete_success() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized and were left in place:",
            report.failures.len()
        ));
        for failure in &report.failures {
            OutputFormatter::error(&format!("{}: {}", failure.path.display(), failure.reason));
        }
    }

    if report.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
        OutputFormatter::plain(&format!(
            "Run 'extsort {}' (without --dry-run) to execute the organization.",
            dir_path.display()
        ));
    } else {
        OutputFormatter::success("Organization complete!");
    }
}

/// Serializes a report for `--json` output.
pub fn render_json(report: &SortReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|e| format!("JSON serialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::MovedFile;
    use serde_json::Value;
    use std::path::PathBuf;

    #[test]
    fn test_render_json_contains_moves() {
        let report = SortReport {
            moved: vec![MovedFile {
                original_path: PathBuf::from("/data/a.TXT"),
                new_path: PathBuf::from("/data/txt/a.TXT"),
                bucket: "txt".to_string(),
            }],
            already_sorted: 2,
            ..Default::default()
        };

        let json: Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        assert_eq!(json["dry_run"], Value::Bool(false));
        assert_eq!(json["already_sorted"], 2);
        assert_eq!(json["moved"][0]["bucket"], "txt");
        assert_eq!(json["moved"][0]["new_path"], "/data/txt/a.TXT");
        assert!(json["failures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_output_mode_defaults_to_human() {
        assert_eq!(OutputMode::default(), OutputMode::Human);
    }
}
