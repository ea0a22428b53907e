//! Directory traversal that sorts every eligible file into its extension bucket.
//!
//! A run goes through these phases in order:
//! 1. Validate the root directory
//! 2. Enumerate candidate files (direct children, or the whole tree when recursive)
//! 3. Filter out non-files, excluded files and files already in their bucket
//! 4. Classify and move each remaining file
//! 5. Remove directories left empty (recursive runs only)
//!
//! A failure on one file is recorded in the [`SortReport`] and logged; it never
//! stops the run. Only an invalid root aborts, before anything is touched.

use crate::classifier::{bucket_for_path, is_already_sorted};
use crate::config::CompiledFilters;
use crate::file_organizer::{FileOrganizer, MovedFile, SortError, SortResult};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Options controlling a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// Organize the whole subtree instead of only the direct children of the root.
    pub recursive: bool,
    /// Plan the moves without touching the filesystem.
    pub dry_run: bool,
}

/// A file that could not be organized, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a run.
#[derive(Debug, Default, Serialize)]
pub struct SortReport {
    /// True if nothing was changed on disk.
    pub dry_run: bool,
    /// Files moved (or planned to be moved, in dry-run mode), in processing order.
    pub moved: Vec<MovedFile>,
    /// Files skipped because they already sit in their bucket directory.
    pub already_sorted: usize,
    /// Files skipped by the filter configuration.
    pub excluded: usize,
    /// Files that could not be organized. They were left where they were.
    pub failures: Vec<FileFailure>,
    /// Directories removed because they were empty after the moves.
    pub removed_dirs: Vec<PathBuf>,
}

impl SortReport {
    /// Number of moved files per bucket, sorted by bucket name.
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for moved in &self.moved {
            *counts.entry(moved.bucket.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Returns true if every candidate file was organized.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Checks that `root` exists and is a directory.
///
/// # Errors
///
/// `InvalidRootPath` if the path cannot be inspected, `NotADirectory` otherwise.
pub fn validate_root(root: &Path) -> SortResult<()> {
    let metadata = fs::metadata(root).map_err(|e| SortError::InvalidRootPath {
        path: root.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(SortError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Sorts the files below a root directory into extension buckets.
///
/// # Examples
///
/// ```no_run
/// use extsort::sorter::{ExtensionSorter, SortOptions};
/// use std::path::Path;
///
/// let options = SortOptions { recursive: true, dry_run: false };
/// let report = ExtensionSorter::new(Path::new("/path/to/downloads"), options).organize()?;
/// println!("Moved {} files", report.moved.len());
/// # Ok::<(), extsort::SortError>(())
/// ```
pub struct ExtensionSorter {
    root: PathBuf,
    options: SortOptions,
    filters: CompiledFilters,
}

impl ExtensionSorter {
    /// Creates a sorter for `root` with the default (include everything) filters.
    pub fn new(root: &Path, options: SortOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            filters: CompiledFilters::default(),
        }
    }

    /// Replaces the filters applied to candidate files.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Runs the sort without progress reporting.
    pub fn organize(&self) -> SortResult<SortReport> {
        self.organize_with_progress(&ProgressBar::hidden())
    }

    /// Runs the sort, advancing `progress` once per candidate file.
    ///
    /// # Errors
    ///
    /// Only an invalid root is returned as an error. Per-file failures end up in
    /// [`SortReport::failures`].
    pub fn organize_with_progress(&self, progress: &ProgressBar) -> SortResult<SortReport> {
        validate_root(&self.root)?;

        let mut report = SortReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let candidates = self.collect_candidates(progress, &mut report);
        progress.set_length(candidates.len() as u64);

        // Destinations claimed by earlier planned moves; only used in dry-run mode.
        let mut planned: HashSet<PathBuf> = HashSet::new();

        for path in candidates {
            self.process_file(&path, progress, &mut planned, &mut report);
            progress.inc(1);
        }

        if self.options.recursive && !self.options.dry_run {
            report.removed_dirs = remove_empty_dirs(&self.root);
        }

        Ok(report)
    }

    /// Lists every file entry to examine, before anything is moved.
    fn collect_candidates(&self, progress: &ProgressBar, report: &mut SortReport) -> Vec<PathBuf> {
        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {}
                Ok(entry) => candidates.push(entry.into_path()),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    progress.suspend(|| {
                        error!(path = %path.display(), error = %e, "cannot read directory entry");
                    });
                    report.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        candidates
    }

    fn process_file(
        &self,
        path: &Path,
        progress: &ProgressBar,
        planned: &mut HashSet<PathBuf>,
        report: &mut SortReport,
    ) {
        // Re-check at examination time: symlinks count only if they resolve to a file.
        if !fs::metadata(path).is_ok_and(|m| m.is_file()) {
            debug!(path = %path.display(), "not a regular file, skipping");
            return;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if self.filters.is_config_file(path) || !self.filters.should_include(relative) {
            debug!(path = %path.display(), "excluded by filters");
            report.excluded += 1;
            return;
        }

        if is_already_sorted(path) {
            debug!(path = %path.display(), "already in its bucket, skipping");
            report.already_sorted += 1;
            return;
        }

        let bucket = bucket_for_path(path);
        let outcome = if self.options.dry_run {
            self.plan_move(path, &bucket, planned)
        } else {
            FileOrganizer::ensure_bucket_dir(&self.root, &bucket)
                .and_then(|bucket_dir| FileOrganizer::move_into(path, &bucket_dir, &bucket))
        };

        match outcome {
            Ok(moved) => {
                progress.suspend(|| {
                    info!(
                        src = %moved.original_path.display(),
                        dest = %moved.new_path.display(),
                        dry_run = self.options.dry_run,
                        "moved file"
                    );
                });
                progress.set_message(bucket);
                report.moved.push(moved);
            }
            Err(e) => {
                progress.suspend(|| {
                    error!(path = %path.display(), error = %e, "could not organize file");
                });
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Computes where a file would go without creating or moving anything.
    ///
    /// Fails wherever the real move would fail to get its bucket directory.
    fn plan_move(
        &self,
        path: &Path,
        bucket: &str,
        planned: &mut HashSet<PathBuf>,
    ) -> SortResult<MovedFile> {
        let file_name = path.file_name().ok_or_else(|| SortError::MissingFileName {
            path: path.to_path_buf(),
        })?;
        let bucket_dir = FileOrganizer::check_bucket_dir(&self.root, bucket)?;
        let destination =
            FileOrganizer::unique_destination(&bucket_dir, file_name, |p| planned.contains(p));
        planned.insert(destination.clone());

        Ok(MovedFile {
            original_path: path.to_path_buf(),
            new_path: destination,
            bucket: bucket.to_string(),
        })
    }
}

/// Removes every directory below `root` that is empty, children before parents.
///
/// Directories that still hold entries cannot be removed; that is expected and
/// not reported. The root itself is kept.
fn remove_empty_dirs(root: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        let dir = entry.path();
        match fs::remove_dir(dir) {
            Ok(()) => {
                info!(path = %dir.display(), "removed empty directory");
                removed.push(dir.to_path_buf());
            }
            Err(e) => debug!(path = %dir.display(), error = %e, "directory kept"),
        }
    }

    removed
}
