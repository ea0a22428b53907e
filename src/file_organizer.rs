/// Moving files into extension bucket directories.
///
/// This module resolves (and lazily creates) the bucket directory for a file,
/// picks a destination name that never collides with an existing entry, and
/// relocates the file so that it is always in exactly one place afterwards.
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Records a single file relocation.
///
/// In dry-run mode the same struct describes the move that would have happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    /// The path of the file before organization.
    pub original_path: PathBuf,
    /// The path of the file inside its bucket directory.
    pub new_path: PathBuf,
    /// The bucket the file was moved to.
    pub bucket: String,
}

/// Errors that can occur while organizing files.
#[derive(Debug, Error)]
pub enum SortError {
    /// The root directory does not exist or cannot be inspected.
    #[error("Invalid root path {}: {source}", .path.display())]
    InvalidRootPath { path: PathBuf, source: io::Error },

    /// The root path exists but is not a directory.
    #[error("Provided path '{}' is not a valid directory", .path.display())]
    NotADirectory { path: PathBuf },

    /// Failed to create a bucket directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to move a file into its bucket directory.
    #[error("Failed to move {} to {}: {source}", .source_path.display(), .destination.display())]
    FileMoveFailure {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },

    /// The path has no final name component to move.
    #[error("Path {} has no file name component", .path.display())]
    MissingFileName { path: PathBuf },
}

/// Result type for file organization operations.
pub type SortResult<T> = Result<T, SortError>;

/// Creates bucket directories and moves files into them.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Returns the path of the bucket directory under `root`, creating it if absent.
    ///
    /// Calling this repeatedly for the same bucket is fine. An existing entry of the
    /// same name that is not a directory is reported as `DirectoryCreationFailed`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let dir = FileOrganizer::ensure_bucket_dir(Path::new("/path/to/root"), "pdf")?;
    /// assert!(dir.ends_with("pdf"));
    /// # Ok::<(), extsort::SortError>(())
    /// ```
    pub fn ensure_bucket_dir(root: &Path, bucket: &str) -> SortResult<PathBuf> {
        let bucket_dir = root.join(bucket);

        match fs::create_dir(&bucket_dir) {
            Ok(()) => {
                debug!(path = %bucket_dir.display(), "created bucket directory");
                Ok(bucket_dir)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Self::check_bucket_dir(root, bucket),
            Err(e) => Err(SortError::DirectoryCreationFailed {
                path: bucket_dir,
                source: e,
            }),
        }
    }

    /// Returns the bucket directory path without creating anything.
    ///
    /// Fails the same way as [`FileOrganizer::ensure_bucket_dir`] when a
    /// non-directory entry already occupies the name.
    pub fn check_bucket_dir(root: &Path, bucket: &str) -> SortResult<PathBuf> {
        let bucket_dir = root.join(bucket);
        if entry_exists(&bucket_dir) && !bucket_dir.is_dir() {
            return Err(SortError::DirectoryCreationFailed {
                path: bucket_dir,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a non-directory entry with this name already exists",
                ),
            });
        }
        Ok(bucket_dir)
    }

    /// Picks a free destination path for `file_name` inside `dir`.
    ///
    /// The plain name is tried first, then `stem_1.ext`, `stem_2.ext`, and so on.
    /// A candidate is rejected when any entry already exists at that path (dangling
    /// symlinks included) or when `is_taken` reports it as reserved.
    ///
    /// Example: `report.txt` becomes `report_1.txt`, `notes` becomes `notes_1`,
    /// `notes.` becomes `notes._1`.
    pub fn unique_destination<F>(dir: &Path, file_name: &OsStr, is_taken: F) -> PathBuf
    where
        F: Fn(&Path) -> bool,
    {
        let occupied = |candidate: &Path| entry_exists(candidate) || is_taken(candidate);

        let candidate = dir.join(file_name);
        if !occupied(candidate.as_path()) {
            return candidate;
        }

        // An empty extension (`notes.`) counts as none, so the suffix goes at the end.
        let name = Path::new(file_name);
        let extension = name.extension().filter(|ext| !ext.is_empty());
        let stem: OsString = match (extension, name.file_stem()) {
            (Some(_), Some(stem)) => stem.to_os_string(),
            _ => file_name.to_os_string(),
        };

        let mut counter: u64 = 1;
        loop {
            let candidate = dir.join(suffixed_name(&stem, extension, counter));
            if !occupied(candidate.as_path()) {
                trace!(path = %candidate.display(), counter, "resolved name collision");
                return candidate;
            }
            counter += 1;
        }
    }

    /// Moves `file_path` into `bucket_dir` under a collision-free name.
    ///
    /// On failure the file is left at its original location.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let moved = FileOrganizer::move_into(
    ///     Path::new("/path/to/root/report.txt"),
    ///     Path::new("/path/to/root/txt"),
    ///     "txt",
    /// )?;
    /// println!("Moved to {}", moved.new_path.display());
    /// # Ok::<(), extsort::SortError>(())
    /// ```
    pub fn move_into(file_path: &Path, bucket_dir: &Path, bucket: &str) -> SortResult<MovedFile> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| SortError::MissingFileName {
                path: file_path.to_path_buf(),
            })?;

        let destination = Self::unique_destination(bucket_dir, file_name, |_| false);

        relocate(file_path, &destination).map_err(|e| SortError::FileMoveFailure {
            source_path: file_path.to_path_buf(),
            destination: destination.clone(),
            source: e,
        })?;

        Ok(MovedFile {
            original_path: file_path.to_path_buf(),
            new_path: destination,
            bucket: bucket.to_string(),
        })
    }
}

/// Builds `stem_N.ext`, or `stem_N` when there is no extension.
fn suffixed_name(stem: &OsStr, extension: Option<&OsStr>, counter: u64) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}", counter));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Renames `from` to `to`, copying across devices when a rename is not possible.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(src = %from.display(), dest = %to.display(), "rename crosses devices, copying");
            copy_then_remove(from, to)
        }
        Err(e) => Err(e),
    }
}

/// Copies `from` to `to` and removes `from`, undoing the copy if either step fails.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}
