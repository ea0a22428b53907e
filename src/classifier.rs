/// Extension-based classification of files into buckets.
///
/// A bucket is the lowercase extension of a file name, without the leading dot.
/// Files without an extension all land in [`NO_EXTENSION_BUCKET`].
///
/// # Examples
///
/// ```
/// use extsort::classifier::{bucket_name, NO_EXTENSION_BUCKET};
///
/// assert_eq!(bucket_name("report.PDF"), "pdf");
/// assert_eq!(bucket_name("archive.tar.gz"), "gz");
/// assert_eq!(bucket_name("Makefile"), NO_EXTENSION_BUCKET);
/// ```
use std::path::Path;

/// Bucket used for files that have no extension.
pub const NO_EXTENSION_BUCKET: &str = "no_extension";

/// Returns the bucket name for a bare file name (not a full path).
///
/// A leading dot alone does not start an extension (`.bashrc` has none), and a
/// trailing dot yields an empty extension, which maps to the sentinel bucket.
pub fn bucket_name(file_name: &str) -> String {
    match Path::new(file_name).extension() {
        Some(ext) if !ext.is_empty() => ext.to_string_lossy().to_lowercase(),
        _ => NO_EXTENSION_BUCKET.to_string(),
    }
}

/// Returns the bucket name for the final component of `path`.
pub fn bucket_for_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    bucket_name(&file_name)
}

/// Checks whether a file already sits directly inside a directory named after its bucket.
///
/// Only the immediate parent is inspected, so `root/x/txt/a.txt` counts as sorted even
/// though its bucket is not a direct child of the root.
pub fn is_already_sorted(path: &Path) -> bool {
    let Some(parent_name) = path.parent().and_then(|p| p.file_name()) else {
        return false;
    };
    parent_name.to_string_lossy() == bucket_for_path(path)
}
