//! extsort - sort the files of a directory into per-extension subdirectories
//!
//! Every file is classified by its lowercase extension and moved into a bucket
//! directory of that name directly under the organized root, never overwriting
//! an existing file. Runs can be flat or recursive (with empty directories pruned
//! afterwards), are safe to repeat, and can be filtered through a TOML file.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod sorter;

pub use classifier::{NO_EXTENSION_BUCKET, bucket_name};
pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use file_organizer::{FileOrganizer, MovedFile, SortError, SortResult};
pub use logging::{LogLevel, init_tracing};
pub use sorter::{ExtensionSorter, SortOptions, SortReport};

pub use cli::{OutputMode, run_cli, run_cli_with_config};
