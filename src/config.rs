//! File filtering configuration.
//!
//! Filters decide which candidate files are left alone during a run. They are
//! loaded from an optional TOML file and support several strategies:
//! - Exact filename matching
//! - Glob pattern matching (against the path relative to the organized root)
//! - File extension matching
//! - Regex pattern matching (against the file name)
//! - Include (whitelist) rules that override exclude rules
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part", "node_modules/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! With no configuration every regular file is organized, hidden files included.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the configuration file looked up inside the organized directory.
pub const LOCAL_CONFIG_FILE: &str = ".extsortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Configuration for file filtering rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,

    /// File this configuration was read from, if any. It is never organized itself.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to organize hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

fn default_enable_hidden_files() -> bool {
    true
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, compared case-insensitively (e.g., "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns to exclude, matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    /// Load configuration for organizing `root`, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.extsortrc.toml` inside `root`
    /// 3. Fall back to the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be
    /// read, or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = root.join(LOCAL_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "loaded filter configuration");
        Ok(config)
    }

    /// Compile configuration into filter structures ready for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters, self.source)
    }
}

/// Pre-compiled filter rules.
///
/// Glob and regex patterns are parsed once so that matching a file does not
/// reparse any rule.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    config_source: Option<PathBuf>,
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
            config_source: None,
        }
    }
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    fn new(rules: FilterRules, source: Option<PathBuf>) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
            config_source: source.map(|p| fs::canonicalize(&p).unwrap_or(p)),
        })
    }

    /// Returns true if `file_path` is the configuration file these filters came from.
    pub fn is_config_file(&self, file_path: &Path) -> bool {
        let Some(source) = &self.config_source else {
            return false;
        };
        if source.file_name() != file_path.file_name() {
            return false;
        }
        fs::canonicalize(file_path).is_ok_and(|p| &p == source)
    }

    /// Check if a file should be organized (not excluded).
    ///
    /// `relative_path` is the path of the file relative to the organized root.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if matches_any(&self.include_patterns, relative_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if matches_any(&self.exclude_patterns, relative_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn compiled(exclude: ExcludeRules, include: IncludeRules, hidden: bool) -> CompiledFilters {
        FilterConfig {
            filters: FilterRules {
                enable_hidden_files: hidden,
                exclude,
                include,
            },
            source: None,
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_default_config_includes_everything() {
        let filters = FilterConfig::default().compile().unwrap();

        assert!(filters.should_include(Path::new(".bashrc")));
        assert!(filters.should_include(Path::new("notes")));
        assert!(filters.should_include(Path::new("deep/dir/report.pdf")));
    }

    #[test]
    fn test_hidden_files_excluded_when_disabled() {
        let filters = compiled(ExcludeRules::default(), IncludeRules::default(), false);

        assert!(!filters.should_include(Path::new(".DS_Store")));
        assert!(!filters.should_include(Path::new("sub/.gitignore")));
        assert!(filters.should_include(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let filters = compiled(
            ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
            true,
        );

        assert!(!filters.should_include(Path::new("Thumbs.db")));
        assert!(!filters.should_include(Path::new("photos/Thumbs.db")));
        assert!(filters.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let filters = compiled(
            ExcludeRules {
                extensions: vec!["bak".to_string(), ".TMP".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
            true,
        );

        assert!(!filters.should_include(Path::new("file.bak")));
        assert!(!filters.should_include(Path::new("file.BAK")));
        assert!(!filters.should_include(Path::new("file.tmp")));
        assert!(filters.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns_on_relative_path() {
        let filters = compiled(
            ExcludeRules {
                patterns: vec!["*.part".to_string(), "**/node_modules/**".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
            true,
        );

        assert!(!filters.should_include(Path::new("movie.part")));
        assert!(!filters.should_include(Path::new("node_modules/pkg/index.js")));
        assert!(!filters.should_include(Path::new("web/node_modules/pkg/index.js")));
        assert!(filters.should_include(Path::new("my_node_modules/index.js")));
    }

    #[test]
    fn test_exclude_regex_on_file_name() {
        let filters = compiled(
            ExcludeRules {
                regex: vec![r"^~\$".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
            true,
        );

        assert!(!filters.should_include(Path::new("~$report.docx")));
        assert!(filters.should_include(Path::new("report.docx")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let filters = compiled(
            ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            IncludeRules {
                patterns: vec!["keep.log".to_string()],
            },
            true,
        );

        assert!(filters.should_include(Path::new("keep.log")));
        assert!(!filters.should_include(Path::new("other.log")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = FilterConfig {
            filters: FilterRules {
                exclude: ExcludeRules {
                    regex: vec!["[invalid(".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            source: None,
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = FilterConfig {
            filters: FilterRules {
                exclude: ExcludeRules {
                    patterns: vec!["[invalid".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            source: None,
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_load_without_any_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let config = FilterConfig::load(None, temp_dir.path()).expect("load failed");

        assert!(config.source.is_none());
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_load_local_config_from_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(
            &path,
            "[filters]\nenable_hidden_files = false\n[filters.exclude]\nextensions = [\"tmp\"]\n",
        )
        .expect("Failed to write config");

        let config = FilterConfig::load(None, temp_dir.path()).expect("load failed");

        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert!(!config.filters.enable_hidden_files);
        assert_eq!(config.filters.exclude.extensions, vec!["tmp".to_string()]);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope.toml");

        let result = FilterConfig::load(Some(&missing), temp_dir.path());
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[filters\nbroken").expect("Failed to write config");

        let result = FilterConfig::load(Some(&path), temp_dir.path());
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_is_config_file_matches_loaded_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&path, "").expect("Failed to write config");
        let other = temp_dir.path().join("other.toml");
        fs::write(&other, "").expect("Failed to write file");

        let filters = FilterConfig::load(None, temp_dir.path())
            .expect("load failed")
            .compile()
            .expect("compile failed");

        assert!(filters.is_config_file(&path));
        assert!(!filters.is_config_file(&other));
        assert!(!CompiledFilters::default().is_config_file(&path));
    }
}
