//! Path filtering using .gitignore-style patterns
//!
//! Architectural Principle: Service Layer - PathFilter decides which files are worth scanning
//! - Patterns are evaluated in order, a leading `!` re-includes a previously excluded path
//! - `.kimlikignore` files are discovered by walking up from each file
//! - Invalid patterns in ignore files are logged and skipped rather than failing the scan

use crate::domain::findings::{KimlikError, KimlikResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default name of per-directory ignore files
pub const DEFAULT_IGNORE_FILE: &str = ".kimlikignore";

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<FilterPattern>,
    process_ignore_files: bool,
    ignore_filename: String,
}

#[derive(Debug, Clone)]
struct FilterPattern {
    pattern: glob::Pattern,
    /// `!pattern` re-includes
    is_include: bool,
    /// Contains a slash: matched against the whole relative path
    anchored: bool,
    /// Trailing slash: matches directories, and so everything beneath them
    directory_only: bool,
}

impl FilterPattern {
    fn parse(raw: &str) -> Result<Self, glob::PatternError> {
        let (is_include, pattern_str) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };

        let directory_only = pattern_str.ends_with('/');
        let anchored = pattern_str.trim_end_matches('/').contains('/');
        let pattern =
            glob::Pattern::new(pattern_str.trim_start_matches('/').trim_end_matches('/'))?;

        Ok(Self { pattern, is_include, anchored, directory_only })
    }

    /// `relative` is the file path relative to the directory the pattern belongs to
    fn matches(&self, relative: &Path) -> bool {
        if self.directory_only {
            return relative
                .ancestors()
                .skip(1)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| self.matches_entry(dir));
        }

        self.matches_entry(relative)
    }

    fn matches_entry(&self, path: &Path) -> bool {
        if self.anchored {
            self.pattern.matches_path(path)
        } else {
            // No slash: match the file name only
            path.file_name()
                .map(|name| self.pattern.matches(&name.to_string_lossy()))
                .unwrap_or(false)
        }
    }
}

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> KimlikResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                FilterPattern::parse(raw)
                    .map_err(|e| KimlikError::pattern(format!("Invalid pattern '{raw}': {e}")))
            })
            .collect::<KimlikResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            process_ignore_files: ignore_filename.is_some(),
            ignore_filename: ignore_filename.unwrap_or_else(|| DEFAULT_IGNORE_FILE.to_string()),
        })
    }

    /// Create a default path filter that skips build output and VCS metadata
    pub fn with_defaults() -> KimlikResult<Self> {
        Self::new(default_exclusions(), Some(DEFAULT_IGNORE_FILE.to_string()))
    }

    /// Stop honoring ignore files
    pub fn without_ignore_files(mut self) -> Self {
        self.process_ignore_files = false;
        self
    }

    /// Check if a file should be scanned based on all patterns and ignore files
    ///
    /// Patterns are matched against `path` as given, minus a leading `./`.
    pub fn should_analyze<P: AsRef<Path>>(&self, path: P) -> KimlikResult<bool> {
        let path = path.as_ref();
        self.should_analyze_under(path, path.strip_prefix(".").unwrap_or(path))
    }

    /// Check a file found under a scan root, matching patterns against `relative`
    fn should_analyze_under(&self, path: &Path, relative: &Path) -> KimlikResult<bool> {
        let mut should_include = true;
        for pattern in &self.patterns {
            if pattern.matches(relative) {
                should_include = pattern.is_include;
            }
        }

        if !should_include {
            return Ok(false);
        }

        if self.process_ignore_files && self.is_ignored_by_files(path)? {
            return Ok(false);
        }

        Ok(true)
    }

    fn is_ignored_by_files(&self, path: &Path) -> KimlikResult<bool> {
        let mut current_dir = path.parent();
        let mut is_ignored = false;

        // Closer ignore files are applied last so they win
        let mut ignore_files = Vec::new();
        while let Some(dir) = current_dir {
            let ignore_file = dir.join(&self.ignore_filename);
            if ignore_file.is_file() {
                ignore_files.push((dir, ignore_file));
            }
            current_dir = dir.parent();
        }

        for (dir, ignore_file) in ignore_files.into_iter().rev() {
            let Ok(relative_path) = path.strip_prefix(dir) else {
                continue;
            };

            for pattern in self.load_ignore_file(&ignore_file)? {
                if pattern.matches(relative_path) {
                    is_ignored = !pattern.is_include;
                }
            }
        }

        Ok(is_ignored)
    }

    fn load_ignore_file(&self, path: &Path) -> KimlikResult<Vec<FilterPattern>> {
        let content = fs::read_to_string(path).map_err(|e| {
            KimlikError::config(format!("Failed to read ignore file '{}': {}", path.display(), e))
        })?;

        let mut patterns = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match FilterPattern::parse(line) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => {
                    tracing::warn!("Invalid pattern '{}' in {}: {}", line, path.display(), e);
                }
            }
        }

        Ok(patterns)
    }

    /// Get all files that should be scanned in a directory tree
    pub fn find_files<P: AsRef<Path>>(&self, root: P, follow_links: bool) -> KimlikResult<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if entry.file_type().is_file() && self.should_analyze_under(path, relative)? {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Add a pattern to the filter
    pub fn add_pattern(&mut self, pattern: &str) -> KimlikResult<()> {
        let parsed = FilterPattern::parse(pattern)
            .map_err(|e| KimlikError::pattern(format!("Invalid pattern '{pattern}': {e}")))?;
        self.patterns.push(parsed);
        Ok(())
    }
}

/// Exclusions applied when no configuration overrides them
pub fn default_exclusions() -> Vec<String> {
    [
        "**/target/**",
        "**/node_modules/**",
        "**/.git/**",
        "*.png",
        "*.jpg",
        "*.gif",
        "*.pdf",
        "*.zip",
        "*.gz",
        DEFAULT_IGNORE_FILE,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_basic_pattern_matching() -> KimlikResult<()> {
        let filter = PathFilter::new(vec!["target/**".to_string(), "*.md".to_string()], None)?;

        assert!(filter.should_analyze(Path::new("data/people.csv"))?);
        assert!(!filter.should_analyze(Path::new("target/debug/out.txt"))?);
        assert!(!filter.should_analyze(Path::new("README.md"))?);
        Ok(())
    }

    #[test]
    fn test_include_override() -> KimlikResult<()> {
        let filter = PathFilter::new(
            vec!["exports/**".to_string(), "!exports/keep/**".to_string()],
            None,
        )?;

        assert!(!filter.should_analyze(Path::new("exports/old/list.txt"))?);
        assert!(filter.should_analyze(Path::new("exports/keep/list.txt"))?);
        Ok(())
    }

    #[test]
    fn test_ignore_file() -> KimlikResult<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir_all(root.join("data"))?;
        fs::create_dir_all(root.join("archive"))?;
        fs::write(root.join(DEFAULT_IGNORE_FILE), "*.tmp\narchive/**\n!archive/current.txt\n")?;
        fs::write(root.join("data/list.txt"), "")?;
        fs::write(root.join("scratch.tmp"), "")?;
        fs::write(root.join("archive/2019.txt"), "")?;
        fs::write(root.join("archive/current.txt"), "")?;

        let filter = PathFilter::new(vec![], Some(DEFAULT_IGNORE_FILE.to_string()))?;

        assert!(filter.should_analyze(root.join("data/list.txt"))?);
        assert!(!filter.should_analyze(root.join("scratch.tmp"))?);
        assert!(!filter.should_analyze(root.join("archive/2019.txt"))?);
        assert!(filter.should_analyze(root.join("archive/current.txt"))?);

        let unfiltered = filter.without_ignore_files();
        assert!(unfiltered.should_analyze(root.join("scratch.tmp"))?);
        Ok(())
    }

    #[test]
    fn test_find_files_sorted_and_filtered() -> KimlikResult<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir_all(root.join("b"))?;
        fs::create_dir_all(root.join("target"))?;
        fs::write(root.join("b/two.txt"), "")?;
        fs::write(root.join("a.txt"), "")?;
        fs::write(root.join("target/skip.txt"), "")?;

        let filter = PathFilter::with_defaults()?;
        let files = filter.find_files(root, false)?;

        assert_eq!(files, vec![root.join("a.txt"), root.join("b/two.txt")]);
        Ok(())
    }

    #[test]
    fn test_path_patterns_are_relative_to_the_scan_root() -> KimlikResult<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir_all(root.join("exports/old"))?;
        fs::create_dir_all(root.join("archive"))?;
        fs::write(root.join("exports/a.txt"), "")?;
        fs::write(root.join("exports/old/b.txt"), "")?;
        fs::write(root.join("archive/c.txt"), "")?;
        fs::write(root.join("d.txt"), "")?;

        let filter = PathFilter::new(vec!["exports/**".to_string()], None)?;
        assert_eq!(filter.find_files(root, false)?, vec![root.join("archive/c.txt"), root.join("d.txt")]);

        let filter = PathFilter::new(vec!["archive/".to_string(), "/exports/old/".to_string()], None)?;
        assert_eq!(filter.find_files(root, false)?, vec![root.join("d.txt"), root.join("exports/a.txt")]);
        Ok(())
    }

    #[test]
    fn test_directory_patterns() -> KimlikResult<()> {
        let filter = PathFilter::new(vec!["build/".to_string()], None)?;

        assert!(!filter.should_analyze(Path::new("build/out.txt"))?);
        assert!(!filter.should_analyze(Path::new("./src/build/nested/out.txt"))?);
        assert!(filter.should_analyze(Path::new("build.txt"))?);
        Ok(())
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PathFilter::new(vec!["[invalid".to_string()], None).is_err());

        let mut filter = PathFilter::new(vec![], None).unwrap();
        assert!(filter.add_pattern("[invalid").is_err());
        assert!(filter.add_pattern("*.log").is_ok());
    }
}
