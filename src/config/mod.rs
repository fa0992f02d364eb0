//! Configuration loading and management
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Default configurations are embedded in the domain, not infrastructure
//! - Configuration acts as a repository for path filters and scan limits

use crate::domain::findings::{KimlikError, KimlikResult};
use crate::patterns::path_filter::{default_exclusions, DEFAULT_IGNORE_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration versions this build understands
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// File names searched in the working directory when no config is given
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tc_kimlik.yaml", "tc_kimlik.yml", ".tc_kimlik.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KimlikConfig {
    /// Configuration format version
    pub version: String,
    /// Path filtering configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Limits applied while reading sources
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Path filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Include/exclude patterns (gitignore-style)
    pub patterns: Vec<String>,
    /// Optional ignore file name, empty string disables ignore files
    pub ignore_file: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self { patterns: default_exclusions(), ignore_file: Some(DEFAULT_IGNORE_FILE.to_string()) }
    }
}

/// Limits applied while reading sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Files larger than this many bytes are skipped
    pub max_file_size: Option<u64>,
    /// Follow symbolic links when walking directories
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { max_file_size: Some(16 * 1024 * 1024), follow_links: false }
    }
}

impl KimlikConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KimlikResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            KimlikError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            KimlikError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> KimlikResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| KimlikError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the first default config file present in `dir`, falling back to built-in defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> KimlikResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                tracing::debug!("Using configuration from {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }

        Ok(Self::default())
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> KimlikResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(KimlikError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {}",
                self.version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        for pattern in &self.paths.patterns {
            let raw = pattern.strip_prefix('!').unwrap_or(pattern);
            glob::Pattern::new(raw.trim_start_matches('/').trim_end_matches('/')).map_err(|e| {
                KimlikError::config(format!("Invalid path pattern '{pattern}': {e}"))
            })?;
        }

        if self.scan.max_file_size == Some(0) {
            return Err(KimlikError::config("scan.max_file_size must be greater than zero"));
        }

        Ok(())
    }

    /// Ignore file name to honor, if any
    pub fn ignore_file(&self) -> Option<String> {
        self.paths.ignore_file.clone().filter(|name| !name.is_empty())
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> KimlikResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| KimlikError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for KimlikConfig {
    fn default() -> Self {
        Self { version: "1.0".to_string(), paths: PathConfig::default(), scan: ScanConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = KimlikConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ignore_file().as_deref(), Some(DEFAULT_IGNORE_FILE));
    }

    #[test]
    fn test_yaml_round_trip() -> KimlikResult<()> {
        let config = KimlikConfig::default();
        let yaml = config.to_yaml()?;
        let loaded = KimlikConfig::load_from_str(&yaml)?;

        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.paths.patterns, config.paths.patterns);
        assert_eq!(loaded.scan.max_file_size, config.scan.max_file_size);
        Ok(())
    }

    #[test]
    fn test_minimal_config_uses_defaults() -> KimlikResult<()> {
        let config = KimlikConfig::load_from_str("version: \"1.0\"\n")?;

        assert_eq!(config.paths.patterns, default_exclusions());
        assert!(!config.scan.follow_links);
        Ok(())
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(KimlikConfig::load_from_str("version: \"2.0\"\n").is_err());
        assert!(KimlikConfig::load_from_str(
            "version: \"1.0\"\npaths:\n  patterns: [\"[oops\"]\n  ignore_file: null\n"
        )
        .is_err());
        assert!(KimlikConfig::load_from_str(
            "version: \"1.0\"\nscan:\n  max_file_size: 0\n"
        )
        .is_err());
        assert!(KimlikConfig::load_from_str("not: [valid").is_err());
    }

    #[test]
    fn test_empty_ignore_file_disables_ignore_files() -> KimlikResult<()> {
        let config = KimlikConfig::load_from_str(
            "version: \"1.0\"\npaths:\n  patterns: []\n  ignore_file: \"\"\n",
        )?;
        assert_eq!(config.ignore_file(), None);
        Ok(())
    }

    #[test]
    fn test_discover() -> KimlikResult<()> {
        let temp_dir = TempDir::new()?;
        assert_eq!(KimlikConfig::discover(temp_dir.path())?.paths.patterns, default_exclusions());

        fs::write(
            temp_dir.path().join("tc_kimlik.yml"),
            "version: \"1.0\"\npaths:\n  patterns: [\"*.log\"]\n  ignore_file: null\n",
        )?;
        let config = KimlikConfig::discover(temp_dir.path())?;
        assert_eq!(config.paths.patterns, vec!["*.log".to_string()]);
        assert_eq!(config.ignore_file(), None);
        Ok(())
    }
}
