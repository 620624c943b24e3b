//! Runtime configuration.
//!
//! The API key is resolved from, in order: an explicit value (CLI flag),
//! the `SCOPUS_API_KEY` environment variable, then a TOML file.
//!
//! ```toml
//! [api_keys]
//! scopus = "your-elsevier-key"
//!
//! [harvest]
//! page_size = 25
//! output_dir = "./output"
//! ```

use crate::error::{Result, ScopusError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding the Elsevier API key
pub const API_KEY_ENV: &str = "SCOPUS_API_KEY";

/// Scopus search endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://api.elsevier.com/content/search/scopus";

/// Abstract retrieval by DOI (the DOI is appended)
pub const DEFAULT_ABSTRACT_URL: &str = "https://api.elsevier.com/content/abstract/doi/";

/// Results requested per search page
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Default config file: `<config_dir>/rustscopus/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rustscopus").join("config.toml"))
}

/// On-disk configuration file
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_keys: ApiKeysSection,
    #[serde(default)]
    pub harvest: HarvestSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysSection {
    #[serde(default)]
    pub scopus: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HarvestSection {
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load a config file. A missing file yields the empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let parsed = toml::from_str(&content).map_err(|e| {
            ScopusError::Config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded config file");
        Ok(parsed)
    }
}

/// Resolved settings for a harvest run
#[derive(Debug, Clone)]
pub struct ScopusConfig {
    pub api_key: String,
    pub search_url: String,
    pub abstract_url: String,
    pub page_size: usize,
    pub output_dir: PathBuf,
}

impl ScopusConfig {
    /// Configuration with the default endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            abstract_url: DEFAULT_ABSTRACT_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            output_dir: PathBuf::from("."),
        }
    }

    /// Resolve configuration from CLI values, environment and config file.
    pub fn resolve(
        api_key: Option<String>,
        config_path: Option<&Path>,
        output_dir: Option<PathBuf>,
        page_size: Option<usize>,
    ) -> Result<Self> {
        let file = match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => ConfigFile::load(&path)?,
            None => ConfigFile::default(),
        };

        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .or(file.api_keys.scopus)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ScopusError::Config(format!(
                    "no API key: pass --api-key, set {} or add [api_keys] scopus to the config file",
                    API_KEY_ENV
                ))
            })?;

        let page_size = page_size
            .or(file.harvest.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ScopusError::Config("page size must be positive".to_string()));
        }

        let mut config = Self::new(api_key);
        config.page_size = page_size;
        if let Some(dir) = output_dir.or(file.harvest.output_dir) {
            config.output_dir = dir;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let file = ConfigFile::load(Path::new("/nonexistent/rustscopus.toml"))?;
        assert!(file.api_keys.scopus.is_none());
        Ok(())
    }

    #[test]
    fn test_resolve_from_file() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(
            temp,
            "[api_keys]\nscopus = \"file-key\"\n\n[harvest]\npage_size = 50\noutput_dir = \"/tmp/ris\""
        )?;

        // An explicit key wins over the file; the file still supplies the rest.
        let config =
            ScopusConfig::resolve(Some("cli-key".to_string()), Some(temp.path()), None, None)?;
        assert_eq!(config.api_key, "cli-key");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/ris"));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_config_error() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "[api_keys\nscopus =")?;
        assert!(matches!(
            ConfigFile::load(temp.path()),
            Err(ScopusError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = ScopusConfig::resolve(
            Some("k".to_string()),
            Some(Path::new("/nonexistent/rustscopus.toml")),
            None,
            Some(0),
        );
        assert!(matches!(result, Err(ScopusError::Config(_))));
    }
}
