//! Configuration for Koenig card rendering.
//!
//! Parses `kg.toml` files with serde and provides auto-discovery of the
//! config file in parent directories. The settings describe the site the
//! cards are rendered for: its public URL, the responsive image sizes the
//! image service can produce, and feature flags.
//!
//! ## Environment Variable Expansion
//!
//! `site.url` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! # Example
//!
//! ```
//! use kg_config::Config;
//!
//! let config = Config::from_toml_str(r#"
//! [site]
//! url = "https://example.com/"
//!
//! [images]
//! srcsets = false
//! "#).unwrap();
//! assert_eq!(config.site.url, "https://example.com/");
//! assert!(!config.images.srcsets);
//! assert_eq!(config.images.content_image_sizes.len(), 4);
//! ```

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "kg.toml";

/// Rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration.
    pub site: SiteConfig,
    /// Responsive image configuration.
    pub images: ImagesConfig,
    /// Feature flags.
    pub features: FeaturesConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Site configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public site URL, used to recognise local content images.
    pub url: String,
}

/// One configured responsive image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
}

/// Responsive image configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Whether `srcset` attributes are emitted.
    pub srcsets: bool,
    /// Width local images are downsized to before rendering.
    pub default_max_width: Option<u32>,
    /// Named sizes the image service can produce.
    pub content_image_sizes: BTreeMap<String, ImageSize>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        let content_image_sizes = [("w600", 600), ("w1000", 1000), ("w1600", 1600), ("w2400", 2400)]
            .into_iter()
            .map(|(name, width)| (name.to_owned(), ImageSize { width }))
            .collect();
        Self {
            srcsets: true,
            default_max_width: Some(2000),
            content_image_sizes,
        }
    }
}

/// Feature flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Apply member visibility gating to HTML cards.
    pub content_visibility: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `kg.toml` in the current directory and its parents, falling back
    /// to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        let Ok(cwd) = std::env::current_dir() else {
            return Ok(Self::default());
        };
        match Self::discover_from(&cwd) {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file in `start` and its parents.
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.site.url.is_empty() {
            require_http_url(&self.site.url, "site.url")?;
        }

        if self.images.content_image_sizes.is_empty() {
            return Err(ConfigError::Validation(
                "images.content_image_sizes cannot be empty".to_owned(),
            ));
        }
        if let Some((name, _)) = self
            .images
            .content_image_sizes
            .iter()
            .find(|(_, size)| size.width == 0)
        {
            return Err(ConfigError::Validation(format!(
                "images.content_image_sizes.{name}.width must be greater than 0"
            )));
        }
        if self.images.default_max_width == Some(0) {
            return Err(ConfigError::Validation(
                "images.default_max_width must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.url = expand::expand_env(&self.site.url, "site.url")?;
        Ok(())
    }
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.url, "");
        assert!(config.images.srcsets);
        assert_eq!(config.images.default_max_width, Some(2000));
        let widths: Vec<u32> = config
            .images
            .content_image_sizes
            .values()
            .map(|s| s.width)
            .collect();
        assert_eq!(widths, vec![1000, 1600, 2400, 600]);
        assert!(!config.features.content_visibility);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.images.srcsets);
        assert_eq!(config.images.content_image_sizes.len(), 4);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[site]
url = "https://blog.example.com"

[images]
srcsets = false
default_max_width = 1600
content_image_sizes = { small = { width = 300 }, large = { width = 1200 } }

[features]
content_visibility = true
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.site.url, "https://blog.example.com");
        assert!(!config.images.srcsets);
        assert_eq!(config.images.default_max_width, Some(1600));
        assert_eq!(
            config.images.content_image_sizes.get("large"),
            Some(&ImageSize { width: 1200 })
        );
        assert!(config.features.content_visibility);
    }

    #[test]
    fn test_site_url_requires_scheme() {
        let err = Config::from_toml_str("[site]\nurl = \"example.com\"").unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("site.url"));
    }

    #[test]
    fn test_zero_width_rejected() {
        let toml = "[images]\ncontent_image_sizes = { tiny = { width = 0 } }";
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("tiny"));
    }

    #[test]
    fn test_empty_sizes_rejected() {
        let toml = "[images]\ncontent_image_sizes = {}";
        assert!(Config::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/kg.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[site]\nurl = \"https://x.test\"").unwrap();

        let found = Config::discover_from(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));

        let config = Config::load(Some(&found)).unwrap();
        assert_eq!(config.site.url, "https://x.test");
        assert_eq!(config.config_path, Some(found));
    }
}
