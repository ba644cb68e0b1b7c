//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file in the site directory
pub const CONFIG_FILE: &str = "_config.yml";

/// Name of the resolved configuration snapshot inside the cache directory
pub const CONFIG_SNAPSHOT: &str = "config.json";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub fallback_language: String,
    pub avatar: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub cache_dir: String,
    pub database: String,

    // Listing
    pub per_page: usize,
    pub recent_posts: usize,

    // Writing
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Guilherme Albert | Tech Lead & Engineer".to_string(),
            description:
                "Tech Leader & Full Stack Engineer. Product-minded, hands-on, and entrepreneur."
                    .to_string(),
            author: "Guilherme Albert".to_string(),
            language: "en".to_string(),
            fallback_language: "pt-br".to_string(),
            avatar: "https://github.com/GuilhermeAlbert.png?size=400".to_string(),

            url: "http://localhost:8000".to_string(),
            root: "/".to_string(),

            content_dir: "content/posts".to_string(),
            public_dir: "public".to_string(),
            cache_dir: ".cache".to_string(),
            database: "storage/database.sqlite".to_string(),

            per_page: 6,
            recent_posts: 4,

            highlight: HighlightConfig::default(),
            markdown: MarkdownConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the configuration for a site directory.
    ///
    /// A snapshot in the cache directory wins over `_config.yml`; with neither
    /// present the defaults are used.
    pub fn resolve<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let from_file = Self::from_file_or_default(base_dir)?;

        let snapshot = Self::snapshot_path(base_dir, &from_file);
        if snapshot.exists() {
            let content = fs::read_to_string(&snapshot)?;
            match serde_json::from_str::<SiteConfig>(&content) {
                Ok(config) => {
                    tracing::debug!("Using cached configuration {:?}", snapshot);
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config snapshot {:?}: {}", snapshot, e);
                }
            }
        }

        Ok(from_file)
    }

    /// Parse `_config.yml`, bypassing any snapshot
    pub fn from_file_or_default<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Location of the snapshot for this configuration
    pub fn snapshot_path(base_dir: &Path, config: &SiteConfig) -> PathBuf {
        base_dir.join(&config.cache_dir).join(CONFIG_SNAPSHOT)
    }

    /// Write this configuration as the snapshot for `base_dir`
    pub fn write_snapshot(&self, base_dir: &Path) -> Result<PathBuf> {
        let path = Self::snapshot_path(base_dir, self);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Markdown rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Keep raw HTML embedded in markdown (dropped otherwise)
    pub allow_html: bool,
}
