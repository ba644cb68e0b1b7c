//! portfolio-rs: a personal portfolio and blog server
//!
//! Landing pages and a markdown blog rendered through embedded Tera
//! templates, plus a small settings API backed by SQLite.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod database;
pub mod helpers;
pub mod i18n;
pub mod repository;
pub mod server;
pub mod settings;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::ContentStore;
use database::Database;
use settings::SettingRepository;

/// A site rooted at a base directory
#[derive(Debug, Clone)]
pub struct Portfolio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts
    pub content_dir: PathBuf,
    /// Static files served as-is
    pub public_dir: PathBuf,
    /// Render cache and config snapshot
    pub cache_dir: PathBuf,
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Portfolio {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = config::SiteConfig::resolve(&base_dir)?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an already resolved configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        Self {
            content_dir: base_dir.join(&config.content_dir),
            public_dir: base_dir.join(&config.public_dir),
            cache_dir: base_dir.join(&config.cache_dir),
            database_path: base_dir.join(&config.database),
            config,
            base_dir,
        }
    }

    /// Open the database, running migrations
    pub fn open_database(&self) -> Result<Database> {
        Database::open(&self.database_path)
    }

    /// Open the database and make sure the default settings exist
    pub fn settings(&self) -> Result<SettingRepository> {
        let repo = SettingRepository::new(self.open_database()?);
        database::seed_settings(&repo)?;
        Ok(repo)
    }

    pub fn content_store(&self) -> ContentStore {
        ContentStore::from_site(self)
    }

    /// Run the HTTP server
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        server::start(self, ip, port).await
    }

    /// Rebuild every cache
    pub fn clear_all(&self) -> Result<commands::clear_all::Summary> {
        commands::clear_all::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, options: &commands::new::PostOptions) -> Result<PathBuf> {
        commands::new::create_post(self, title, options)
    }
}
