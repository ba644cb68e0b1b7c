//! Render cache for post bodies
//!
//! Rendered HTML is memoised per slug together with a hash of the markdown
//! source and the renderer options, so a post is only re-rendered after its
//! file or the highlighting setup changes.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Cache file name inside the cache directory
pub const CACHE_FILE: &str = "posts.json";

/// Represents a cached entry for a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the markdown body and renderer options
    pub content_hash: u64,
    /// Rendered HTML
    pub html: String,
}

/// Cache database for rendered posts
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Cached entries keyed by slug
    pub posts: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Load cache from disk, or create a new empty cache
    pub fn load(cache_dir: &Path) -> Self {
        let cache_path = cache_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Discarding unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, cache_dir: &Path) -> Result<()> {
        fs::create_dir_all(cache_dir)?;
        let content = serde_json::to_string(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Cached HTML for a slug if the hash still matches
    pub fn get(&self, slug: &str, content_hash: u64) -> Option<&str> {
        self.posts
            .get(slug)
            .filter(|entry| entry.content_hash == content_hash)
            .map(|entry| entry.html.as_str())
    }

    pub fn insert(&mut self, slug: &str, content_hash: u64, html: String) {
        self.posts
            .insert(slug.to_string(), CacheEntry { content_hash, html });
    }
}

/// On-disk render cache rooted in a cache directory
#[derive(Debug, Clone)]
pub struct RenderCache {
    dir: PathBuf,
}

impl RenderCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> CacheDb {
        CacheDb::load(&self.dir)
    }

    /// Persist the cache; failures are logged, rendering never depends on it
    pub fn store(&self, db: &CacheDb) {
        if let Err(e) = db.save(&self.dir) {
            tracing::warn!("Failed to write render cache in {:?}: {}", self.dir, e);
        }
    }

    /// Remove the cache file, returning whether one existed
    pub fn clear(&self) -> Result<bool> {
        let path = self.dir.join(CACHE_FILE);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Deleted: {:?}", path);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Calculate a hash for content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
