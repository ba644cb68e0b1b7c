//! Content store - loads posts from the content directory

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

use super::post::sort_posts;
use super::{FrontMatter, MarkdownRenderer, Post};
use crate::cache::{hash_content, CacheDb, RenderCache};
use crate::Portfolio;

/// Loads posts from the content directory and renders them on demand
pub struct ContentStore {
    content_dir: PathBuf,
    renderer: MarkdownRenderer,
    cache: RenderCache,
    cache_db: Mutex<CacheDb>,
}

impl ContentStore {
    /// Create a new content store
    pub fn new(content_dir: PathBuf, renderer: MarkdownRenderer, cache: RenderCache) -> Self {
        let cache_db = Mutex::new(cache.load());
        Self {
            content_dir,
            renderer,
            cache,
            cache_db,
        }
    }

    /// Create the store described by the site configuration
    pub fn from_site(site: &Portfolio) -> Self {
        Self::new(
            site.content_dir.clone(),
            MarkdownRenderer::from_config(&site.config),
            RenderCache::new(site.cache_dir.clone()),
        )
    }

    /// Slugs of every post in the content directory
    pub fn post_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .markdown_files()?
            .into_iter()
            .map(|(slug, _)| slug)
            .collect())
    }

    /// Metadata of all posts, newest first (bodies are not rendered)
    pub fn sorted_posts(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();

        for (slug, path) in self.markdown_files()? {
            match self.read_post(&slug, &path) {
                Ok((post, _)) => posts.push(post),
                Err(e) => {
                    tracing::warn!("Failed to load post {:?}: {:#}", path, e);
                }
            }
        }

        sort_posts(&mut posts);
        Ok(posts)
    }

    /// A single post with its rendered body, or `None` for unknown slugs
    pub fn post(&self, slug: &str) -> Result<Option<Post>> {
        if !is_valid_slug(slug) {
            tracing::debug!("Rejected post slug {:?}", slug);
            return Ok(None);
        }

        let Some(path) = ["md", "markdown"]
            .iter()
            .map(|ext| self.content_dir.join(format!("{}.{}", slug, ext)))
            .find(|path| path.is_file())
        else {
            return Ok(None);
        };

        let (mut post, body) = self.read_post(slug, &path)?;
        post.content_html = Some(self.render_body(slug, &body)?);
        Ok(Some(post))
    }

    /// Render every post into the render cache, returning how many were rendered
    pub fn warm(&self) -> Result<usize> {
        let mut count = 0;
        for slug in self.post_ids()? {
            match self.post(&slug) {
                Ok(Some(_)) => count += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to render post {}: {:#}", slug, e),
            }
        }
        Ok(count)
    }

    /// Read a post file and split it into metadata and markdown body
    fn read_post(&self, slug: &str, path: &Path) -> Result<(Post, String)> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content)
            .with_context(|| format!("Invalid front-matter in {:?}", path))?;
        let body = body.to_string();
        Ok((
            Post::from_front_matter(slug.to_string(), path.to_path_buf(), fm),
            body,
        ))
    }

    /// Render markdown through the render cache
    fn render_body(&self, slug: &str, body: &str) -> Result<String> {
        let content_hash = hash_content(&format!("{}\n{}", self.renderer.fingerprint(), body));

        {
            let db = self.cache_db.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(html) = db.get(slug, content_hash) {
                tracing::debug!("Render cache hit: {}", slug);
                return Ok(html.to_string());
            }
        }

        let html = self.renderer.render(body)?;
        tracing::debug!("Rendered post: {}", slug);

        let mut db = self.cache_db.lock().unwrap_or_else(|e| e.into_inner());
        db.insert(slug, content_hash, html.clone());
        self.cache.store(&db);

        Ok(html)
    }

    /// Forget rendered bodies held in memory and on disk
    pub fn clear_cache(&self) -> Result<bool> {
        let mut db = self.cache_db.lock().unwrap_or_else(|e| e.into_inner());
        *db = CacheDb::new();
        self.cache.clear()
    }

    /// (slug, path) of every markdown file directly inside the content directory
    fn markdown_files(&self) -> Result<Vec<(String, PathBuf)>> {
        if !self.content_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.content_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }
            if let Some(slug) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_slug(slug) {
                    files.push((slug.to_string(), path.to_path_buf()));
                }
            }
        }

        Ok(files)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// A slug must be a plain file name: no separators, no dot prefix
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
}
