//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/blog/hello") // -> "/site/blog/hello"
/// url_for(&config, "/")           // -> "/site"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = root_prefix(config);
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        // The home page of a mounted site is the bare mount point
        if root.is_empty() {
            "/".to_string()
        } else {
            root
        }
    } else {
        format!("{}/{}", root, path)
    }
}

/// The mount point of the site without a trailing slash; empty at `/`
pub fn root_prefix(config: &SiteConfig) -> String {
    match config.root.trim_matches('/') {
        "" => String::new(),
        root => format!("/{}", root),
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Resolve an image reference: absolute URLs pass through, paths get the root
pub fn asset_url(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        path.to_string()
    } else {
        url_for(config, path)
    }
}
