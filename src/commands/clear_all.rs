//! Clear and rebuild every cache

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::Portfolio;

/// What a `clear:all` run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Step descriptions in execution order
    pub steps: Vec<String>,
    /// Posts rendered into the fresh render cache
    pub warmed: usize,
}

/// Run every step in order, stopping at the first failure
pub fn run(site: &Portfolio) -> Result<Summary> {
    let mut summary = Summary {
        steps: Vec::new(),
        warmed: 0,
    };

    // optimize:clear
    if site.cache_dir.exists() {
        ensure_disposable(site)?;
        fs::remove_dir_all(&site.cache_dir)
            .with_context(|| format!("Failed to remove {:?}", site.cache_dir))?;
        tracing::info!("Deleted: {:?}", site.cache_dir);
    }
    step(&mut summary, "Cache directory cleared");

    // config:clear
    let snapshot = SiteConfig::snapshot_path(&site.base_dir, &site.config);
    if snapshot.exists() {
        fs::remove_file(&snapshot)?;
    }
    step(&mut summary, "Configuration cache cleared");

    // config:cache, from _config.yml rather than the snapshot just removed
    let config = SiteConfig::from_file_or_default(&site.base_dir)?;
    let written = config.write_snapshot(&site.base_dir)?;
    tracing::debug!("Wrote config snapshot {:?}", written);
    step(&mut summary, "Configuration cached");

    let fresh = Portfolio::with_config(site.base_dir.clone(), config);
    let store = fresh.content_store();

    // cache:clear
    store.clear_cache()?;
    step(&mut summary, "Render cache cleared");

    // Rebuild the post index
    summary.warmed = store.warm()?;
    let description = format!("Post index regenerated ({} posts)", summary.warmed);
    step(&mut summary, &description);

    print_banner(&summary);
    Ok(summary)
}

/// Refuse to remove a cache directory that holds site data
fn ensure_disposable(site: &Portfolio) -> Result<()> {
    let cache = site
        .cache_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", site.cache_dir))?;

    let protected: [&Path; 4] = [
        &site.base_dir,
        &site.content_dir,
        &site.public_dir,
        &site.database_path,
    ];
    for path in protected {
        let Ok(path) = path.canonicalize() else {
            continue;
        };
        if path.starts_with(&cache) {
            bail!(
                "Refusing to clear cache_dir {:?}: it contains {:?}",
                site.cache_dir,
                path
            );
        }
    }
    Ok(())
}

fn step(summary: &mut Summary, description: &str) {
    println!("- {} was executed.", description);
    summary.steps.push(description.to_string());
}

fn print_banner(summary: &Summary) {
    let line = "=".repeat(48);
    println!("{}", line);
    println!(
        "  All caches rebuilt: {} steps, {} posts rendered",
        summary.steps.len(),
        summary.warmed
    );
    println!("{}", line);
}
