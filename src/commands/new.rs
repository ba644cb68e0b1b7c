//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Portfolio;

/// Optional front-matter for a new post
#[derive(Debug, Clone, Default)]
pub struct PostOptions {
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Write `<content_dir>/<slug>.md` with a front-matter scaffold
pub fn create_post(site: &Portfolio, title: &str, options: &PostOptions) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    fs::create_dir_all(&site.content_dir)?;
    let file_path = site.content_dir.join(format!("{}.md", slug));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let mut content = String::from("---\n");
    content.push_str(&format!("title: {}\n", yaml_string(title)));
    content.push_str(&format!("date: {}\n", now.format("%Y-%m-%d")));
    if let Some(category) = &options.category {
        content.push_str(&format!("category: {}\n", yaml_string(category)));
    }
    content.push_str(&format!(
        "description: {}\n",
        yaml_string(options.description.as_deref().unwrap_or(""))
    ));
    content.push_str("---\n\n");

    fs::write(&file_path, content)?;
    tracing::info!("Created post {}", slug);
    println!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Quote a scalar so titles like `Rust: a tour` stay valid YAML
fn yaml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
