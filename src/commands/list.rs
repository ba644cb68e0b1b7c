//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::repository::Repository;
use crate::Portfolio;

/// List site content by type
pub fn run(site: &Portfolio, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = site.content_store().sorted_posts()?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                let date = if post.date.is_empty() { "----------" } else { post.date.as_str() };
                println!("  {} - {} [{}] ({})", date, post.title, post.id, post.category);
            }
        }
        "category" | "categories" => {
            let counts = category_counts(site)?;
            println!("Categories ({}):", counts.len());
            for (cat, count) in counts {
                println!("  {} ({})", cat, count);
            }
        }
        "setting" | "settings" => {
            let settings = site.settings()?.all()?;
            println!("Settings ({}):", settings.len());
            for setting in settings {
                println!("  {} = {}", setting.key, setting.value);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, categories, settings",
                content_type
            );
        }
    }

    Ok(())
}

/// Posts per category, most used first, ties by name
pub fn category_counts(site: &Portfolio) -> Result<Vec<(String, usize)>> {
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for post in site.content_store().sorted_posts()? {
        *categories.entry(post.category).or_insert(0) += 1;
    }

    let mut counts: Vec<_> = categories.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_category_counts() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("content/posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("a.md"), "---\ncategory: Rust\n---\n").unwrap();
        fs::write(posts.join("b.md"), "---\ncategory: Rust\n---\n").unwrap();
        fs::write(posts.join("c.md"), "---\ntitle: C\n---\n").unwrap();

        let site = Portfolio::new(dir.path()).unwrap();
        assert_eq!(
            category_counts(&site).unwrap(),
            vec![("Rust".to_string(), 2), ("Tech".to_string(), 1)]
        );
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let site = Portfolio::new(dir.path()).unwrap();
        assert!(run(&site, "tags").is_err());
        assert!(run(&site, "posts").is_ok());
    }
}
