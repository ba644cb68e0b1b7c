//! Site templates using the Tera template engine
//!
//! Every page template is embedded in the binary, so a deployed site needs
//! nothing on disk besides its content and configuration.

use anyhow::Result;
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{asset_url, display_date, full_url_for, strip_html, url_for, DateStyle};
use crate::i18n::I18n;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with every template, filter and the `__` and
    /// `url_for` functions loaded
    pub fn new(config: &SiteConfig, i18n: Arc<I18n>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog_index.html", include_str!("site/blog_index.html")),
            ("post.html", include_str!("site/post.html")),
            ("welcome.html", include_str!("site/welcome.html")),
            ("elements.html", include_str!("site/elements.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("site/partials/footer.html"),
            ),
            (
                "partials/pager.html",
                include_str!("site/partials/pager.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("date_format", date_format_filter);
        let site = config.clone();
        tera.register_function(
            "url_for",
            move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let path = match args.get("path") {
                    Some(val) => tera::try_get_value!("url_for", "path", String, val),
                    None => "/".to_string(),
                };
                Ok(tera::Value::String(url_for(&site, &path)))
            },
        );
        tera.register_function(
            "__",
            move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let key = match args.get("key") {
                    Some(val) => tera::try_get_value!("__", "key", String, val),
                    None => return Err(tera::Error::msg("`__` requires a `key` argument")),
                };
                let lang = match args.get("lang") {
                    Some(val) => tera::try_get_value!("__", "lang", String, val),
                    None => i18n.language().to_string(),
                };
                Ok(tera::Value::String(i18n.get_for_lang(&lang, &key)))
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: `date_format(format="long"|"short")`
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "long".to_string(),
    };
    Ok(tera::Value::String(display_date(
        &s,
        DateStyle::from_name(&format),
    )))
}

/// Site-wide values every page template reads as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub avatar: String,
    pub url: String,
    pub root: String,
    pub year: i32,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            avatar: asset_url(config, &config.avatar),
            url: config.url.clone(),
            root: config.root.clone(),
            year: chrono::Local::now().year(),
        }
    }
}

/// `<head>` metadata of one page
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub og_title: String,
    pub og_type: &'static str,
    pub og_image: String,
    /// Canonical absolute URL
    pub url: String,
    /// Path under the site root, used by the language switch
    pub path: String,
}

impl PageMeta {
    /// Metadata of a plain site page at `path`
    pub fn website(config: &SiteConfig, path: &str, title: Option<&str>) -> Self {
        let title = match title {
            Some(t) => format!("{} | {}", t, config.author),
            None => config.title.clone(),
        };
        Self {
            title,
            description: config.description.clone(),
            og_title: config.author.clone(),
            og_type: "website",
            og_image: asset_url(config, &config.avatar),
            url: full_url_for(config, path),
            path: url_for(config, path),
        }
    }

    /// Metadata of a blog post page
    pub fn article(config: &SiteConfig, post: &Post) -> Self {
        let image = post.image.as_deref().unwrap_or(&config.avatar);
        Self {
            title: format!("{} | {}", post.title, config.author),
            description: post
                .description
                .clone()
                .unwrap_or_else(|| config.description.clone()),
            og_title: post.title.clone(),
            og_type: "article",
            og_image: asset_url(config, image),
            url: full_url_for(config, &post.path()),
            path: url_for(config, &post.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> TemplateRenderer {
        let i18n = I18n::embedded("en", "pt-br").unwrap();
        TemplateRenderer::new(&SiteConfig::default(), Arc::new(i18n)).unwrap()
    }

    #[test]
    fn test_date_format_filter() {
        let mut args = HashMap::new();
        let long = date_format_filter(&json!("2024-01-05"), &args).unwrap();
        assert_eq!(long, json!("January 5, 2024"));

        args.insert("format".to_string(), json!("short"));
        let short = date_format_filter(&json!("2024-01-05"), &args).unwrap();
        assert_eq!(short, json!("Jan 5, 2024"));

        let raw = date_format_filter(&json!("someday"), &args).unwrap();
        assert_eq!(raw, json!("someday"));
    }

    #[test]
    fn test_strip_html_filter() {
        let out = strip_html_filter(&json!("<p>Hello <b>world</b></p>"), &HashMap::new()).unwrap();
        assert_eq!(out, json!("Hello world"));
    }

    #[test]
    fn test_page_meta_titles() {
        let config = SiteConfig::default();
        let fm = crate::content::FrontMatter {
            title: Some("Hello".to_string()),
            image: Some("/img/cover.png".to_string()),
            ..Default::default()
        };
        let post = Post::from_front_matter("hello".to_string(), "hello.md".into(), fm);

        let meta = PageMeta::article(&config, &post);
        assert_eq!(meta.title, format!("Hello | {}", config.author));
        assert_eq!(meta.og_type, "article");
        assert_eq!(meta.og_image, "/img/cover.png");
        assert_eq!(meta.url, "http://localhost:8000/blog/hello");

        let home = PageMeta::website(&config, "/", None);
        assert_eq!(home.title, config.title);
        assert_eq!(home.og_type, "website");
    }

    #[test]
    fn test_welcome_renders_translation() {
        let config = SiteConfig::default();
        let mut ctx = Context::new();
        ctx.insert("site", &SiteData::from_config(&config));
        ctx.insert("page", &PageMeta::website(&config, "/welcome", None));
        ctx.insert("lang", "pt-br");

        let html = renderer().render("welcome.html", &ctx).unwrap();
        assert!(html.contains("Fazendo algumas mudanças."));
        assert!(html.contains("Feito por"));
    }

    #[test]
    fn test_not_found_escapes_title() {
        let config = SiteConfig::default();
        let mut ctx = Context::new();
        ctx.insert("site", &SiteData::from_config(&config));
        ctx.insert("page", &PageMeta::website(&config, "/lost", Some("<Lost>")));
        ctx.insert("lang", "en");
        ctx.insert("heading", "Post Not Found");

        let html = renderer().render("not_found.html", &ctx).unwrap();
        assert!(html.contains("&lt;Lost&gt;"));
        assert!(html.contains("Post Not Found"));
    }
}
