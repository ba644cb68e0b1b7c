//! HTTP server: page routes, the settings API and static files

mod api;
mod assets;
pub mod error;
mod pages;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub use error::AppError;
pub use pages::PageQuery;

use crate::config::SiteConfig;
use crate::content::ContentStore;
use crate::helpers::root_prefix;
use crate::i18n::I18n;
use crate::settings::SettingRepository;
use crate::templates::TemplateRenderer;
use crate::Portfolio;

/// Everything a request handler can reach
pub struct AppState {
    pub config: SiteConfig,
    pub content: ContentStore,
    pub templates: TemplateRenderer,
    pub settings: SettingRepository,
    pub i18n: Arc<I18n>,
    pub public_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Assemble the state for a site
    pub fn new(site: &Portfolio, settings: SettingRepository) -> Result<Self> {
        let i18n = Arc::new(I18n::embedded(
            &site.config.language,
            &site.config.fallback_language,
        )?);
        Ok(Self {
            config: site.config.clone(),
            content: site.content_store(),
            templates: TemplateRenderer::new(&site.config, i18n.clone())?,
            settings,
            i18n,
            public_dir: site.public_dir.clone(),
        })
    }
}

/// Build the application router, mounted at the configured `root`
pub fn router(state: SharedState) -> Router {
    let site = Router::new()
        .route("/", get(pages::home))
        .route("/blog", get(pages::blog_index))
        .route("/blog/:slug", get(pages::post))
        .route("/welcome", get(pages::welcome))
        .route("/elements", get(pages::elements))
        .route("/api/settings", get(api::index).patch(api::update))
        .route("/assets/site.css", get(assets::stylesheet))
        .route("/assets/site.js", get(assets::script))
        .fallback(fallback_handler);

    let root = root_prefix(&state.config);
    let app = if root.is_empty() {
        site
    } else {
        tracing::debug!("Mounting site at {}", root);
        Router::new().nest(&root, site).fallback(outside_root)
    };

    app.layer(
        TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(true)),
    )
    .with_state(state)
}

/// Start the server and run until Ctrl+C
pub async fn start(site: &Portfolio, ip: &str, port: u16) -> Result<()> {
    let settings = site.settings()?;
    let state = Arc::new(AppState::new(site, settings)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");
    tracing::debug!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("Server stopped.");
    Ok(())
}

/// Serve a file from the public directory, else the 404 page
async fn fallback_handler(State(state): State<SharedState>, request: Request<Body>) -> Response {
    let lang = Query::<PageQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.lang);

    let mut service = ServeDir::new(&state.public_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => state.not_found_page(lang.as_deref(), "Signal Lost"),
        Err(e) => {
            tracing::error!("Failed to serve static file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Anything outside the mount point
async fn outside_root(State(state): State<SharedState>, uri: Uri) -> Response {
    let lang = Query::<PageQuery>::try_from_uri(&uri)
        .ok()
        .and_then(|Query(q)| q.lang);
    state.not_found_page(lang.as_deref(), "Signal Lost")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, Method};
    use serde_json::{json, Value};
    use std::fs;
    use tower::ServiceExt;

    use crate::database::{seed_settings, Database};

    struct Fixture {
        dir: tempfile::TempDir,
        app: Router,
    }

    fn fixture(post_count: usize) -> Fixture {
        fixture_with_config(post_count, "")
    }

    fn fixture_with_config(post_count: usize, config: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        if !config.is_empty() {
            fs::write(dir.path().join("_config.yml"), config).unwrap();
        }
        let posts_dir = dir.path().join("content/posts");
        fs::create_dir_all(&posts_dir).unwrap();
        for i in 1..=post_count {
            fs::write(
                posts_dir.join(format!("post-{:02}.md", i)),
                format!(
                    "---\ntitle: Post {}\ndate: 2024-01-{:02}\ndescription: Number {}\n---\n# Heading {}\n\nBody.\n",
                    i, i, i, i
                ),
            )
            .unwrap();
        }
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/robots.txt"), "User-agent: *\n").unwrap();

        let site = Portfolio::new(dir.path()).unwrap();
        let settings = SettingRepository::new(Database::open_in_memory().unwrap());
        seed_settings(&settings).unwrap();
        let state = Arc::new(AppState::new(&site, settings).unwrap());

        Fixture {
            dir,
            app: router(state),
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_home_lists_recent_posts() {
        let f = fixture(5);
        let (status, html) = send(&f.app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Post 5"));
        assert!(html.contains("Post 2"));
        // Only the four newest
        assert!(!html.contains("Post 1<"));
        assert!(!html.contains("id=\"contact\""));
    }

    #[tokio::test]
    async fn test_blog_index_paginates() {
        let f = fixture(8);
        let (status, page1) = send(&f.app, Method::GET, "/blog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page1.contains("Post 8"));
        assert!(page1.contains("Post 3"));
        assert!(!page1.contains("Post 2<"));
        assert!(page1.contains("page=2"));

        let (_, page2) = send(&f.app, Method::GET, "/blog?page=2", None).await;
        assert!(page2.contains("Post 2"));
        assert!(page2.contains("Post 1"));
        assert!(!page2.contains("Post 3<"));

        let (status, bogus) = send(&f.app, Method::GET, "/blog?page=abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(bogus.contains("Post 8"));
    }

    #[tokio::test]
    async fn test_post_page_and_unknown_slug() {
        let f = fixture(2);
        let (status, html) = send(&f.app, Method::GET, "/blog/post-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Post 1 | Guilherme Albert</title>"));
        assert!(html.contains("id=\"heading-1\""));

        let (status, html) = send(&f.app, Method::GET, "/blog/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Post Not Found"));
    }

    #[tokio::test]
    async fn test_welcome_respects_lang() {
        let f = fixture(0);
        let (_, en) = send(&f.app, Method::GET, "/welcome", None).await;
        assert!(en.contains("Making some changes."));

        let (_, pt) = send(&f.app, Method::GET, "/welcome?lang=pt-br", None).await;
        assert!(pt.contains("Fazendo algumas mudanças."));
    }

    #[tokio::test]
    async fn test_settings_update_is_visible_in_index() {
        let f = fixture(0);
        let (status, body) = send(
            &f.app,
            Method::PATCH,
            "/api/settings",
            Some(r#"{"key": "show_contact_section", "value": true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(updated["data"]["value"], json!(true));

        let (status, body) = send(&f.app, Method::GET, "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_str(&body).unwrap();
        let contact = listed["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["key"] == "show_contact_section")
            .unwrap();
        assert_eq!(contact["value"], json!(true));

        let (_, home) = send(&f.app, Method::GET, "/", None).await;
        assert!(home.contains("id=\"contact\""));
    }

    #[tokio::test]
    async fn test_settings_update_validation() {
        let f = fixture(0);

        let (status, body) =
            send(&f.app, Method::PATCH, "/api/settings", Some(r#"{"value": true}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: Value = serde_json::from_str(&body).unwrap();
        assert!(err["errors"]["key"].is_array());

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/api/settings",
            Some(r#"{"key": "nope", "value": true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/api/settings",
            Some(r#"{"key": "show_contact_section", "value": {"a": 1}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&f.app, Method::PATCH, "/api/settings", Some("{not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: Value = serde_json::from_str(&body).unwrap();
        assert!(err["errors"]["body"].is_array());
    }

    #[tokio::test]
    async fn test_assets_and_static_fallback() {
        let f = fixture(0);
        let (status, css) = send(&f.app, Method::GET, "/assets/site.css", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(css.contains(".reveal"));

        let (status, js) = send(&f.app, Method::GET, "/assets/site.js", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(js.contains("theme-toggle"));

        let (status, robots) = send(&f.app, Method::GET, "/robots.txt", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(robots.contains("User-agent"));

        let (status, html) = send(&f.app, Method::GET, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Signal Lost"));
    }

    #[tokio::test]
    async fn test_pager_and_language_switch_keep_query() {
        let f = fixture(8);
        let (_, html) = send(&f.app, Method::GET, "/blog?page=2&lang=pt-br", None).await;
        assert!(html.contains("page=1&amp;lang=pt-br"));
        // The switch back to English stays on page 2
        assert!(html.contains("&#x2F;blog?page=2&amp;lang=en"));
    }

    #[tokio::test]
    async fn test_site_mounted_under_root() {
        let f = fixture_with_config(2, "root: /site\n");

        let (status, html) = send(&f.app, Method::GET, "/site/blog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("&#x2F;site&#x2F;blog&#x2F;post-01"));
        assert!(html.contains("&#x2F;site&#x2F;assets&#x2F;site.css"));

        let (status, html) = send(&f.app, Method::GET, "/site/blog/post-02", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Post 2"));

        let (status, css) = send(&f.app, Method::GET, "/site/assets/site.css", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(css.contains(".reveal"));

        let (status, html) = send(&f.app, Method::GET, "/blog", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Signal Lost"));
    }

    #[tokio::test]
    async fn test_broken_post_is_a_plain_server_error() {
        let f = fixture(1);
        fs::write(
            f.dir.path().join("content/posts/broken.md"),
            "---\ntitle: [unclosed\n---\nBody\n",
        )
        .unwrap();

        let (status, html) = send(&f.app, Method::GET, "/blog/broken", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("Server Error"));
        assert!(!html.contains("unclosed"));

        // The listing skips the broken file
        let (status, html) = send(&f.app, Method::GET, "/blog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Post 1"));
    }
}
