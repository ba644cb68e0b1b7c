//! HTML page handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tera::Context;

use super::{AppState, SharedState};
use crate::helpers::{parse_page, Paginator};
use crate::templates::{PageMeta, SiteData};

/// Query string accepted by every page
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub lang: Option<String>,
}

/// An internal failure while building a page; rendered without templates
pub struct PageError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for PageError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Page failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<!DOCTYPE html><title>Server Error</title><h1>500</h1><p>Server Error</p>"),
        )
            .into_response()
    }
}

type PageResult = Result<Response, PageError>;

impl AppState {
    /// Context shared by every page: `site`, `page` and `lang`
    fn page_context(&self, lang: Option<&str>, page: PageMeta) -> Context {
        let mut ctx = Context::new();
        ctx.insert("site", &SiteData::from_config(&self.config));
        ctx.insert("page", &page);
        ctx.insert("lang", &self.i18n.resolve_language(lang));
        ctx
    }

    fn render(&self, template: &str, ctx: &Context) -> PageResult {
        Ok(Html(self.templates.render(template, ctx)?).into_response())
    }

    /// The 404 page with a custom heading
    pub(super) fn not_found_page(&self, lang: Option<&str>, heading: &str) -> Response {
        let mut ctx = self.page_context(lang, PageMeta::website(&self.config, "/", Some(heading)));
        ctx.insert("heading", heading);
        match self.templates.render("not_found.html", &ctx) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render 404 page: {:#}", e);
                (StatusCode::NOT_FOUND, heading.to_string()).into_response()
            }
        }
    }

    /// Whether a boolean setting is switched on; missing rows are off
    fn setting_enabled(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self
            .settings
            .find_by_key(key)?
            .map(|setting| setting.value.as_bool())
            .unwrap_or(false))
    }
}

/// GET /
pub async fn home(State(state): State<SharedState>, Query(query): Query<PageQuery>) -> PageResult {
    let posts = state.content.sorted_posts()?;
    let recent: Vec<_> = posts.into_iter().take(state.config.recent_posts).collect();

    let mut ctx = state.page_context(
        query.lang.as_deref(),
        PageMeta::website(&state.config, "/", None),
    );
    ctx.insert("posts", &recent);
    ctx.insert(
        "show_contact_section",
        &state.setting_enabled("show_contact_section")?,
    );
    state.render("home.html", &ctx)
}

/// GET /blog?page=N
pub async fn blog_index(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let posts = state.content.sorted_posts()?;
    let pager = Paginator::new(
        posts.len(),
        state.config.per_page,
        Some(parse_page(query.page.as_deref())),
    );

    let mut ctx = state.page_context(
        query.lang.as_deref(),
        PageMeta::website(&state.config, "/blog", Some("Blog")),
    );
    ctx.insert("posts", pager.slice(&posts));
    ctx.insert("pager", &pager);
    ctx.insert("paginated", &pager.is_paginated());
    state.render("blog_index.html", &ctx)
}

/// GET /blog/:slug
pub async fn post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let Some(post) = state.content.post(&slug)? else {
        tracing::debug!("Post not found: {}", slug);
        return Ok(state.not_found_page(query.lang.as_deref(), "Post Not Found"));
    };

    let meta = PageMeta::article(&state.config, &post);
    let mut ctx = state.page_context(query.lang.as_deref(), meta);
    ctx.insert("post", &post);
    state.render("post.html", &ctx)
}

/// GET /welcome
pub async fn welcome(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let ctx = state.page_context(
        query.lang.as_deref(),
        PageMeta::website(&state.config, "/welcome", None),
    );
    state.render("welcome.html", &ctx)
}

/// GET /elements
pub async fn elements(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let ctx = state.page_context(
        query.lang.as_deref(),
        PageMeta::website(&state.config, "/elements", Some("Elements")),
    );
    state.render("elements.html", &ctx)
}
