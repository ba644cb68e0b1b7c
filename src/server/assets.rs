//! Stylesheet and script compiled into the binary

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

const SITE_CSS: &str = include_str!("../../assets/site.css");
const SITE_JS: &str = include_str!("../../assets/site.js");

const CACHE_CONTROL: &str = "public, max-age=3600";

/// GET /assets/site.css
pub async fn stylesheet() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        SITE_CSS,
    )
        .into_response()
}

/// GET /assets/site.js
pub async fn script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        SITE_JS,
    )
        .into_response()
}
