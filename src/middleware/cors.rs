use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Lets the web app at `webapp_url` call the API. Falls back to any origin
/// when the URL cannot be used as an origin header.
pub fn webapp_cors(webapp_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match url::Url::parse(webapp_url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .and_then(|origin| HeaderValue::from_str(&origin).ok())
    {
        Some(origin) => base.allow_origin(origin),
        None => {
            tracing::warn!(webapp_url, "WEBAPP_URL is not a usable origin, allowing any");
            base.allow_origin(Any)
        }
    }
}
