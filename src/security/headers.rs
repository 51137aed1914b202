//! Security response headers.
//!
//! Responses are marked uncacheable (they are per-principal) and get the
//! usual browser hardening headers. Headers a handler already set are kept.

use axum::{
    http::{header, HeaderName, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const SECURITY_HEADERS: [(HeaderName, &str); 6] = [
    (header::CACHE_CONTROL, "no-cache, no-store, max-age=0, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Wrap every route, the fallback and all existing layers with the
/// hardening headers.
pub fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
        routing::get,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_headers_added_unless_present() {
        let router = with_security_headers(
            Router::new()
                .route("/", get(|| async { "ok" }))
                .route(
                    "/cached",
                    get(|| async { ([(header::CACHE_CONTROL, "max-age=60")], "ok").into_response() }),
                ),
        );

        let res = router
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        for (name, value) in SECURITY_HEADERS {
            assert_eq!(res.headers()[name], value);
        }

        let res = router
            .oneshot(Request::builder().uri("/cached").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "max-age=60");
        assert_eq!(res.headers()[header::X_FRAME_OPTIONS], "DENY");
    }
}
