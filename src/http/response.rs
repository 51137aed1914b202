//! Redirect responses.
//!
//! Form login speaks `302 Found`, not axum's default `303 See Other`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirect and set (or clear) a cookie in the same response.
pub fn redirect_with_cookie(location: &str, set_cookie: String) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, set_cookie),
        ],
    )
        .into_response()
}
