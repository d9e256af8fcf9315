//! JSON responses with permissive CORS.
//!
//! Every body the API produces goes through [`respond`], which pins the
//! three `access-control-allow-*` headers to `*` after applying any caller
//! headers.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use futures::FutureExt;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Status and extra headers for [`respond`].
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseInit {
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self::status(StatusCode::OK)
    }
}

/// Serializes `body` as JSON.
///
/// Caller headers replace same-named defaults, but the CORS headers are
/// always `*`.
pub fn respond<T: Serialize + ?Sized>(body: &T, init: ResponseInit) -> Response {
    let payload = match serde_json::to_vec(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            return internal_server_error();
        }
    };

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = init.status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.extend(init.headers);
    add_cors(headers);

    response
}

/// Sets the permissive CORS headers, replacing any existing values.
pub fn add_cors(headers: &mut HeaderMap) {
    let any = HeaderValue::from_static("*");
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, any);
}

/// 200 with `body`.
pub fn json<T: Serialize + ?Sized>(body: &T) -> Response {
    respond(body, ResponseInit::default())
}

fn error(status: StatusCode, message: &str) -> Response {
    respond(&json!({ "error": message }), ResponseInit::status(status))
}

pub fn ok() -> Response {
    json(&json!({ "ok": true }))
}

pub fn missing_parameters() -> Response {
    error(StatusCode::BAD_REQUEST, "missing parameters")
}

pub fn low_permissions() -> Response {
    error(StatusCode::FORBIDDEN, "no permissions for this action")
}

pub fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "not found")
}

pub fn conflict() -> Response {
    error(StatusCode::CONFLICT, "conflict")
}

/// 419, which has no named constant.
pub fn rate_limited() -> Response {
    let status = StatusCode::from_u16(419).unwrap_or(StatusCode::TOO_MANY_REQUESTS);
    error(status, "rate limit hit, enhance your calm")
}

pub fn internal_server_error() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

/// Runs `handler`, turning an error or a panic into a logged 500.
pub async fn resolve_failures<F, E>(handler: F) -> Response
where
    F: Future<Output = Result<Response, E>>,
    E: fmt::Display,
{
    resolve_failures_with(internal_server_error, handler).await
}

/// Runs `handler`, turning an error or a panic into `handle_with()`.
pub async fn resolve_failures_with<H, F, E>(handle_with: H, handler: F) -> Response
where
    H: FnOnce() -> Response,
    F: Future<Output = Result<Response, E>>,
    E: fmt::Display,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "handler failed");
            handle_with()
        }
        Err(panic) => {
            tracing::error!(panic = panic_message(&*panic), "handler panicked");
            handle_with()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Router-wide [`resolve_failures`].
pub async fn catch_failures(request: Request, next: Next) -> Response {
    resolve_failures(async move { Ok::<_, Infallible>(next.run(request).await) }).await
}

/// Answers every `OPTIONS` request with [`ok`].
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return ok();
    }
    next.run(request).await
}
