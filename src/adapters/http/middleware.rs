//! CORS and request logging.

use super::AppState;
use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::{Instrument, info, info_span};

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOW_HEADERS: &str = "authorization,content-type";

fn allowed_origin(state: &AppState, headers: &HeaderMap) -> Option<HeaderValue> {
    let origin = headers.get("origin")?.to_str().ok()?.trim();
    if origin.is_empty() || origin.len() > 256 {
        return None;
    }
    let origins = &state.cors_allowed_origins;
    if origins.is_empty() || origins.iter().any(|o| o == origin) {
        HeaderValue::from_str(origin).ok()
    } else {
        None
    }
}

fn apply_cors(resp: &mut Response, origin: HeaderValue) {
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", origin);
    headers.insert("vary", HeaderValue::from_static("origin"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Answers preflights and tags responses for allowed origins. An empty
/// allow-list accepts any origin.
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(&state, req.headers());
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = origin {
            apply_cors(&mut resp, origin);
        }
        return resp;
    }
    let mut resp = next.run(req).await;
    if let Some(origin) = origin {
        apply_cors(&mut resp, origin);
    }
    resp
}

/// Wraps each request in an `http.request` span and logs status and latency.
pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let span = info_span!("http.request", method = %method, route = %route);
    async move {
        let resp = next.run(req).await;
        info!(
            status = resp.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        resp
    }
    .instrument(span)
    .await
}
