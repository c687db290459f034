use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::application::recache::OutcomeLabel;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Run the request inside a `recache_request` span keyed by a fresh request id,
/// and echo the id back to the caller.
pub async fn set_request_context(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "recache_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log every completed request with its outcome; failures carry the attached error chain.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let outcome = match response.extensions().get::<OutcomeLabel>() {
        Some(label) => label.0,
        None if status.is_success() => "ok",
        None => "failed",
    };

    if status.is_success() {
        info!(
            target = "prerender_recache::http::response",
            status = status.as_u16(),
            outcome,
            elapsed_ms,
            "request completed"
        );
        return response;
    }

    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages.first().map(String::as_str).unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = "prerender_recache::http::response",
            status = status.as_u16(),
            outcome,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            "request failed"
        );
    } else {
        warn!(
            target = "prerender_recache::http::response",
            status = status.as_u16(),
            outcome,
            elapsed_ms,
            source,
            detail,
            "request refused"
        );
    }

    response
}
