use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

/// Per-request identity, available to handlers and echoed on the response.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Logs every 4xx/5xx page with the diagnostic the handler attached.
/// Successful responses are not logged.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    let source = report.as_ref().map_or("unknown", |report| report.source);
    let chain = report.map(|report| report.messages).unwrap_or_default();
    let detail = chain.first().map_or("no diagnostic available", String::as_str);
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        error!(
            target = "rehive::http::response",
            status = status.as_u16(),
            %method,
            %path,
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            request_id,
            "page failed to render",
        );
    } else {
        warn!(
            target = "rehive::http::response",
            status = status.as_u16(),
            %method,
            %path,
            elapsed_ms,
            source,
            detail,
            request_id,
            "page not served",
        );
    }

    response
}
