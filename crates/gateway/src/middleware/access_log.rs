//! One-line access log per request
//!
//! Format: `METHOD URI STATUS LENGTH - LATENCY ms`, the same shape as the
//! classic "tiny" access log. Request metrics are recorded alongside.

use axum::{
    body::HttpBody,
    extract::Request,
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use pastpapers_common::metrics::RequestMetrics;

/// Access log middleware
pub async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default();

    let metrics = RequestMetrics::start(method.as_str());
    let response = next.run(request).await;

    let status = response.status().as_u16();
    let length = response_length(&response);
    let latency_ms = metrics.elapsed_ms();

    tracing::info!(
        target: "access",
        request_id = %request_id,
        "{} {} {} {} - {:.3} ms",
        method,
        uri,
        status,
        length,
        latency_ms
    );

    metrics.finish(status);
    response
}

fn response_length(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| response.body().size_hint().exact().map(|n| n.to_string()))
        .unwrap_or_else(|| "-".to_string())
}
