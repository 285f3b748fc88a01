//! Request logging: one structured line per completed request.
//!
//! The response body is buffered so the logged byte count and status reflect
//! what was actually written, not what the handler intended.

use axum::body::{boxed, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Instant;

pub(super) async fn log_requests(req: Request<Body>, next: Next<Body>) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let (parts, body) = response.into_parts();
    let bytes = hyper::body::to_bytes(body).await.unwrap_or_default();
    tracing::info!(
        %method,
        %uri,
        %remote,
        %user_agent,
        elapsed = ?start.elapsed(),
        status,
        bytes = bytes.len(),
        "request"
    );
    Response::from_parts(parts, boxed(Body::from(bytes)))
}
