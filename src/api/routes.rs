use crate::api::server::AppState;
use crate::update::{UpdateOutcome, UpdateRequest};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

const API_TIMEOUT: Duration = Duration::from_secs(60);

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/update", any(native_update))
        .route("/nic/update", any(legacy_update))
        .fallback(unknown_route)
        .layer(TimeoutLayer::new(API_TIMEOUT))
        .layer(axum::middleware::from_fn(super::logging::log_requests))
        .with_state(state)
}

/// Which wire dialect a request arrived on. Both dialects share the whole
/// pipeline; this descriptor only names the query parameters and renders the
/// outcome, so behavior can't drift between them.
#[derive(Clone, Copy)]
enum Dialect {
    /// `/update` — JSON responses, errors on HTTP status codes.
    Native,
    /// `/nic/update` — dyndns2-style plaintext tokens, client errors mostly on 200.
    Legacy,
}

type Params = Result<Query<HashMap<String, String>>, QueryRejection>;

async fn native_update(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    params: Params,
) -> Response {
    dispatch(Dialect::Native, &state, &method, &headers, params).await
}

async fn legacy_update(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    params: Params,
) -> Response {
    dispatch(Dialect::Legacy, &state, &method, &headers, params).await
}

#[allow(clippy::unused_async)]
async fn unknown_route() -> Response {
    json_error(StatusCode::NOT_FOUND, "not found")
}

async fn dispatch(
    dialect: Dialect,
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    params: Params,
) -> Response {
    if *method != Method::GET {
        return dialect.bad_method();
    }

    let params = match params {
        Ok(Query(params)) => params,
        Err(_) => HashMap::new(),
    };
    let Some(host) = non_empty(&params, dialect.host_param()) else {
        return dialect.missing_param(dialect.host_param());
    };
    let Some(ip) = non_empty(&params, dialect.ip_param()) else {
        return dialect.missing_param(dialect.ip_param());
    };

    // A malformed Authorization header is treated as absent credentials; the
    // domain lookup still happens first, inside the updater.
    let (username, password) = basic_auth(headers).unwrap_or_default();
    let req = UpdateRequest {
        host,
        ip,
        username,
        password,
    };
    dialect.render(&state.updater.apply(&req).await)
}

impl Dialect {
    fn host_param(self) -> &'static str {
        match self {
            Self::Native => "host",
            Self::Legacy => "hostname",
        }
    }

    fn ip_param(self) -> &'static str {
        match self {
            Self::Native => "ip",
            Self::Legacy => "myip",
        }
    }

    /// The legacy protocol signals client errors with 200-status tokens.
    fn bad_method(self) -> Response {
        match self {
            Self::Native => json_error(StatusCode::NOT_FOUND, "not found"),
            Self::Legacy => plain(StatusCode::OK, "badagent"),
        }
    }

    fn missing_param(self, name: &str) -> Response {
        match self {
            Self::Native => json_error(
                StatusCode::BAD_REQUEST,
                &format!("missing parameter '{name}'"),
            ),
            Self::Legacy => plain(StatusCode::OK, "badagent"),
        }
    }

    fn render(self, outcome: &UpdateOutcome) -> Response {
        match self {
            Self::Native => match outcome {
                UpdateOutcome::Updated { ip } => json_ok(ip),
                UpdateOutcome::BadRequest { detail } => {
                    json_error(StatusCode::BAD_REQUEST, detail)
                }
                UpdateOutcome::NoSuchDomain => json_error(StatusCode::NOT_FOUND, "not found"),
                UpdateOutcome::Unauthorized => {
                    json_error(StatusCode::UNAUTHORIZED, "unauthorized")
                }
                UpdateOutcome::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden"),
                UpdateOutcome::Upstream { detail } => {
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, detail)
                }
            },
            Self::Legacy => match outcome {
                UpdateOutcome::Updated { ip } => plain(StatusCode::OK, &format!("good {ip}")),
                UpdateOutcome::BadRequest { .. } => plain(StatusCode::OK, "badagent"),
                UpdateOutcome::NoSuchDomain => plain(StatusCode::OK, "nohost"),
                UpdateOutcome::Unauthorized => plain(StatusCode::UNAUTHORIZED, "badauth"),
                UpdateOutcome::Forbidden => plain(StatusCode::FORBIDDEN, "badauth"),
                UpdateOutcome::Upstream { .. } => {
                    plain(StatusCode::INTERNAL_SERVER_ERROR, "911")
                }
            },
        }
    }
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn json_ok(ip: &str) -> Response {
    (
        StatusCode::OK,
        Json(StatusBody {
            status: "ok",
            ip: Some(ip),
            error: None,
        }),
    )
        .into_response()
}

fn json_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(StatusBody {
            status: "error",
            ip: None,
            error: Some(error),
        }),
    )
        .into_response()
}

fn plain(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("{body}\n"),
    )
        .into_response()
}

fn non_empty(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name).filter(|v| !v.is_empty()).cloned()
}

/// Decode `Authorization: Basic base64(username:password)`. Any malformed
/// header (wrong scheme, bad base64, missing colon) reads as no credentials.
fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
