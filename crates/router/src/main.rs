//! Request router fronting the people and demography services.
//!
//! Every request under the shared path prefix is forwarded to whichever
//! backend origin owns the first path segment, with the prefix rewritten
//! away. The router adds no behavior of its own beyond logging each
//! forwarded request/response pair.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use shared::error::ApiError;
use tracing::{info, warn};

mod config;

use config::{load_settings, Settings};

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

struct RouterState {
    http: reqwest::Client,
    settings: Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let addr: SocketAddr = settings.bind_addr.parse()?;
    let state = Arc::new(RouterState {
        http: reqwest::Client::new(),
        settings,
    });
    let app = build_router(state);

    info!(%addr, "router listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<RouterState>) -> Router {
    Router::new().fallback(forward).with_state(state)
}

/// Picks the origin owning the first path segment after the prefix.
fn resolve_origin<'a>(settings: &'a Settings, path: &str) -> Option<(&'a str, String)> {
    let rest = path.strip_prefix(settings.path_prefix.as_str())?;
    if !rest.starts_with('/') {
        return None;
    }
    let segment = rest[1..].split('/').next().unwrap_or_default();
    match segment {
        "people" => Some((settings.people_origin.as_str(), rest.to_string())),
        "demography" => Some((settings.demography_origin.as_str(), rest.to_string())),
        _ => None,
    }
}

fn is_hop_by_hop(name: &header::HeaderName) -> bool {
    *name == header::HOST
        || *name == header::CONNECTION
        || *name == header::CONTENT_LENGTH
        || *name == header::TRANSFER_ENCODING
        || *name == header::UPGRADE
}

fn filtered_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiError::with_code(message, i64::from(status.as_u16()))),
    )
        .into_response()
}

async fn forward(State(state): State<Arc<RouterState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some((origin, rewritten)) = resolve_origin(&state.settings, &path) else {
        warn!(%path, "no service owns this path");
        return error_response(StatusCode::NOT_FOUND, "no service owns this path");
    };

    let mut target = format!("{origin}{rewritten}");
    if let Some(query) = parts.uri.query() {
        target.push('?');
        target.push_str(query);
    }

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%path, %error, "failed to read request body");
            return error_response(StatusCode::BAD_REQUEST, "failed to read request body");
        }
    };

    info!(method = %parts.method, %path, %target, "forwarding request");

    let upstream = state
        .http
        .request(parts.method.clone(), &target)
        .headers(filtered_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(error) => {
            warn!(%target, %error, "upstream unreachable");
            return error_response(StatusCode::BAD_GATEWAY, "upstream service unreachable");
        }
    };

    let status = upstream.status();
    let headers = filtered_headers(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%target, %error, "failed to read upstream body");
            return error_response(StatusCode::BAD_GATEWAY, "failed to read upstream response");
        }
    };

    info!(%path, %target, status = %status, "forwarded response");
    (status, headers, Bytes::from(bytes)).into_response()
}
