use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{authenticate, parse_request_context};
use crate::http::response::SubsonicError;
use crate::http::state::AppState;

/// Front door for every request: method check, credential parsing and
/// authentication run before any route is dispatched.
///
/// Every response, including rejections, asks the client to close the
/// connection afterwards.
pub async fn gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.config.verbose {
        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::info!("{} -> {} {}", remote, req.method(), req.uri());
    }

    let mut response = admit(&state, req, next).await;
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Query parameters keyed by name. When a name repeats, its first value wins.
/// A query string that fails to decode is treated as carrying no parameters.
fn query_params(uri: &Uri) -> HashMap<String, String> {
    let pairs: Vec<(String, String)> = Query::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();

    let mut params = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        params.entry(key).or_insert(value);
    }
    params
}

async fn admit(state: &AppState, req: Request, next: Next) -> Response {
    if req.method() != Method::GET && req.method() != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response();
    }

    let params = query_params(req.uri());

    // Subsonic answers protocol errors with HTTP 200 and an error body.
    let ctx = match parse_request_context(&params) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::debug!("Rejecting {}: {}", req.uri().path(), e);
            return SubsonicError::MissingParameter.into_response();
        }
    };

    if !authenticate(&ctx, &state.config) {
        tracing::debug!(
            "Authentication failed for user {:?} ({} {}, {:?})",
            ctx.user,
            ctx.client,
            ctx.version,
            ctx.auth_method()
        );
        return SubsonicError::Unauthorized.into_response();
    }

    next.run(req).await
}
