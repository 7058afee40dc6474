//! HTTP front end for the bulk engine.
//!
//! One route, `/api/bulk`, accepts every verb. The request's parameter
//! tree is assembled from the query string and the body, handed to the
//! [`Application`], and the merged document is returned as JSON.

use std::sync::Arc;

use axum::{
    Form, Router,
    body::Bytes,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::any,
};
use bulk_engine::{Application, BulkRequest, RequestGate, params};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use tracing::{debug, error};

/// Path the bulk endpoint is mounted at.
pub const BULK_PATH: &str = "/api/bulk";

/// Admits requests carrying `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerTokenGate {
    token: String,
}

impl BearerTokenGate {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl RequestGate for BearerTokenGate {
    fn allow(&self, request: &BulkRequest) -> bool {
        request
            .header(header::AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim().as_bytes().ct_eq(self.token.as_bytes()).into())
    }
}

/// Build the HTTP API router serving `app`.
pub fn build_router(app: Arc<Application>) -> Router {
    Router::new()
        .route(BULK_PATH, any(bulk_handler))
        .with_state(app)
}

async fn bulk_handler(State(app): State<Arc<Application>>, request: Request) -> Response {
    let method = request.method().clone();
    let headers = request.headers().clone();
    let tree = match read_params(request).await {
        Ok(tree) => tree,
        Err(status) => return status.into_response(),
    };

    let mut bulk = BulkRequest::new(method.as_str(), tree);
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            bulk = bulk.with_header(name.as_str(), value);
        }
    }

    let outcome = tokio::task::spawn_blocking(move || app.call(&bulk)).await;
    match outcome {
        Ok(Ok(document)) => Json(document).into_response(),
        Ok(Err(e)) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!("{} {} failed: {}", method, BULK_PATH, e);
            } else {
                debug!("{} {} rejected: {}", method, BULK_PATH, e);
            }
            status.into_response()
        }
        Err(e) => {
            error!("{} {} panicked: {}", method, BULK_PATH, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Query string first, then the body on top of it.
async fn read_params(request: Request) -> Result<Map<String, Value>, StatusCode> {
    let mut tree = match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(pairs)) => params::decode_pairs(pairs),
        Err(e) => {
            debug!("ignoring undecodable query string: {}", e);
            Map::new()
        }
    };

    if is_json(request.headers()) {
        let body = Bytes::from_request(request, &()).await.map_err(|e| {
            debug!("failed to read request body: {}", e);
            StatusCode::BAD_REQUEST
        })?;
        if let Some(body) = params::decode_json_body(&body) {
            params::merge_params(&mut tree, body);
        }
    } else if request.method() != Method::GET && is_form(request.headers()) {
        match Form::<Vec<(String, String)>>::from_request(request, &()).await {
            Ok(Form(pairs)) => params::merge_params(&mut tree, params::decode_pairs(pairs)),
            Err(e) => debug!("ignoring undecodable form body: {}", e),
        }
    }
    Ok(tree)
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE)?.to_str().ok()
}

/// Media type without parameters, lowercased.
fn media_type(headers: &HeaderMap) -> Option<String> {
    content_type(headers)
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
}

fn is_json(headers: &HeaderMap) -> bool {
    media_type(headers).is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

/// Matches what axum's `Form` extractor accepts.
fn is_form(headers: &HeaderMap) -> bool {
    content_type(headers).is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}
