//! Lookup API Server
//!
//! HTTP surface over the resolver: the caller's own address on `/`, an
//! explicit address on `/ip?ip=`, and a health check.

use crate::application::Resolver;
use crate::domain::entities::ResolutionResult;
use crate::domain::services::{AddressNormalizer, InvalidAddress};
use crate::domain::value_objects::Address;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Query string of `/ip`.
#[derive(Debug, Deserialize)]
pub struct IpQuery {
    pub ip: Option<String>,
}

/// Successful lookup response.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub ip: String,
    pub city: String,
    pub isp: String,
    pub database: String,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Request failures and the status each one maps to.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing ip parameter")]
    MissingParameter,

    #[error("invalid IP address format")]
    InvalidAddress,

    #[error("path not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::InvalidAddress => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidAddress> for ApiError {
    fn from(_: InvalidAddress) -> Self {
        Self::InvalidAddress
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(msg) = &self {
            tracing::error!("request failed: {}", msg);
        }
        json_response(
            self.status(),
            &ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<Resolver>,
    /// Honour `CF-Connecting-IP` ahead of the other forwarding headers
    pub trust_cf_connecting_ip: bool,
}

impl ApiState {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self {
            resolver,
            trust_cf_connecting_ip: false,
        }
    }

    pub fn with_trust_cf_connecting_ip(mut self, trust: bool) -> Self {
        self.trust_cf_connecting_ip = trust;
        self
    }

    fn lookup_response(&self, result: ResolutionResult) -> LookupResponse {
        let database = self.resolver.database_label(&result);
        tracing::info!(
            "resolved {}: {} / {} ({})",
            result.ip,
            result.location,
            result.operator,
            database
        );
        LookupResponse {
            ip: result.ip,
            city: result.location,
            isp: result.operator,
            database: database.to_string(),
        }
    }
}

/// HTTP API server.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: impl Into<String>, state: ApiState) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state,
        }
    }

    /// Build the router with CORS and request tracing applied.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the API server until `shutdown` fires, then drain in-flight
    /// requests.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!(
            "IP lookup API listening on {} ({})",
            listener.local_addr()?,
            self.state.resolver.backend_label()
        );

        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("IP lookup API stopped");
        Ok(())
    }
}

/// Router over the given state.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Caller's own address
        .route("/", get(index_handler))
        // Explicit address
        .route("/ip", get(ip_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pretty-printed JSON with an explicit charset.
fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string_pretty(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], json).into_response(),
        Err(e) => {
            tracing::error!("failed to serialize response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Pick the caller's address.
///
/// Order: `CF-Connecting-IP` (only when trusted), first `X-Forwarded-For`
/// entry, `X-Real-IP`, socket peer. Header values that do not parse fall
/// through to the next source.
pub fn client_address(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_cf_connecting_ip: bool,
) -> Option<Address> {
    let mut candidates = Vec::with_capacity(3);
    if trust_cf_connecting_ip {
        candidates.extend(header_str(headers, "cf-connecting-ip"));
    }
    candidates.extend(header_str(headers, "x-forwarded-for").and_then(|v| v.split(',').next()));
    candidates.extend(header_str(headers, "x-real-ip"));

    for candidate in candidates {
        match AddressNormalizer::normalize(candidate) {
            Ok(addr) => return Some(addr),
            Err(e) => tracing::debug!("ignoring forwarded address: {}", e),
        }
    }

    peer.map(Address::from_ip)
}

// Handler functions

async fn index_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<Response, ApiError> {
    let peer_ip = peer.map(|ConnectInfo(addr)| addr.ip());
    let addr = client_address(&headers, peer_ip, state.trust_cf_connecting_ip)
        .ok_or_else(|| ApiError::Internal("unable to determine client address".to_string()))?;

    let result = state.resolver.resolve(&addr);
    Ok(json_response(StatusCode::OK, &state.lookup_response(result)))
}

async fn ip_handler(
    State(state): State<ApiState>,
    Query(query): Query<IpQuery>,
) -> Result<Response, ApiError> {
    let raw = query
        .ip
        .filter(|ip| !ip.trim().is_empty())
        .ok_or(ApiError::MissingParameter)?;

    let result = state.resolver.resolve_text(&raw)?;
    Ok(json_response(StatusCode::OK, &state.lookup_response(result)))
}

async fn health_handler(State(state): State<ApiState>) -> Response {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: state.resolver.backend_label().to_string(),
    };
    json_response(StatusCode::OK, &response)
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}
