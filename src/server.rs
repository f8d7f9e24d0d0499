//! REST surface for the AQI proxy
//!
//! Endpoints:
//! - `GET /api/aqi/city/{city}` - AQI record for a city, served from cache when fresh
//! - `GET /api/health` - Liveness plus cache occupancy
//!
//! Every other path answers with a JSON 404.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::data::AqiRecord;
use crate::service::{AqiService, Lookup, LookupError};

/// Shared state for request handlers
struct AppState {
    service: AqiService,
}

/// Successful city lookup body
#[derive(Debug, Serialize)]
struct CityResponse {
    status: &'static str,
    #[serde(flatten)]
    record: AqiRecord,
    cached: bool,
}

impl From<Lookup> for CityResponse {
    fn from(lookup: Lookup) -> Self {
        Self {
            status: "success",
            record: lookup.record,
            cached: lookup.cached,
        }
    }
}

/// Health check body
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache_size: usize,
    max_cache_entries: usize,
    cache_ttl_seconds: i64,
    timestamp: String,
}

/// Error body shared by every failure response
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

/// An error mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        let status = match &err {
            LookupError::InvalidKey => StatusCode::BAD_REQUEST,
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
            LookupError::Fetch(_) | LookupError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Builds the router over a lookup service
pub fn build_router(service: AqiService, enable_cors: bool) -> Router {
    let state = Arc::new(AppState { service });

    let app = Router::new()
        .route("/api/aqi/city/{city}", get(get_aqi_by_city))
        .route("/api/health", get(health_check))
        .fallback(not_found)
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Serves `router` on `addr` until `shutdown` resolves
pub async fn serve<F>(router: Router, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("AQI proxy listening on {}", listener.local_addr()?);
    tracing::info!("API endpoint: http://{}/api/aqi/city/<city_name>", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_aqi_by_city(
    State(state): State<Arc<AppState>>,
    city: Result<Path<String>, PathRejection>,
) -> Result<Json<CityResponse>, ApiError> {
    let Path(city) = city.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected city path segment");
        ApiError::from(LookupError::InvalidKey)
    })?;
    let lookup = state.service.lookup(&city).await?;
    Ok(Json(lookup.into()))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache = state.service.cache();
    Json(HealthResponse {
        status: "healthy",
        cache_size: cache.size().await,
        max_cache_entries: cache.capacity(),
        cache_ttl_seconds: cache.ttl().num_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found")
}
