//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::Estimate;
use crate::estimator::{EstimateError, RouteService};
use crate::kv::KvStore;
use crate::positions::{PositionSource, SnapshotError};
use crate::trips::TripSource;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<K, F, R>(state: AppState<K, F, R>) -> Router
where
    K: KvStore,
    F: PositionSource + TripSource,
    R: RouteService,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([HeaderName::from_static("x-requested-with")]);

    Router::new()
        .route("/health", get(health))
        .route("/buses", get(list_buses::<K, F, R>))
        .route("/buses/:bus_id/estimate/:stop_id", get(estimate::<K, F, R>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All tracked vehicles with their trip metadata.
async fn list_buses<K, F, R>(
    State(state): State<AppState<K, F, R>>,
) -> Result<Json<BusInfoResponse>, AppError>
where
    K: KvStore,
    F: PositionSource + TripSource,
    R: RouteService,
{
    let info = state.buses.get_current_bus_info().await?;

    Ok(Json(BusInfoResponse {
        bus_info: info.vehicles,
        response_timestamp: Utc::now().timestamp(),
        sync_timestamp: info.sync_timestamp,
    }))
}

/// Minutes until a bus reaches a stop.
async fn estimate<K, F, R>(
    State(state): State<AppState<K, F, R>>,
    Path((bus_id, stop_id)): Path<(String, String)>,
) -> Result<Json<Estimate>, AppError>
where
    K: KvStore,
    F: PositionSource + TripSource,
    R: RouteService,
{
    let estimate = state
        .estimator
        .estimate_time_to_stop(&bus_id, &stop_id)
        .await?;

    Ok(Json(estimate))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<EstimateError> for AppError {
    fn from(e: EstimateError) -> Self {
        let message = e.to_string();
        match e {
            EstimateError::BusNotFound => AppError::NotFound { message },
            EstimateError::StopNotInPath => AppError::BadRequest { message },
            EstimateError::UnspecifiedEstimate | EstimateError::Snapshot(_) => {
                AppError::Internal { message }
            }
        }
    }
}

impl From<SnapshotError> for AppError {
    fn from(e: SnapshotError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
