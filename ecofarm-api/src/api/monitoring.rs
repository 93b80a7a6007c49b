//! Monitoring endpoints
//!
//! Readings are listed through the owning farm; a farm the acting user
//! does not own answers 404 on every route here.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ecofarm_common::db::{
    farms, monitoring::{self, DEFAULT_HISTORY_LIMIT}, MonitoringReading, NewMonitoringReading,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{json_body, path_param, query_params, ActingUser};
use crate::error::{ApiError, ApiResult, WEATHER_FAILURE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// GET /api/farms/:id/monitoring?limit=N
///
/// The N most recent readings, oldest first (default 20).
pub async fn reading_history(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<MonitoringReading>>> {
    let farm_id = path_param(farm_id)?;
    let params = query_params(params)?;
    farms::get_farm_for_user(&state.db, farm_id, user_id).await?;

    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(
        monitoring::reading_history(&state.db, farm_id, limit).await?,
    ))
}

/// POST /api/farms/:id/monitoring
///
/// Manual ingestion; values are range-checked.
pub async fn append_reading(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewMonitoringReading>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MonitoringReading>)> {
    let farm_id = path_param(farm_id)?;
    let reading = json_body(payload)?;
    reading.validate()?;
    farms::get_farm_for_user(&state.db, farm_id, user_id).await?;

    let stored = monitoring::insert_reading(&state.db, farm_id, &reading).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/farms/:id/monitoring/latest
///
/// `null` when the farm has no readings yet.
pub async fn latest_reading(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Option<MonitoringReading>>> {
    let farm_id = path_param(farm_id)?;
    farms::get_farm_for_user(&state.db, farm_id, user_id).await?;
    Ok(Json(monitoring::latest_reading(&state.db, farm_id).await?))
}

/// POST /api/farms/:id/monitoring/refresh
///
/// Derive a reading from live weather at the farm's location and append it.
pub async fn refresh_reading(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<(StatusCode, Json<MonitoringReading>)> {
    let farm_id = path_param(farm_id)?;
    let farm = farms::get_farm_for_user(&state.db, farm_id, user_id).await?;

    let derived = state
        .deriver
        .derive(&farm.location)
        .await
        .map_err(ApiError::operation(WEATHER_FAILURE))?;

    let stored = monitoring::insert_reading(&state.db, farm.id, &derived.to_new_reading())
        .await
        .map_err(ApiError::operation(WEATHER_FAILURE))?;

    tracing::info!(
        farm_id = %farm.id,
        reading_id = %stored.id,
        condition = %derived.weather_condition,
        "Monitoring reading refreshed from weather"
    );

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Build monitoring routes
pub fn monitoring_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/farms/:id/monitoring",
            get(reading_history).post(append_reading),
        )
        .route("/api/farms/:id/monitoring/latest", get(latest_reading))
        .route("/api/farms/:id/monitoring/refresh", post(refresh_reading))
}
