//! Farm registry endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ecofarm_common::db::{farms, Farm, FarmInput};
use uuid::Uuid;

use super::{json_body, path_param, ActingUser};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/farms
///
/// Farms of the acting user, newest first.
pub async fn list_farms(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<Farm>>> {
    Ok(Json(farms::list_farms_for_user(&state.db, user_id).await?))
}

/// POST /api/farms
pub async fn create_farm(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    payload: Result<Json<FarmInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Farm>)> {
    let input = json_body(payload)?;
    let farm = farms::create_farm(&state.db, user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(farm)))
}

/// GET /api/farms/:id
pub async fn get_farm(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Farm>> {
    let farm_id = path_param(farm_id)?;
    Ok(Json(
        farms::get_farm_for_user(&state.db, farm_id, user_id).await?,
    ))
}

/// PUT /api/farms/:id
///
/// Replaces the editable fields and bumps `updated_at`.
pub async fn update_farm(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<FarmInput>, JsonRejection>,
) -> ApiResult<Json<Farm>> {
    let farm_id = path_param(farm_id)?;
    let input = json_body(payload)?;
    Ok(Json(
        farms::update_farm(&state.db, farm_id, user_id, &input).await?,
    ))
}

/// Build farm registry routes
pub fn farm_routes() -> Router<AppState> {
    Router::new()
        .route("/api/farms", get(list_farms).post(create_farm))
        .route("/api/farms/:id", get(get_farm).put(update_farm))
}
