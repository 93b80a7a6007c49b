//! Recommendation endpoints

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ecofarm_common::db::{farms, recommendations, Recommendation};
use uuid::Uuid;

use super::{path_param, ActingUser};
use crate::error::{ApiError, ApiResult, RECOMMENDATION_FAILURE};
use crate::AppState;

/// GET /api/farms/:id/recommendations
///
/// Newest batch first; records of one batch keep their generation order.
pub async fn list_recommendations(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Recommendation>>> {
    let farm_id = path_param(farm_id)?;
    farms::get_farm_for_user(&state.db, farm_id, user_id).await?;
    Ok(Json(recommendations::list_for_farm(&state.db, farm_id).await?))
}

/// POST /api/farms/:id/recommendations/generate
///
/// Synthesizes from the farm's latest reading and stores the batch.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    farm_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<(StatusCode, Json<Vec<Recommendation>>)> {
    let farm_id = path_param(farm_id)?;
    let farm = farms::get_farm_for_user(&state.db, farm_id, user_id).await?;

    let stored = state
        .synthesizer
        .generate_for_farm(&state.db, &farm, user_id)
        .await
        .map_err(ApiError::operation(RECOMMENDATION_FAILURE))?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Build recommendation routes
pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/farms/:id/recommendations", get(list_recommendations))
        .route(
            "/api/farms/:id/recommendations/generate",
            post(generate_recommendations),
        )
}
