//! Per-user dashboard summary

use axum::{extract::State, routing::get, Json, Router};
use ecofarm_common::db::{farms, monitoring, recommendations, MonitoringReading};
use serde::Serialize;
use uuid::Uuid;

use super::ActingUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub farm_count: i64,
    /// Across all farms of the user
    pub recommendation_count: i64,
    /// Newest farm, if the user has any
    pub latest_farm_id: Option<Uuid>,
    /// Most recent reading of the newest farm
    pub latest_reading: Option<MonitoringReading>,
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<DashboardResponse>> {
    let user_farms = farms::list_farms_for_user(&state.db, user_id).await?;
    let recommendation_count = recommendations::count_for_user(&state.db, user_id).await?;

    let newest = user_farms.first();
    let latest_reading = match newest {
        Some(farm) => monitoring::latest_reading(&state.db, farm.id).await?,
        None => None,
    };

    Ok(Json(DashboardResponse {
        farm_count: user_farms.len() as i64,
        recommendation_count,
        latest_farm_id: newest.map(|farm| farm.id),
        latest_reading,
    }))
}

/// Build dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}
