//! HTTP API handlers for ecofarm-api
//!
//! - `/functions/v1/*`: stateless function endpoints (weather, recommendations, chat)
//! - `/api/*`: farm-scoped resources, require an acting user
//! - `/health`: no user required

pub mod auth;
pub mod dashboard;
pub mod farms;
pub mod functions;
pub mod health;
pub mod monitoring;
pub mod recommendations;
pub mod support;

pub use auth::ActingUser;
pub use dashboard::dashboard_routes;
pub use farms::farm_routes;
pub use functions::function_routes;
pub use health::health_routes;
pub use monitoring::monitoring_routes;
pub use recommendations::recommendation_routes;
pub use support::support_routes;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, turning extractor rejections into the uniform error body
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Unwrap a path parameter; a malformed id becomes a 400 with the uniform body
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    path
        .map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
