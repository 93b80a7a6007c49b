//! Function endpoints
//!
//! JSON request/response operations callable cross-origin. Each path also
//! answers `OPTIONS` with an empty 200 carrying the CORS headers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use super::json_body;
use crate::error::{ApiError, ApiResult, CHAT_FAILURE, RECOMMENDATION_FAILURE, WEATHER_FAILURE};
use crate::models::{
    ChatRequest, ChatResponse, DerivedReading, FetchWeatherRequest,
    GenerateRecommendationsRequest, RecommendationsResponse,
};
use crate::{AppState, CORS_ALLOWED_HEADERS};

/// OPTIONS on any function path
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(CORS_ALLOWED_HEADERS),
            ),
        ],
    )
}

/// POST /functions/v1/fetch-weather
///
/// Live weather for `location` plus derived soil values. Nothing is stored.
pub async fn fetch_weather(
    State(state): State<AppState>,
    payload: Result<Json<FetchWeatherRequest>, JsonRejection>,
) -> ApiResult<Json<DerivedReading>> {
    let request = json_body(payload)?;

    let reading = state
        .deriver
        .derive(&request.location)
        .await
        .map_err(ApiError::operation(WEATHER_FAILURE))?;

    Ok(Json(reading))
}

/// POST /functions/v1/generate-recommendations
///
/// Drafts for the posted farm and monitoring snapshot. Nothing is stored.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRecommendationsRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let request = json_body(payload)?;

    let recommendations = state
        .synthesizer
        .synthesize(&request.farm, request.monitoring.as_ref())
        .await
        .map_err(ApiError::operation(RECOMMENDATION_FAILURE))?;

    Ok(Json(RecommendationsResponse { recommendations }))
}

/// POST /functions/v1/chat
///
/// Relays the conversation verbatim and returns the single reply.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let request = json_body(payload)?;

    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }

    let response = state
        .chat
        .complete(&request.messages)
        .await
        .map_err(ApiError::operation(CHAT_FAILURE))?;

    Ok(Json(ChatResponse { response }))
}

/// Build function endpoint routes
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/fetch-weather",
            post(fetch_weather).options(preflight),
        )
        .route(
            "/functions/v1/generate-recommendations",
            post(generate_recommendations).options(preflight),
        )
        .route("/functions/v1/chat", post(chat).options(preflight))
}
