//! ecofarm-api library interface
//!
//! Exposes the router and state so integration tests can drive the service
//! with stand-in providers.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{HeaderName, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{LlmSettings, WeatherSettings};
use crate::services::{
    ChatCompleter, LlmClient, OpenWeatherClient, RecommendationSynthesizer, SoilDeriver,
};

/// Request headers browsers may send cross-origin to the function endpoints
pub const CORS_ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub deriver: Arc<SoilDeriver>,
    pub synthesizer: Arc<RecommendationSynthesizer>,
    /// Chat relay; the same completer the synthesizer uses
    pub chat: Arc<dyn ChatCompleter>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, deriver: SoilDeriver, chat: Arc<dyn ChatCompleter>) -> Self {
        Self {
            db,
            deriver: Arc::new(deriver),
            synthesizer: Arc::new(RecommendationSynthesizer::new(chat.clone())),
            chat,
            startup_time: Utc::now(),
        }
    }

    /// State wired to the real weather and chat-completion providers
    pub fn with_providers(
        db: SqlitePool,
        weather: &WeatherSettings,
        llm: &LlmSettings,
    ) -> ecofarm_common::Result<Self> {
        let deriver = SoilDeriver::with_entropy(Arc::new(OpenWeatherClient::new(weather)?));
        let chat: Arc<dyn ChatCompleter> = Arc::new(LlmClient::new(llm)?);
        Ok(Self::new(db, deriver, chat))
    }
}

fn cors_layer() -> CorsLayer {
    let headers: Vec<HeaderName> = CORS_ALLOWED_HEADERS
        .split(", ")
        .map(HeaderName::from_static)
        .chain(std::iter::once(HeaderName::from_static(
            api::auth::USER_ID_HEADER,
        )))
        .collect();

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(headers)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::function_routes())
        .merge(api::farm_routes())
        .merge(api::monitoring_routes())
        .merge(api::recommendation_routes())
        .merge(api::support_routes())
        .merge(api::dashboard_routes())
        .merge(api::health_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
