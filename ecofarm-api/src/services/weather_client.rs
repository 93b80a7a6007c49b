//! OpenWeatherMap current-weather client
//!
//! `GET {base_url}/weather?q=<location>&appid=<key>&units=metric`

use async_trait::async_trait;
use ecofarm_common::{Error, Result};
use serde::Deserialize;

use crate::config::WeatherSettings;
use crate::models::WeatherObservation;
use crate::services::http::{build_client, ensure_success, send_with_retry};

const PROVIDER: &str = "OpenWeatherMap";

/// Source of current weather for a free-text location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, location: &str) -> Result<WeatherObservation>;
}

/// Subset of the current-weather payload we rely on
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: Option<String>,
    description: Option<String>,
}

impl CurrentWeatherResponse {
    /// Validate required fields and ranges
    fn into_observation(self) -> Result<WeatherObservation> {
        let main = self.main.ok_or_else(|| missing("main"))?;
        let temperature = main.temp.ok_or_else(|| missing("main.temp"))?;
        let humidity = main.humidity.ok_or_else(|| missing("main.humidity"))?;

        if !(0.0..=100.0).contains(&humidity) {
            return Err(Error::MalformedResponse(format!(
                "{} humidity {} outside [0, 100]",
                PROVIDER, humidity
            )));
        }

        let first = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| missing("weather[0]"))?;

        Ok(WeatherObservation {
            temperature,
            humidity,
            condition: first.main.ok_or_else(|| missing("weather[0].main"))?,
            description: first
                .description
                .ok_or_else(|| missing("weather[0].description"))?,
        })
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedResponse(format!("{} response missing {}", PROVIDER, field))
}

/// OpenWeatherMap API client
pub struct OpenWeatherClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(settings: &WeatherSettings) -> Result<Self> {
        Ok(Self {
            http_client: build_client(settings.timeout)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, location: &str) -> Result<WeatherObservation> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::Config("OPENWEATHER_API_KEY is not configured".to_string())
        })?;

        tracing::debug!(location, "Querying OpenWeatherMap");

        let request = self
            .http_client
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")]);

        let response = send_with_retry(request, PROVIDER).await?;
        let response = ensure_success(response, PROVIDER).await?;

        let payload: CurrentWeatherResponse = response.json().await.map_err(|e| {
            Error::MalformedResponse(format!("{} payload not valid JSON: {}", PROVIDER, e))
        })?;
        let observation = payload.into_observation()?;

        tracing::info!(
            location,
            temperature = observation.temperature,
            humidity = observation.humidity,
            condition = %observation.condition,
            "Weather lookup successful"
        );

        Ok(observation)
    }
}
