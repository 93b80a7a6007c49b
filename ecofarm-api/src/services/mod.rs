//! Provider clients and the derivation/synthesis pipeline

pub mod http;
pub mod llm_client;
pub mod recommendation_synthesizer;
pub mod soil_deriver;
pub mod weather_client;

pub use llm_client::{ChatCompleter, LlmClient};
pub use recommendation_synthesizer::RecommendationSynthesizer;
pub use soil_deriver::{RandSource, SoilDeriver, UniformSource};
pub use weather_client::{OpenWeatherClient, WeatherProvider};
