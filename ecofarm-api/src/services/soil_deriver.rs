//! Weather-to-soil deriver
//!
//! Turns live weather for a location into a full synthetic sensor reading.
//!
//! **Derivation:**
//! - soil_moisture = clamp(humidity × 0.7 + adj, 30, 90), adj = +15 when the
//!   condition contains "Rain", −10 when it contains "Clear", else 0
//!   (case-sensitive substring match)
//! - soil_ph = 6.5 + U(−0.5, 0.5)
//! - nitrogen = ⌊25 + U(0, 15)⌋, phosphorus = ⌊12 + U(0, 8)⌋,
//!   potassium = ⌊15 + U(0, 10)⌋
//!
//! Every output is clamped to its range afterwards, so the bounds hold for
//! any [`UniformSource`], including ones that return the upper endpoint.

use ecofarm_common::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::{DerivedReading, WeatherObservation};
use crate::services::weather_client::WeatherProvider;

pub const SOIL_MOISTURE_RANGE: (f64, f64) = (30.0, 90.0);
pub const SOIL_PH_RANGE: (f64, f64) = (6.0, 7.0);
pub const NITROGEN_RANGE: (i64, i64) = (25, 39);
pub const PHOSPHORUS_RANGE: (i64, i64) = (12, 19);
pub const POTASSIUM_RANGE: (i64, i64) = (15, 24);

/// Source of uniformly distributed reals
pub trait UniformSource {
    /// A value in `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// [`UniformSource`] backed by a `rand` generator
pub struct RandSource<R: Rng = StdRng> {
    rng: R,
}

impl RandSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for tests and reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> UniformSource for RandSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }
}

/// Moisture shift implied by the provider's condition category
fn condition_adjustment(condition: &str) -> f64 {
    if condition.contains("Rain") {
        15.0
    } else if condition.contains("Clear") {
        -10.0
    } else {
        0.0
    }
}

/// Soil moisture (%) for a humidity and condition
pub fn soil_moisture(humidity: f64, condition: &str) -> f64 {
    let (min, max) = SOIL_MOISTURE_RANGE;
    (humidity * 0.7 + condition_adjustment(condition)).clamp(min, max)
}

fn nutrient(base: f64, spread: f64, range: (i64, i64), random: &mut dyn UniformSource) -> i64 {
    let value = (base + random.uniform(0.0, spread)).floor() as i64;
    value.clamp(range.0, range.1)
}

/// Derive a full reading from one weather observation
///
/// Draw order from `random`: pH, nitrogen, phosphorus, potassium.
pub fn derive_reading(
    observation: &WeatherObservation,
    random: &mut dyn UniformSource,
) -> DerivedReading {
    let (ph_min, ph_max) = SOIL_PH_RANGE;
    let soil_ph = (6.5 + random.uniform(-0.5, 0.5)).clamp(ph_min, ph_max);
    let nitrogen = nutrient(25.0, 15.0, NITROGEN_RANGE, random);
    let phosphorus = nutrient(12.0, 8.0, PHOSPHORUS_RANGE, random);
    let potassium = nutrient(15.0, 10.0, POTASSIUM_RANGE, random);

    DerivedReading {
        temperature: observation.temperature,
        humidity: observation.humidity,
        weather_condition: observation.condition.clone(),
        description: observation.description.clone(),
        soil_moisture: soil_moisture(observation.humidity, &observation.condition),
        soil_ph,
        nitrogen,
        phosphorus,
        potassium,
    }
}

/// Fetches weather and derives readings; nothing is persisted here
pub struct SoilDeriver {
    provider: Arc<dyn WeatherProvider>,
    random: Mutex<Box<dyn UniformSource + Send>>,
}

impl SoilDeriver {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        random: impl UniformSource + Send + 'static,
    ) -> Self {
        Self {
            provider,
            random: Mutex::new(Box::new(random)),
        }
    }

    /// Production deriver with an entropy-seeded generator
    pub fn with_entropy(provider: Arc<dyn WeatherProvider>) -> Self {
        Self::new(provider, RandSource::from_entropy())
    }

    /// Fetch current weather for `location` and derive a reading
    ///
    /// **Errors:** `InvalidInput` for a blank location, otherwise whatever
    /// the provider reports (`Config`, `UpstreamUnavailable`, `MalformedResponse`).
    pub async fn derive(&self, location: &str) -> Result<DerivedReading> {
        if location.trim().is_empty() {
            return Err(Error::InvalidInput("location must not be empty".to_string()));
        }

        let observation = self.provider.current_weather(location).await?;

        // Lock taken after the await and released before returning
        let mut random = self.random.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = derive_reading(&observation, &mut **random);
        drop(random);

        tracing::debug!(
            location,
            soil_moisture = reading.soil_moisture,
            soil_ph = reading.soil_ph,
            "Derived soil reading"
        );

        Ok(reading)
    }
}
