//! Request/response payloads for the function endpoints and the
//! snapshot types the synthesizer works from

use ecofarm_common::db::{
    Farm, MonitoringReading, NewMonitoringReading, NewRecommendation, RecommendationType,
};
use serde::{Deserialize, Serialize};

/// Current conditions as reported by the weather provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// °C
    pub temperature: f64,
    /// %, always within [0, 100]
    pub humidity: f64,
    /// Condition category, e.g. "Rain", "Clear", "Clouds"
    pub condition: String,
    pub description: String,
}

/// Full synthetic sensor reading derived from live weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedReading {
    pub temperature: f64,
    pub humidity: f64,
    pub weather_condition: String,
    pub description: String,
    /// %, within [30, 90]
    pub soil_moisture: f64,
    /// Within [6.0, 7.0]
    pub soil_ph: f64,
    /// Within [25, 39]
    pub nitrogen: i64,
    /// Within [12, 19]
    pub phosphorus: i64,
    /// Within [15, 24]
    pub potassium: i64,
}

impl DerivedReading {
    /// Reading to append to the monitoring store, stamped at insertion time
    pub fn to_new_reading(&self) -> NewMonitoringReading {
        NewMonitoringReading {
            recorded_at: None,
            temperature: Some(self.temperature),
            humidity: Some(self.humidity),
            soil_moisture: Some(self.soil_moisture),
            soil_ph: Some(self.soil_ph),
            nitrogen: Some(self.nitrogen),
            phosphorus: Some(self.phosphorus),
            potassium: Some(self.potassium),
            weather_condition: Some(self.weather_condition.clone()),
        }
    }
}

/// Farm fields the recommendation prompt embeds
///
/// Deserialized leniently: clients post whole farm rows and unknown fields
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub farm_name: String,
    pub location: String,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub area_size: Option<f64>,
}

impl From<&Farm> for FarmSnapshot {
    fn from(farm: &Farm) -> Self {
        Self {
            farm_name: farm.farm_name.clone(),
            location: farm.location.clone(),
            soil_type: farm.soil_type.map(|s| s.to_string()),
            crop_type: farm.crop_type.clone(),
            area_size: farm.area_size,
        }
    }
}

/// Monitoring fields the recommendation prompt embeds; any may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    #[serde(default)]
    pub soil_ph: Option<f64>,
    #[serde(default)]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    pub phosphorus: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
}

impl From<&MonitoringReading> for MonitoringSnapshot {
    fn from(reading: &MonitoringReading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            soil_moisture: reading.soil_moisture,
            soil_ph: reading.soil_ph,
            nitrogen: reading.nitrogen.map(|v| v as f64),
            phosphorus: reading.phosphorus.map(|v| v as f64),
            potassium: reading.potassium.map(|v| v as f64),
        }
    }
}

/// Typed recommendation before it is stamped with farm, author and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDraft {
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub content: String,
    pub confidence: f64,
}

impl RecommendationDraft {
    pub fn to_new(&self) -> NewRecommendation {
        NewRecommendation::new(self.recommendation_type, self.content.clone(), self.confidence)
    }
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// Function endpoint bodies
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FetchWeatherRequest {
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRecommendationsRequest {
    pub farm: FarmSnapshot,
    #[serde(default)]
    pub monitoring: Option<MonitoringSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendationDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_serializes_with_type_key() {
        let draft = RecommendationDraft {
            recommendation_type: RecommendationType::Irrigation,
            content: "Drip".to_string(),
            confidence: 0.88,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "irrigation");
        assert_eq!(json["confidence"], 0.88);
    }

    #[test]
    fn test_farm_snapshot_ignores_unknown_fields() {
        let snapshot: FarmSnapshot = serde_json::from_str(
            r#"{"id": "abc", "user_id": "u", "farm_name": "Mara", "location": "Narok",
                "soil_type": "loamy", "area_size": 3.0}"#,
        )
        .unwrap();
        assert_eq!(snapshot.farm_name, "Mara");
        assert_eq!(snapshot.soil_type.as_deref(), Some("loamy"));
        assert!(snapshot.crop_type.is_none());
    }

    #[test]
    fn test_generate_request_accepts_null_monitoring() {
        let request: GenerateRecommendationsRequest = serde_json::from_str(
            r#"{"farm": {"farm_name": "Mara", "location": "Narok"}, "monitoring": null}"#,
        )
        .unwrap();
        assert!(request.monitoring.is_none());
    }

    #[test]
    fn test_chat_role_wire_names() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "assistant", "content": "hi"}"#).unwrap();
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(
            serde_json::to_value(ChatMessage::user("x")).unwrap()["role"],
            "user"
        );
    }
}
