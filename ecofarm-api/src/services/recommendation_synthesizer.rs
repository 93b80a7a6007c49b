//! Recommendation synthesizer
//!
//! Builds the agronomy prompt from a farm and its latest reading, asks the
//! chat completer once, and shapes the reply into three typed records:
//!
//! | # | type       | content                      | confidence |
//! |---|------------|------------------------------|------------|
//! | 1 | crop       | model reply, verbatim        | 0.85       |
//! | 2 | fertilizer | fixed fertilizer advice      | 0.90       |
//! | 3 | irrigation | fixed irrigation advice      | 0.88       |
//!
//! The reply is not parsed even though the prompt asks for JSON entries in
//! four categories; `pest_control` is never produced.

use ecofarm_common::db::{monitoring, recommendations, Farm, Recommendation, RecommendationType};
use ecofarm_common::Result;
use sqlx::SqlitePool;
use std::fmt::Display;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{ChatMessage, FarmSnapshot, MonitoringSnapshot, RecommendationDraft};
use crate::services::llm_client::ChatCompleter;

pub const CROP_CONFIDENCE: f64 = 0.85;
pub const FERTILIZER_ADVICE: &str = "Apply balanced NPK fertilizer based on soil test results";
pub const FERTILIZER_CONFIDENCE: f64 = 0.90;
pub const IRRIGATION_ADVICE: &str = "Implement drip irrigation for water efficiency";
pub const IRRIGATION_CONFIDENCE: f64 = 0.88;

/// Placeholder for any value the prompt cannot fill
const NOT_AVAILABLE: &str = "N/A";

fn or_na<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Render the recommendation prompt
///
/// Absent monitoring, or any absent field, renders as `N/A`.
pub fn build_prompt(farm: &FarmSnapshot, monitoring: Option<&MonitoringSnapshot>) -> String {
    let empty = MonitoringSnapshot::default();
    let m = monitoring.unwrap_or(&empty);

    format!(
        "Based on the following farm data, provide 3-4 specific agricultural recommendations:\n\
         \n\
         Farm: {farm_name}\n\
         Location: {location}\n\
         Soil Type: {soil_type}\n\
         Current Crop: {crop_type}\n\
         Area: {area} hectares\n\
         \n\
         Recent Monitoring Data:\n\
         - Temperature: {temperature}°C\n\
         - Humidity: {humidity}%\n\
         - Soil Moisture: {soil_moisture}%\n\
         - Soil pH: {soil_ph}\n\
         - NPK: N={n}, P={p}, K={k}\n\
         \n\
         Provide recommendations for: crop selection, fertilizer application, irrigation schedule, and pest control.\n\
         Format each as JSON: {{type: \"crop|fertilizer|irrigation|pest_control\", content: \"detailed recommendation\", confidence: 0-1}}",
        farm_name = farm.farm_name,
        location = farm.location,
        soil_type = or_na(farm.soil_type.as_deref()),
        crop_type = or_na(farm.crop_type.as_deref()),
        area = or_na(farm.area_size),
        temperature = or_na(m.temperature),
        humidity = or_na(m.humidity),
        soil_moisture = or_na(m.soil_moisture),
        soil_ph = or_na(m.soil_ph),
        n = or_na(m.nitrogen),
        p = or_na(m.phosphorus),
        k = or_na(m.potassium),
    )
}

/// Shape a model reply into the fixed three-record set
pub fn drafts_from_reply(reply: String) -> Vec<RecommendationDraft> {
    vec![
        RecommendationDraft {
            recommendation_type: RecommendationType::Crop,
            content: reply,
            confidence: CROP_CONFIDENCE,
        },
        RecommendationDraft {
            recommendation_type: RecommendationType::Fertilizer,
            content: FERTILIZER_ADVICE.to_string(),
            confidence: FERTILIZER_CONFIDENCE,
        },
        RecommendationDraft {
            recommendation_type: RecommendationType::Irrigation,
            content: IRRIGATION_ADVICE.to_string(),
            confidence: IRRIGATION_CONFIDENCE,
        },
    ]
}

/// Turns farm state into recommendation records via one chat completion
pub struct RecommendationSynthesizer {
    completer: Arc<dyn ChatCompleter>,
}

impl RecommendationSynthesizer {
    pub fn new(completer: Arc<dyn ChatCompleter>) -> Self {
        Self { completer }
    }

    /// Prompt the model and return drafts without persisting anything
    pub async fn synthesize(
        &self,
        farm: &FarmSnapshot,
        monitoring: Option<&MonitoringSnapshot>,
    ) -> Result<Vec<RecommendationDraft>> {
        let prompt = build_prompt(farm, monitoring);

        tracing::debug!(
            farm = %farm.farm_name,
            has_monitoring = monitoring.is_some(),
            "Requesting recommendations"
        );

        let reply = self.completer.complete(&[ChatMessage::user(prompt)]).await?;
        Ok(drafts_from_reply(reply))
    }

    /// Generate and store recommendations for a stored farm
    ///
    /// **Algorithm:**
    /// 1. Load the farm's latest reading (may be none)
    /// 2. Synthesize drafts
    /// 3. Insert all drafts in one transaction, stamped with farm, acting user and `pending`
    ///
    /// A failure in any step leaves no recommendation rows behind.
    pub async fn generate_for_farm(
        &self,
        pool: &SqlitePool,
        farm: &Farm,
        acting_user: Uuid,
    ) -> Result<Vec<Recommendation>> {
        let latest = monitoring::latest_reading(pool, farm.id).await?;
        let snapshot = latest.as_ref().map(MonitoringSnapshot::from);

        let drafts = self
            .synthesize(&FarmSnapshot::from(farm), snapshot.as_ref())
            .await?;
        let batch: Vec<_> = drafts.iter().map(RecommendationDraft::to_new).collect();

        let stored = recommendations::insert_batch(pool, farm.id, acting_user, &batch).await?;

        tracing::info!(
            farm_id = %farm.id,
            count = stored.len(),
            "Recommendations generated"
        );

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ecofarm_common::db::{
        self, farms, FarmInput, NewMonitoringReading, RecommendationStatus, SoilType,
    };
    use ecofarm_common::Error;
    use std::sync::Mutex;

    /// Records prompts and answers with a canned reply
    struct ScriptedCompleter {
        reply: Result<String>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedCompleter {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(Error::UpstreamUnavailable("gateway down".to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatCompleter for ScriptedCompleter {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::UpstreamUnavailable(e.to_string())),
            }
        }
    }

    fn farm_snapshot() -> FarmSnapshot {
        FarmSnapshot {
            farm_name: "Rift Valley Plot".to_string(),
            location: "Eldoret".to_string(),
            soil_type: Some("loamy".to_string()),
            crop_type: Some("maize".to_string()),
            area_size: Some(12.5),
        }
    }

    #[test]
    fn test_prompt_embeds_farm_and_monitoring() {
        let monitoring = MonitoringSnapshot {
            temperature: Some(24.3),
            humidity: Some(61.0),
            soil_moisture: Some(52.7),
            soil_ph: Some(6.4),
            nitrogen: Some(31.0),
            phosphorus: Some(14.0),
            potassium: Some(20.0),
        };

        let prompt = build_prompt(&farm_snapshot(), Some(&monitoring));
        assert!(prompt.starts_with(
            "Based on the following farm data, provide 3-4 specific agricultural recommendations:\n\nFarm: Rift Valley Plot\n"
        ));
        assert!(prompt.contains("Location: Eldoret\n"));
        assert!(prompt.contains("Soil Type: loamy\n"));
        assert!(prompt.contains("Current Crop: maize\n"));
        assert!(prompt.contains("Area: 12.5 hectares\n"));
        assert!(prompt.contains("- Temperature: 24.3°C\n"));
        assert!(prompt.contains("- Humidity: 61%\n"));
        assert!(prompt.contains("- Soil Moisture: 52.7%\n"));
        assert!(prompt.contains("- Soil pH: 6.4\n"));
        assert!(prompt.contains("- NPK: N=31, P=14, K=20\n"));
        assert!(prompt.contains(
            "crop selection, fertilizer application, irrigation schedule, and pest control."
        ));
        assert!(prompt.ends_with(
            "{type: \"crop|fertilizer|irrigation|pest_control\", content: \"detailed recommendation\", confidence: 0-1}"
        ));
    }

    #[test]
    fn test_prompt_without_monitoring_uses_na() {
        let mut farm = farm_snapshot();
        farm.crop_type = None;
        farm.area_size = None;

        let prompt = build_prompt(&farm, None);
        assert!(prompt.contains("Current Crop: N/A\n"));
        assert!(prompt.contains("Area: N/A hectares\n"));
        assert!(prompt.contains("- Temperature: N/A°C\n"));
        assert!(prompt.contains("- NPK: N=N/A, P=N/A, K=N/A\n"));
    }

    #[test]
    fn test_drafts_fixed_shape() {
        let drafts = drafts_from_reply("Rotate with beans".to_string());

        let types: Vec<_> = drafts.iter().map(|d| d.recommendation_type).collect();
        assert_eq!(
            types,
            vec![
                RecommendationType::Crop,
                RecommendationType::Fertilizer,
                RecommendationType::Irrigation
            ]
        );
        assert_eq!(drafts[0].content, "Rotate with beans");
        assert_eq!(drafts[1].content, FERTILIZER_ADVICE);
        assert_eq!(drafts[2].content, IRRIGATION_ADVICE);
        assert_eq!(drafts[0].confidence, 0.85);
        assert_eq!(drafts[1].confidence, 0.90);
        assert_eq!(drafts[2].confidence, 0.88);
        assert!(drafts
            .iter()
            .all(|d| d.recommendation_type != RecommendationType::PestControl));
    }

    #[test]
    fn test_reply_kept_verbatim_even_when_json() {
        let reply = r#"[{"type": "pest_control", "content": "Spray", "confidence": 0.7}]"#;
        let drafts = drafts_from_reply(reply.to_string());
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].content, reply);
    }

    #[tokio::test]
    async fn test_synthesize_sends_single_user_message() {
        let completer = Arc::new(ScriptedCompleter::replying("Try sorghum"));
        let synthesizer = RecommendationSynthesizer::new(completer.clone());

        let drafts = synthesizer.synthesize(&farm_snapshot(), None).await.unwrap();
        assert_eq!(drafts.len(), 3);

        let seen = completer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].role, crate::models::ChatRole::User);
        assert!(seen[0][0].content.contains("Farm: Rift Valley Plot"));
    }

    async fn stored_farm(pool: &SqlitePool, owner: Uuid) -> Farm {
        farms::create_farm(
            pool,
            owner,
            &FarmInput {
                farm_name: "Kericho Tea".to_string(),
                location: "Kericho".to_string(),
                area_size: Some(8.0),
                soil_type: Some(SoilType::Silty),
                crop_type: Some("tea".to_string()),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_for_farm_persists_three_pending_records() {
        let pool = db::init_memory_pool().await.unwrap();
        let owner = Uuid::new_v4();
        let farm = stored_farm(&pool, owner).await;
        monitoring::insert_reading(
            &pool,
            farm.id,
            &NewMonitoringReading {
                temperature: Some(19.0),
                nitrogen: Some(33),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let completer = Arc::new(ScriptedCompleter::replying("Prune in March"));
        let synthesizer = RecommendationSynthesizer::new(completer.clone());

        let stored = synthesizer
            .generate_for_farm(&pool, &farm, owner)
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|r| r.status == RecommendationStatus::Pending));
        assert!(stored.iter().all(|r| r.created_by == Some(owner)));

        let prompt = completer.seen.lock().unwrap()[0][0].content.clone();
        assert!(prompt.contains("- Temperature: 19°C\n"));
        assert!(prompt.contains("- Humidity: N/A%\n"));
        assert!(prompt.contains("N=33"));

        let listed = recommendations::list_for_farm(&pool, farm.id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].content, "Prune in March");
    }

    #[tokio::test]
    async fn test_generate_without_readings_succeeds() {
        let pool = db::init_memory_pool().await.unwrap();
        let owner = Uuid::new_v4();
        let farm = stored_farm(&pool, owner).await;

        let synthesizer =
            RecommendationSynthesizer::new(Arc::new(ScriptedCompleter::replying("Mulch")));
        let stored = synthesizer
            .generate_for_farm(&pool, &farm, owner)
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_completion_failure_persists_nothing() {
        let pool = db::init_memory_pool().await.unwrap();
        let owner = Uuid::new_v4();
        let farm = stored_farm(&pool, owner).await;

        let synthesizer = RecommendationSynthesizer::new(Arc::new(ScriptedCompleter::failing()));
        let result = synthesizer.generate_for_farm(&pool, &farm, owner).await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));

        let listed = recommendations::list_for_farm(&pool, farm.id).await.unwrap();
        assert!(listed.is_empty());
    }
}
