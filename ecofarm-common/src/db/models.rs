//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Generates `as_str`, `Display` and `FromStr` for a unit enum stored as TEXT
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Column / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

// ============================================================================
// Farms
// ============================================================================

/// Soil classification of a farm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Clay,
    Sandy,
    Loamy,
    Silty,
    Peaty,
    Chalky,
}

text_enum!(SoilType {
    Clay => "clay",
    Sandy => "sandy",
    Loamy => "loamy",
    Silty => "silty",
    Peaty => "peaty",
    Chalky => "chalky",
});

/// A user-owned agricultural property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    pub farm_name: String,
    /// Free-text location, passed verbatim to the weather provider
    pub location: String,
    /// Hectares
    pub area_size: Option<f64>,
    pub soil_type: Option<SoilType>,
    pub crop_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Farm registration / update payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FarmInput {
    pub farm_name: String,
    pub location: String,
    #[serde(default)]
    pub area_size: Option<f64>,
    #[serde(default)]
    pub soil_type: Option<SoilType>,
    #[serde(default)]
    pub crop_type: Option<String>,
}

impl FarmInput {
    pub fn validate(&self) -> Result<()> {
        if self.farm_name.trim().is_empty() {
            return Err(Error::InvalidInput("farm_name must not be empty".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(Error::InvalidInput("location must not be empty".to_string()));
        }
        if let Some(area) = self.area_size {
            if !(area.is_finite() && area > 0.0) {
                return Err(Error::InvalidInput(format!(
                    "area_size must be a positive number of hectares, got {}",
                    area
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Monitoring
// ============================================================================

/// One timestamped snapshot of environmental and soil metrics for a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReading {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    /// °C
    pub temperature: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// %
    pub soil_moisture: Option<f64>,
    pub soil_ph: Option<f64>,
    pub nitrogen: Option<i64>,
    pub phosphorus: Option<i64>,
    pub potassium: Option<i64>,
    pub weather_condition: Option<String>,
}

/// Reading to append; `recorded_at` defaults to insertion time
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewMonitoringReading {
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    #[serde(default)]
    pub soil_ph: Option<f64>,
    #[serde(default)]
    pub nitrogen: Option<i64>,
    #[serde(default)]
    pub phosphorus: Option<i64>,
    #[serde(default)]
    pub potassium: Option<i64>,
    #[serde(default)]
    pub weather_condition: Option<String>,
}

impl NewMonitoringReading {
    /// Plausibility checks for manually ingested readings
    pub fn validate(&self) -> Result<()> {
        check_range("temperature", self.temperature, -90.0, 70.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        check_range("soil_moisture", self.soil_moisture, 0.0, 100.0)?;
        check_range("soil_ph", self.soil_ph, 0.0, 14.0)?;

        for (field, value) in [
            ("nitrogen", self.nitrogen),
            ("phosphorus", self.phosphorus),
            ("potassium", self.potassium),
        ] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(Error::InvalidInput(format!(
                        "{} must not be negative, got {}",
                        field, v
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    match value {
        Some(v) if !(v.is_finite() && (min..=max).contains(&v)) => Err(Error::InvalidInput(
            format!("{} must be within [{}, {}], got {}", field, min, max, v),
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Crop,
    Fertilizer,
    Irrigation,
    PestControl,
}

text_enum!(RecommendationType {
    Crop => "crop",
    Fertilizer => "fertilizer",
    Irrigation => "irrigation",
    PestControl => "pest_control",
});

/// Review status. Every recommendation starts as `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

text_enum!(RecommendationStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Persisted agronomic suggestion tied to a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub recommendation_type: RecommendationType,
    pub content: String,
    /// Always within [0, 1]
    pub confidence_score: f64,
    /// Acting user that triggered generation
    pub created_by: Option<Uuid>,
    pub status: RecommendationStatus,
    pub created_at: DateTime<Utc>,
}

/// Recommendation to insert; farm, author and status are stamped on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub recommendation_type: RecommendationType,
    pub content: String,
    pub confidence_score: f64,
}

impl NewRecommendation {
    /// Build a record, clamping confidence into [0, 1]
    pub fn new(
        recommendation_type: RecommendationType,
        content: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            recommendation_type,
            content: content.into(),
            confidence_score: clamp_confidence(confidence),
        }
    }
}

/// Clamp a confidence value into [0, 1]. NaN maps to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Support desk
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

text_enum!(TicketPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

text_enum!(TicketStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

/// Support ticket filed by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewHelpTicket {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

impl NewHelpTicket {
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(Error::InvalidInput("subject must not be empty".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

text_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Expert consultation booked by a farmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertAppointment {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub farm_id: Option<Uuid>,
    pub expert_id: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewExpertAppointment {
    #[serde(default)]
    pub farm_id: Option<Uuid>,
    #[serde(default)]
    pub expert_id: Option<String>,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}
