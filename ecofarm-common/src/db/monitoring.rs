//! Monitoring store
//!
//! Append-only readings per farm. History order is `recorded_at`, with
//! insertion order (rowid) breaking ties so a later insert at the same
//! instant is the newer reading.

use chrono::SubsecRound;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{MonitoringReading, NewMonitoringReading};
use super::{format_timestamp, now, parse_timestamp, parse_uuid};
use crate::Result;

/// Default number of readings returned by [`reading_history`] callers
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Upper bound on a single history page
pub const MAX_HISTORY_LIMIT: i64 = 500;

const READING_COLUMNS: &str = "id, farm_id, recorded_at, temperature, humidity, soil_moisture, \
     soil_ph, nitrogen, phosphorus, potassium, weather_condition";

/// Append a reading for `farm_id`
///
/// The farm must exist (foreign key). Range validation is the caller's
/// concern: derived readings are already bounded, manual ones go through
/// [`NewMonitoringReading::validate`].
pub async fn insert_reading(
    pool: &SqlitePool,
    farm_id: Uuid,
    reading: &NewMonitoringReading,
) -> Result<MonitoringReading> {
    let stored = MonitoringReading {
        id: Uuid::new_v4(),
        farm_id,
        recorded_at: reading
            .recorded_at
            .map(|ts| ts.trunc_subsecs(6))
            .unwrap_or_else(now),
        temperature: reading.temperature,
        humidity: reading.humidity,
        soil_moisture: reading.soil_moisture,
        soil_ph: reading.soil_ph,
        nitrogen: reading.nitrogen,
        phosphorus: reading.phosphorus,
        potassium: reading.potassium,
        weather_condition: reading.weather_condition.clone(),
    };

    sqlx::query(
        r#"
        INSERT INTO monitoring_data (
            id, farm_id, recorded_at, temperature, humidity, soil_moisture,
            soil_ph, nitrogen, phosphorus, potassium, weather_condition
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stored.id.to_string())
    .bind(farm_id.to_string())
    .bind(format_timestamp(&stored.recorded_at))
    .bind(stored.temperature)
    .bind(stored.humidity)
    .bind(stored.soil_moisture)
    .bind(stored.soil_ph)
    .bind(stored.nitrogen)
    .bind(stored.phosphorus)
    .bind(stored.potassium)
    .bind(stored.weather_condition.as_deref())
    .execute(pool)
    .await?;

    tracing::debug!(
        reading_id = %stored.id,
        farm_id = %farm_id,
        recorded_at = %stored.recorded_at,
        "Stored monitoring reading"
    );

    Ok(stored)
}

/// Most recent reading for a farm, if any
pub async fn latest_reading(pool: &SqlitePool, farm_id: Uuid) -> Result<Option<MonitoringReading>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM monitoring_data WHERE farm_id = ? \
         ORDER BY recorded_at DESC, rowid DESC LIMIT 1",
        READING_COLUMNS
    ))
    .bind(farm_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(reading_from_row).transpose()
}

/// The `limit` most recent readings, oldest first
///
/// `limit` is clamped to `1..=MAX_HISTORY_LIMIT`.
pub async fn reading_history(
    pool: &SqlitePool,
    farm_id: Uuid,
    limit: i64,
) -> Result<Vec<MonitoringReading>> {
    let limit = limit.clamp(1, MAX_HISTORY_LIMIT);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM monitoring_data WHERE farm_id = ? \
         ORDER BY recorded_at DESC, rowid DESC LIMIT ?",
        READING_COLUMNS
    ))
    .bind(farm_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut readings = rows
        .iter()
        .map(reading_from_row)
        .collect::<Result<Vec<_>>>()?;
    readings.reverse();

    Ok(readings)
}

fn reading_from_row(row: &SqliteRow) -> Result<MonitoringReading> {
    Ok(MonitoringReading {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        farm_id: parse_uuid(&row.try_get::<String, _>("farm_id")?)?,
        recorded_at: parse_timestamp(&row.try_get::<String, _>("recorded_at")?)?,
        temperature: row.try_get("temperature")?,
        humidity: row.try_get("humidity")?,
        soil_moisture: row.try_get("soil_moisture")?,
        soil_ph: row.try_get("soil_ph")?,
        nitrogen: row.try_get("nitrogen")?,
        phosphorus: row.try_get("phosphorus")?,
        potassium: row.try_get("potassium")?,
        weather_condition: row.try_get("weather_condition")?,
    })
}
