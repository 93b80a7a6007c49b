//! Database access
//!
//! Three farm-scoped collections (farms, monitoring_data, recommendations)
//! plus the support desk tables. Every write that spans more than one row
//! runs in a single transaction.

pub mod appointments;
pub mod farms;
pub mod models;
pub mod monitoring;
pub mod recommendations;
pub mod tickets;

pub use models::*;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Table definitions, applied in order on every startup
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS farms (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        farm_name TEXT NOT NULL,
        location TEXT NOT NULL,
        area_size REAL CHECK (area_size IS NULL OR area_size > 0),
        soil_type TEXT CHECK (soil_type IS NULL OR soil_type IN
            ('clay', 'sandy', 'loamy', 'silty', 'peaty', 'chalky')),
        crop_type TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_farms_user ON farms (user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS monitoring_data (
        id TEXT PRIMARY KEY,
        farm_id TEXT NOT NULL REFERENCES farms (id) ON DELETE CASCADE,
        recorded_at TEXT NOT NULL,
        temperature REAL,
        humidity REAL,
        soil_moisture REAL,
        soil_ph REAL,
        nitrogen INTEGER,
        phosphorus INTEGER,
        potassium INTEGER,
        weather_condition TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_monitoring_farm_time ON monitoring_data (farm_id, recorded_at)",
    r#"
    CREATE TABLE IF NOT EXISTS recommendations (
        id TEXT PRIMARY KEY,
        farm_id TEXT NOT NULL REFERENCES farms (id) ON DELETE CASCADE,
        recommendation_type TEXT NOT NULL CHECK (recommendation_type IN
            ('crop', 'fertilizer', 'irrigation', 'pest_control')),
        content TEXT NOT NULL,
        confidence_score REAL NOT NULL CHECK (confidence_score BETWEEN 0.0 AND 1.0),
        created_by TEXT,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN
            ('pending', 'approved', 'rejected')),
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_recommendations_farm ON recommendations (farm_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS help_tickets (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        subject TEXT NOT NULL,
        message TEXT NOT NULL,
        priority TEXT NOT NULL DEFAULT 'medium',
        status TEXT NOT NULL DEFAULT 'open',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expert_appointments (
        id TEXT PRIMARY KEY,
        farmer_id TEXT NOT NULL,
        farm_id TEXT REFERENCES farms (id) ON DELETE SET NULL,
        expert_id TEXT,
        appointment_date TEXT NOT NULL,
        notes TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL
    )
    "#,
];

/// Open (or create) the database file and apply the schema
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!("Connecting to database: {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Single connection that never expires; a second connection would see
/// a different, empty database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(
        "Database tables initialized (farms, monitoring_data, recommendations, help_tickets, expert_appointments)"
    );

    Ok(())
}

/// Current time at stored precision (microseconds)
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC text so that lexical order equals chronological order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", text, e)))
}

pub(crate) fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::Internal(format!("Invalid UUID '{}': {}", text, e)))
}

pub(crate) fn parse_column<T: FromStr<Err = Error>>(text: &str) -> Result<T> {
    text.parse::<T>()
        .map_err(|e| Error::Internal(format!("Corrupt enum column: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_init_memory_pool_creates_tables() {
        let pool = init_memory_pool().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(
            tables,
            vec![
                "expert_appointments",
                "farms",
                "help_tickets",
                "monitoring_data",
                "recommendations"
            ]
        );
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = init_memory_pool().await.unwrap();
        init_tables(&pool).await.unwrap();
    }

    #[test]
    fn test_timestamp_text_sorts_chronologically() {
        let whole = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let later = whole + chrono::Duration::milliseconds(500);

        let a = format_timestamp(&whole);
        let b = format_timestamp(&later);
        assert!(a < b, "{} should sort before {}", a, b);
        assert_eq!(parse_timestamp(&b).unwrap(), later);
    }
}
