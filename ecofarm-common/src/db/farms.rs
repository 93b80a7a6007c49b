//! Farm registry
//!
//! Farms are visible only to their owner: lookups by id take the acting
//! user and report `NotFound` for farms owned by someone else.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{Farm, FarmInput, SoilType};
use super::{format_timestamp, now, parse_column, parse_timestamp, parse_uuid};
use crate::{Error, Result};

const FARM_COLUMNS: &str =
    "id, user_id, farm_name, location, area_size, soil_type, crop_type, created_at, updated_at";

/// Register a new farm owned by `user_id`
pub async fn create_farm(pool: &SqlitePool, user_id: Uuid, input: &FarmInput) -> Result<Farm> {
    input.validate()?;

    let timestamp = now();
    let farm = Farm {
        id: Uuid::new_v4(),
        user_id,
        farm_name: input.farm_name.trim().to_string(),
        location: input.location.trim().to_string(),
        area_size: input.area_size,
        soil_type: input.soil_type,
        crop_type: input.crop_type.clone(),
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO farms (id, user_id, farm_name, location, area_size, soil_type, crop_type, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(farm.id.to_string())
    .bind(farm.user_id.to_string())
    .bind(&farm.farm_name)
    .bind(&farm.location)
    .bind(farm.area_size)
    .bind(farm.soil_type.map(|s| s.as_str()))
    .bind(farm.crop_type.as_deref())
    .bind(format_timestamp(&farm.created_at))
    .bind(format_timestamp(&farm.updated_at))
    .execute(pool)
    .await?;

    tracing::info!(farm_id = %farm.id, user_id = %user_id, "Registered farm");

    Ok(farm)
}

/// Load a farm by id regardless of owner
pub async fn get_farm(pool: &SqlitePool, farm_id: Uuid) -> Result<Option<Farm>> {
    let row = sqlx::query(&format!("SELECT {} FROM farms WHERE id = ?", FARM_COLUMNS))
        .bind(farm_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(farm_from_row).transpose()
}

/// Load a farm owned by `user_id`
///
/// **Errors:** `NotFound` when the farm doesn't exist or belongs to another user
pub async fn get_farm_for_user(pool: &SqlitePool, farm_id: Uuid, user_id: Uuid) -> Result<Farm> {
    match get_farm(pool, farm_id).await? {
        Some(farm) if farm.user_id == user_id => Ok(farm),
        _ => Err(Error::NotFound(format!("farm {}", farm_id))),
    }
}

/// All farms of a user, newest first
pub async fn list_farms_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Farm>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM farms WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        FARM_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(farm_from_row).collect()
}

/// Replace the editable fields of an owned farm
pub async fn update_farm(
    pool: &SqlitePool,
    farm_id: Uuid,
    user_id: Uuid,
    input: &FarmInput,
) -> Result<Farm> {
    input.validate()?;

    let updated_at = now();
    let result = sqlx::query(
        r#"
        UPDATE farms
        SET farm_name = ?, location = ?, area_size = ?, soil_type = ?, crop_type = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(input.farm_name.trim())
    .bind(input.location.trim())
    .bind(input.area_size)
    .bind(input.soil_type.map(|s| s.as_str()))
    .bind(input.crop_type.as_deref())
    .bind(format_timestamp(&updated_at))
    .bind(farm_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("farm {}", farm_id)));
    }

    tracing::info!(farm_id = %farm_id, "Updated farm");

    get_farm_for_user(pool, farm_id, user_id).await
}

/// Number of farms owned by a user
pub async fn count_farms_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM farms WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn farm_from_row(row: &SqliteRow) -> Result<Farm> {
    let soil_type: Option<String> = row.try_get("soil_type")?;

    Ok(Farm {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        farm_name: row.try_get("farm_name")?,
        location: row.try_get("location")?,
        area_size: row.try_get("area_size")?,
        soil_type: soil_type
            .as_deref()
            .map(parse_column::<SoilType>)
            .transpose()?,
        crop_type: row.try_get("crop_type")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}
