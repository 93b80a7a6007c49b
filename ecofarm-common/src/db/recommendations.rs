//! Recommendation persistence
//!
//! Recommendations are written in batches inside one transaction: either
//! every record of a batch becomes visible or none does.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{
    clamp_confidence, NewRecommendation, Recommendation, RecommendationStatus, RecommendationType,
};
use super::{format_timestamp, now, parse_column, parse_timestamp, parse_uuid};
use crate::{Error, Result};

/// Largest batch a single generation may insert (one per category)
pub const MAX_BATCH_SIZE: usize = 4;

/// Insert a batch of recommendations for `farm_id`
///
/// **Algorithm:**
/// 1. Begin transaction
/// 2. Insert each record stamped with farm id, author and status `pending`
/// 3. Commit
///
/// Any failure drops the transaction, rolling back earlier inserts.
pub async fn insert_batch(
    pool: &SqlitePool,
    farm_id: Uuid,
    created_by: Uuid,
    batch: &[NewRecommendation],
) -> Result<Vec<Recommendation>> {
    if batch.len() > MAX_BATCH_SIZE {
        return Err(Error::InvalidInput(format!(
            "at most {} recommendations per batch, got {}",
            MAX_BATCH_SIZE,
            batch.len()
        )));
    }

    let created_at = now();
    let mut tx = pool.begin().await?;
    let mut stored = Vec::with_capacity(batch.len());

    for item in batch {
        let record = Recommendation {
            id: Uuid::new_v4(),
            farm_id,
            recommendation_type: item.recommendation_type,
            content: item.content.clone(),
            confidence_score: clamp_confidence(item.confidence_score),
            created_by: Some(created_by),
            status: RecommendationStatus::Pending,
            created_at,
        };

        sqlx::query(
            r#"
            INSERT INTO recommendations (
                id, farm_id, recommendation_type, content, confidence_score,
                created_by, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(farm_id.to_string())
        .bind(record.recommendation_type.as_str())
        .bind(&record.content)
        .bind(record.confidence_score)
        .bind(created_by.to_string())
        .bind(record.status.as_str())
        .bind(format_timestamp(&record.created_at))
        .execute(&mut *tx)
        .await?;

        stored.push(record);
    }

    tx.commit().await?;

    tracing::info!(
        farm_id = %farm_id,
        created_by = %created_by,
        count = stored.len(),
        "Stored recommendation batch"
    );

    Ok(stored)
}

/// Recommendations of a farm, newest first
pub async fn list_for_farm(pool: &SqlitePool, farm_id: Uuid) -> Result<Vec<Recommendation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, farm_id, recommendation_type, content, confidence_score,
               created_by, status, created_at
        FROM recommendations
        WHERE farm_id = ?
        ORDER BY created_at DESC, rowid ASC
        "#,
    )
    .bind(farm_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(recommendation_from_row).collect()
}

/// Number of recommendations across all farms of a user
pub async fn count_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM recommendations r
        JOIN farms f ON f.id = r.farm_id
        WHERE f.user_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

fn recommendation_from_row(row: &SqliteRow) -> Result<Recommendation> {
    let created_by: Option<String> = row.try_get("created_by")?;

    Ok(Recommendation {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        farm_id: parse_uuid(&row.try_get::<String, _>("farm_id")?)?,
        recommendation_type: parse_column::<RecommendationType>(
            &row.try_get::<String, _>("recommendation_type")?,
        )?,
        content: row.try_get("content")?,
        confidence_score: row.try_get("confidence_score")?,
        created_by: created_by.as_deref().map(parse_uuid).transpose()?,
        status: parse_column::<RecommendationStatus>(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}
