//! Expert appointment operations

use chrono::SubsecRound;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::farms::get_farm_for_user;
use super::models::{AppointmentStatus, ExpertAppointment, NewExpertAppointment};
use super::{format_timestamp, now, parse_column, parse_timestamp, parse_uuid};
use crate::Result;

/// Book a consultation; status starts `pending`
///
/// When a farm is named it must belong to the farmer (`NotFound` otherwise).
pub async fn create_appointment(
    pool: &SqlitePool,
    farmer_id: Uuid,
    input: &NewExpertAppointment,
) -> Result<ExpertAppointment> {
    if let Some(farm_id) = input.farm_id {
        get_farm_for_user(pool, farm_id, farmer_id).await?;
    }

    let appointment = ExpertAppointment {
        id: Uuid::new_v4(),
        farmer_id,
        farm_id: input.farm_id,
        expert_id: input.expert_id.clone(),
        appointment_date: input.appointment_date.trunc_subsecs(6),
        notes: input.notes.clone(),
        status: AppointmentStatus::Pending,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO expert_appointments (
            id, farmer_id, farm_id, expert_id, appointment_date, notes, status, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(appointment.id.to_string())
    .bind(farmer_id.to_string())
    .bind(appointment.farm_id.map(|id| id.to_string()))
    .bind(appointment.expert_id.as_deref())
    .bind(format_timestamp(&appointment.appointment_date))
    .bind(appointment.notes.as_deref())
    .bind(appointment.status.as_str())
    .bind(format_timestamp(&appointment.created_at))
    .execute(pool)
    .await?;

    tracing::info!(
        appointment_id = %appointment.id,
        farm_id = ?appointment.farm_id,
        date = %appointment.appointment_date,
        "Expert appointment requested"
    );

    Ok(appointment)
}

/// Appointments booked by a farmer, newest first
pub async fn list_appointments_for_farmer(
    pool: &SqlitePool,
    farmer_id: Uuid,
) -> Result<Vec<ExpertAppointment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, farmer_id, farm_id, expert_id, appointment_date, notes, status, created_at
        FROM expert_appointments
        WHERE farmer_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(farmer_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(appointment_from_row).collect()
}

fn appointment_from_row(row: &SqliteRow) -> Result<ExpertAppointment> {
    let farm_id: Option<String> = row.try_get("farm_id")?;

    Ok(ExpertAppointment {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        farmer_id: parse_uuid(&row.try_get::<String, _>("farmer_id")?)?,
        farm_id: farm_id.as_deref().map(parse_uuid).transpose()?,
        expert_id: row.try_get("expert_id")?,
        appointment_date: parse_timestamp(&row.try_get::<String, _>("appointment_date")?)?,
        notes: row.try_get("notes")?,
        status: parse_column::<AppointmentStatus>(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}
