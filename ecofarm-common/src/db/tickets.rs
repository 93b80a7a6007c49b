//! Help ticket operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{HelpTicket, NewHelpTicket, TicketPriority, TicketStatus};
use super::{format_timestamp, now, parse_column, parse_timestamp, parse_uuid};
use crate::Result;

/// File a new ticket; status starts `open`
pub async fn create_ticket(
    pool: &SqlitePool,
    user_id: Uuid,
    input: &NewHelpTicket,
) -> Result<HelpTicket> {
    input.validate()?;

    let timestamp = now();
    let ticket = HelpTicket {
        id: Uuid::new_v4(),
        user_id,
        subject: input.subject.trim().to_string(),
        message: input.message.clone(),
        priority: input.priority,
        status: TicketStatus::Open,
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO help_tickets (id, user_id, subject, message, priority, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(ticket.id.to_string())
    .bind(user_id.to_string())
    .bind(&ticket.subject)
    .bind(&ticket.message)
    .bind(ticket.priority.as_str())
    .bind(ticket.status.as_str())
    .bind(format_timestamp(&ticket.created_at))
    .bind(format_timestamp(&ticket.updated_at))
    .execute(pool)
    .await?;

    tracing::info!(
        ticket_id = %ticket.id,
        priority = %ticket.priority,
        "Help ticket submitted"
    );

    Ok(ticket)
}

/// Tickets filed by a user, newest first
pub async fn list_tickets_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<HelpTicket>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, subject, message, priority, status, created_at, updated_at
        FROM help_tickets
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(ticket_from_row).collect()
}

fn ticket_from_row(row: &SqliteRow) -> Result<HelpTicket> {
    Ok(HelpTicket {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        priority: parse_column::<TicketPriority>(&row.try_get::<String, _>("priority")?)?,
        status: parse_column::<TicketStatus>(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}
