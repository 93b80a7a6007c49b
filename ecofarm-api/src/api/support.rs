//! Help tickets and expert appointments

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ecofarm_common::db::{
    appointments, tickets, ExpertAppointment, HelpTicket, NewExpertAppointment, NewHelpTicket,
};

use super::{json_body, ActingUser};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<HelpTicket>>> {
    Ok(Json(tickets::list_tickets_for_user(&state.db, user_id).await?))
}

/// POST /api/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    payload: Result<Json<NewHelpTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<HelpTicket>)> {
    let input = json_body(payload)?;
    let ticket = tickets::create_ticket(&state.db, user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/appointments
pub async fn list_appointments(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<ExpertAppointment>>> {
    Ok(Json(
        appointments::list_appointments_for_farmer(&state.db, user_id).await?,
    ))
}

/// POST /api/appointments
pub async fn create_appointment(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    payload: Result<Json<NewExpertAppointment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ExpertAppointment>)> {
    let input = json_body(payload)?;
    let appointment = appointments::create_appointment(&state.db, user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Build support desk routes
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/api/appointments",
            get(list_appointments).post(create_appointment),
        )
}
