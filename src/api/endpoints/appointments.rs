//! Appointment endpoints.
//!
//! Two endpoints:
//! - `GET /appointments` — list the caller's appointments
//! - `POST /appointments/:id/cancel` — cancel a scheduled appointment

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository;
use crate::models::{Appointment, AppointmentStatus};

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

/// `GET /appointments` — list appointments, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let appointments = repository::list_appointments_for_owner(&conn, &caller.caller_id)?;
    Ok(Json(AppointmentsResponse { appointments }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub status: AppointmentStatus,
    pub refund_amount: i64,
}

/// `POST /appointments/:id/cancel` — cancel a scheduled appointment.
/// Full-refund policy: the refund equals the fee paid.
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let appointment_id = Uuid::parse_str(&appointment_id)
        .map_err(|_| ApiError::MalformedRequest("appointment id is not a valid id".into()))?;

    let conn = ctx.state.open_db()?;
    let cancelled: Appointment = ctx
        .state
        .booking
        .cancel(&conn, &caller.caller_id, &appointment_id)?;

    Ok(Json(CancelResponse {
        status: cancelled.status,
        refund_amount: cancelled.refund_amount.unwrap_or(cancelled.fee),
    }))
}
