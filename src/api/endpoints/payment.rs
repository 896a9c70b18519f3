//! Payment protocol endpoints.
//!
//! Two endpoints:
//! - `POST /payment/order` — initiate an order for a pending appointment
//! - `POST /payment/confirm` — verify the processor signature and schedule

use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiJson};
use crate::api::types::{ApiContext, CallerContext};
use crate::booking::{ConfirmRequest, InitiatedOrder, OrderRequest};
use crate::models::Appointment;

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub appointment_id: Uuid,
    pub fee: i64,
    pub currency: String,
    pub processor_account_key: String,
}

/// `POST /payment/order` — create a pending appointment and open a
/// payment order for it.
///
/// The body carries display fields only; the fee in the response is the
/// server's price-table value. Runs on the blocking pool because the
/// processor client is a blocking HTTP call.
pub async fn order(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(req): ApiJson<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = ctx.state.clone();
    let initiated: InitiatedOrder =
        tokio::task::spawn_blocking(move || -> Result<InitiatedOrder, ApiError> {
            let conn = state.open_db()?;
            Ok(state.booking.initiate_order(&conn, &caller.caller_id, req)?)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("order task failed: {e}")))??;

    Ok(Json(OrderResponse {
        order_id: initiated.order_id,
        appointment_id: initiated.appointment_id,
        fee: initiated.fee,
        currency: ctx.state.booking.currency().to_string(),
        processor_account_key: ctx.state.processor_account_key.clone(),
    }))
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub appointment: Appointment,
    /// Payment id, echoed back as the receipt reference.
    pub transaction_id: String,
}

/// `POST /payment/confirm` — verify the signature and flip the
/// appointment to `scheduled`.
pub async fn confirm(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(req): ApiJson<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let transaction_id = req.payment_id.clone();

    let conn = ctx.state.open_db()?;
    let appointment = ctx
        .state
        .booking
        .confirm_payment(&conn, &caller.caller_id, req)?;

    Ok(Json(ConfirmResponse {
        success: true,
        appointment,
        transaction_id,
    }))
}
