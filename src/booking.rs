//! Payment-gated appointment booking protocol.
//!
//! Three operations over the persisted appointment row:
//! 1. `initiate_order` — resolve the fee server-side, create a `pending`
//!    appointment, open a processor order; compensating delete if the
//!    processor call fails.
//! 2. `confirm_payment` — verify the processor signature, then flip
//!    `pending → scheduled` in one conditional update.
//! 3. `cancel` — `scheduled → cancelled` with a full refund.
//!
//! Every failure is terminal for the request. Apart from the
//! compensating delete, all checks run before any mutation.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus};
use crate::payment::gateway::{GatewayError, PaymentGateway};
use crate::payment::signature;
use crate::pricing::PriceTable;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Unknown provider: {0}")]
    InvalidProvider(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(#[from] GatewayError),

    #[error("Payment signature does not match")]
    SignatureInvalid,

    #[error("Appointment is not pending confirmation")]
    AppointmentNotPending,

    #[error("Appointment cannot be cancelled")]
    AppointmentNotCancellable,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Client side of order initiation. Display fields only — there is no
/// fee here, and the caller identity comes from the session, never the
/// body.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub provider_id: String,
    pub provider_name: String,
    pub specialty: String,
    pub date: String,
    pub time: String,
}

/// What order initiation hands back to the client: enough to run the
/// processor's payment flow and come back for confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedOrder {
    pub order_id: String,
    pub appointment_id: Uuid,
    pub fee: i64,
}

/// The processor flow's confirmation callback payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub appointment_id: String,
}

/// The booking protocol, parameterized over its injected dependencies.
/// Stateless between calls — all coordination goes through the
/// appointment row.
#[derive(Clone)]
pub struct BookingService {
    prices: Arc<PriceTable>,
    gateway: Arc<dyn PaymentGateway>,
    signature_secret: String,
    currency: String,
}

impl BookingService {
    pub fn new(
        prices: Arc<PriceTable>,
        gateway: Arc<dyn PaymentGateway>,
        signature_secret: String,
        currency: String,
    ) -> Self {
        Self {
            prices,
            gateway,
            signature_secret,
            currency,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a `pending` appointment priced from the table and open a
    /// payment order for it.
    pub fn initiate_order(
        &self,
        conn: &Connection,
        caller_id: &str,
        req: OrderRequest,
    ) -> Result<InitiatedOrder, BookingError> {
        for (field, value) in [
            ("provider_name", &req.provider_name),
            ("specialty", &req.specialty),
            ("date", &req.date),
            ("time", &req.time),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::MalformedRequest(format!("{field} is required")));
            }
        }

        // Integrity boundary: the fee exists only if the provider does.
        let fee = self
            .prices
            .fee_for(&req.provider_id)
            .ok_or_else(|| BookingError::InvalidProvider(req.provider_id.clone()))?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            owner_id: caller_id.to_string(),
            provider_id: req.provider_id,
            provider_name: req.provider_name,
            specialty: req.specialty,
            date: req.date,
            time: req.time,
            fee: fee.amount(),
            status: AppointmentStatus::Pending,
            refund_amount: None,
            order_id: None,
            created_at: Utc::now(),
        };
        repository::insert_appointment(conn, &appointment)?;

        let order = match self.gateway.create_order(
            fee.minor_units(),
            &self.currency,
            &appointment.id.to_string(),
        ) {
            Ok(order) => order,
            Err(err) => {
                // Compensating delete — no orphaned pending row
                tracing::warn!(
                    appointment_id = %appointment.id,
                    error = %err,
                    "Payment order failed, rolling back pending appointment"
                );
                if let Err(del_err) = repository::delete_appointment(conn, &appointment.id) {
                    tracing::error!(
                        appointment_id = %appointment.id,
                        error = %del_err,
                        "Compensating delete failed, pending row orphaned"
                    );
                }
                return Err(err.into());
            }
        };
        repository::set_order_id(conn, &appointment.id, &order.order_id)?;

        tracing::info!(
            appointment_id = %appointment.id,
            order_id = %order.order_id,
            fee = fee.amount(),
            "Appointment order initiated"
        );

        Ok(InitiatedOrder {
            order_id: order.order_id,
            appointment_id: appointment.id,
            fee: fee.amount(),
        })
    }

    /// Verify the processor signature and flip the owning caller's
    /// `pending` appointment to `scheduled`.
    ///
    /// The signature check runs first and touches no state. The status
    /// check and the transition are one conditional update, so a replay
    /// or a racing duplicate observes `AppointmentNotPending`.
    pub fn confirm_payment(
        &self,
        conn: &Connection,
        caller_id: &str,
        req: ConfirmRequest,
    ) -> Result<Appointment, BookingError> {
        for (field, value) in [
            ("order_id", &req.order_id),
            ("payment_id", &req.payment_id),
            ("signature", &req.signature),
            ("appointment_id", &req.appointment_id),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::MalformedRequest(format!("{field} is required")));
            }
        }

        if !signature::verify_signature(
            &self.signature_secret,
            &req.order_id,
            &req.payment_id,
            &req.signature,
        ) {
            tracing::warn!(order_id = %req.order_id, "Payment signature rejected");
            return Err(BookingError::SignatureInvalid);
        }

        let appointment_id = Uuid::parse_str(&req.appointment_id)
            .map_err(|_| BookingError::MalformedRequest("appointment_id is not a valid id".into()))?;

        let confirmed = repository::confirm_if_pending(conn, &appointment_id, caller_id)?
            .ok_or(BookingError::AppointmentNotPending)?;

        tracing::info!(
            appointment_id = %confirmed.id,
            payment_id = %req.payment_id,
            "Appointment confirmed"
        );
        Ok(confirmed)
    }

    /// Cancel a `scheduled` appointment owned by the caller. Full-refund
    /// policy: `refund_amount` is set to the fee.
    pub fn cancel(
        &self,
        conn: &Connection,
        caller_id: &str,
        appointment_id: &Uuid,
    ) -> Result<Appointment, BookingError> {
        let cancelled = repository::cancel_if_scheduled(conn, appointment_id, caller_id)?
            .ok_or(BookingError::AppointmentNotCancellable)?;

        tracing::info!(
            appointment_id = %cancelled.id,
            refund = cancelled.refund_amount.unwrap_or(0),
            "Appointment cancelled"
        );
        Ok(cancelled)
    }
}
