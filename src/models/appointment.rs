use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// A booking request and its payment lifecycle. Created `pending` by
/// order initiation; flipped to `scheduled` only by a verified payment
/// confirmation. `fee` is the server-resolved price in whole currency
/// units — it never comes from a client payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: String,
    pub provider_id: String,
    pub provider_name: String,
    pub specialty: String,
    pub date: String, // YYYY-MM-DD, as requested by the client
    pub time: String, // HH:MM
    pub fee: i64,
    pub status: AppointmentStatus,
    pub refund_amount: Option<i64>,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
