use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus};

const APPOINTMENT_COLUMNS: &str = "id, owner_id, provider_id, provider_name, specialty, \
     date, time, fee, status, refund_amount, order_id, created_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, owner_id, provider_id, provider_name, specialty,
         date, time, fee, status, refund_amount, order_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appt.id.to_string(),
            appt.owner_id,
            appt.provider_id,
            appt.provider_name,
            appt.specialty,
            appt.date,
            appt.time,
            appt.fee,
            appt.status.as_str(),
            appt.refund_amount,
            appt.order_id,
            appt.created_at,
        ],
    )?;
    Ok(())
}

/// Fetch one appointment, scoped to its owner.
pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
    owner_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1 AND owner_id = ?2"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string(), owner_id], |row| {
        Ok(appointment_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(appointment_from_row(row??)?)),
        None => Ok(None),
    }
}

/// All appointments for a caller, newest first.
pub fn list_appointments_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE owner_id = ?1
         ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(appointment_row_from_rusqlite(row))
    })?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row??)?);
    }
    Ok(appts)
}

/// Record the payment order id opened for a pending appointment.
pub fn set_order_id(
    conn: &Connection,
    id: &Uuid,
    order_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE appointments SET order_id = ?2 WHERE id = ?1",
        params![id.to_string(), order_id],
    )?;
    Ok(())
}

/// Atomically transition `pending → scheduled` for the owning caller.
///
/// The status predicate lives in the UPDATE itself, so two racing
/// confirmations can never both win: the loser matches zero rows and
/// gets `None`. Wrong owner, wrong id and replayed confirmations all
/// land in the same `None`.
pub fn confirm_if_pending(
    conn: &Connection,
    id: &Uuid,
    owner_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = 'scheduled'
         WHERE id = ?1 AND owner_id = ?2 AND status = 'pending'",
        params![id.to_string(), owner_id],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_appointment(conn, id, owner_id)
}

/// Atomically transition `scheduled → cancelled`, setting the refund to
/// the full fee. Same conditional-update shape as [`confirm_if_pending`].
pub fn cancel_if_scheduled(
    conn: &Connection,
    id: &Uuid,
    owner_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = 'cancelled', refund_amount = fee
         WHERE id = ?1 AND owner_id = ?2 AND status = 'scheduled'",
        params![id.to_string(), owner_id],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_appointment(conn, id, owner_id)
}

/// Compensating delete for a pending appointment whose payment order
/// could not be opened.
pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM appointments WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

/// Remove `pending` rows created before `cutoff` (abandoned checkouts).
/// Returns the number of rows swept. Never touches other statuses.
pub fn delete_stale_pending(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let swept = conn.execute(
        "DELETE FROM appointments WHERE status = 'pending' AND created_at < ?1",
        params![cutoff],
    )?;
    Ok(swept)
}

// ── Row mapping ─────────────────────────────────────────────

struct AppointmentRow {
    id: String,
    owner_id: String,
    provider_id: String,
    provider_name: String,
    specialty: String,
    date: String,
    time: String,
    fee: i64,
    status: String,
    refund_amount: Option<i64>,
    order_id: Option<String>,
    created_at: DateTime<Utc>,
}

fn appointment_row_from_rusqlite(row: &Row) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        provider_id: row.get(2)?,
        provider_name: row.get(3)?,
        specialty: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        fee: row.get(7)?,
        status: row.get(8)?,
        refund_amount: row.get(9)?,
        order_id: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        owner_id: row.owner_id,
        provider_id: row.provider_id,
        provider_name: row.provider_name,
        specialty: row.specialty,
        date: row.date,
        time: row.time,
        fee: row.fee,
        status: AppointmentStatus::from_str(&row.status)?,
        refund_amount: row.refund_amount,
        order_id: row.order_id,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_appointment(owner: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            owner_id: owner.into(),
            provider_id: "2".into(),
            provider_name: "Dr. X".into(),
            specialty: "Cardiologist".into(),
            date: "2025-01-01".into(),
            time: "10:00".into(),
            fee: 1200,
            status,
            refund_amount: None,
            order_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        let loaded = get_appointment(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(loaded.id, appt.id);
        assert_eq!(loaded.fee, 1200);
        assert_eq!(loaded.status, AppointmentStatus::Pending);
        assert!(loaded.refund_amount.is_none());
    }

    #[test]
    fn corrupt_stored_id_surfaces_as_error() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO appointments (id, owner_id, provider_id, provider_name, specialty,
             date, time, fee, status, created_at)
             VALUES ('not-a-uuid', 'caller-1', '2', 'Dr. X', 'GP',
             '2025-01-01', '10:00', 1200, 'pending', '2025-01-01T10:00:00+00:00')",
            [],
        )
        .unwrap();

        let err = list_appointments_for_owner(&conn, "caller-1").unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn get_is_owner_scoped() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        assert!(get_appointment(&conn, &appt.id, "caller-2").unwrap().is_none());
    }

    #[test]
    fn confirm_flips_pending_to_scheduled() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        let confirmed = confirm_if_pending(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn confirm_is_noop_when_already_scheduled() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        assert!(confirm_if_pending(&conn, &appt.id, "caller-1").unwrap().is_some());
        // Replay: the conditional update matches nothing the second time
        assert!(confirm_if_pending(&conn, &appt.id, "caller-1").unwrap().is_none());

        let loaded = get_appointment(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn confirm_rejects_foreign_owner() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        assert!(confirm_if_pending(&conn, &appt.id, "caller-2").unwrap().is_none());
        // Status untouched
        let loaded = get_appointment(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Pending);
    }

    #[test]
    fn cancel_sets_full_refund() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Scheduled);
        insert_appointment(&conn, &appt).unwrap();

        let cancelled = cancel_if_scheduled(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.refund_amount, Some(1200));
    }

    #[test]
    fn cancel_rejects_pending_and_already_cancelled() {
        let conn = test_db();
        let pending = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &pending).unwrap();
        assert!(cancel_if_scheduled(&conn, &pending.id, "caller-1").unwrap().is_none());

        let scheduled = make_appointment("caller-1", AppointmentStatus::Scheduled);
        insert_appointment(&conn, &scheduled).unwrap();
        assert!(cancel_if_scheduled(&conn, &scheduled.id, "caller-1").unwrap().is_some());
        assert!(cancel_if_scheduled(&conn, &scheduled.id, "caller-1").unwrap().is_none());
    }

    #[test]
    fn delete_removes_row() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        delete_appointment(&conn, &appt.id).unwrap();
        assert!(get_appointment(&conn, &appt.id, "caller-1").unwrap().is_none());
    }

    #[test]
    fn list_is_owner_scoped_and_newest_first() {
        let conn = test_db();
        let mut older = make_appointment("caller-1", AppointmentStatus::Scheduled);
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let newer = make_appointment("caller-1", AppointmentStatus::Pending);
        let foreign = make_appointment("caller-2", AppointmentStatus::Pending);
        insert_appointment(&conn, &older).unwrap();
        insert_appointment(&conn, &newer).unwrap();
        insert_appointment(&conn, &foreign).unwrap();

        let listed = list_appointments_for_owner(&conn, "caller-1").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[test]
    fn stale_sweep_only_touches_old_pending_rows() {
        let conn = test_db();
        let mut stale = make_appointment("caller-1", AppointmentStatus::Pending);
        stale.created_at = Utc::now() - chrono::Duration::hours(1);
        let fresh = make_appointment("caller-1", AppointmentStatus::Pending);
        let mut old_scheduled = make_appointment("caller-1", AppointmentStatus::Scheduled);
        old_scheduled.created_at = Utc::now() - chrono::Duration::hours(1);
        insert_appointment(&conn, &stale).unwrap();
        insert_appointment(&conn, &fresh).unwrap();
        insert_appointment(&conn, &old_scheduled).unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(30);
        let swept = delete_stale_pending(&conn, cutoff).unwrap();

        assert_eq!(swept, 1);
        assert!(get_appointment(&conn, &stale.id, "caller-1").unwrap().is_none());
        assert!(get_appointment(&conn, &fresh.id, "caller-1").unwrap().is_some());
        assert!(get_appointment(&conn, &old_scheduled.id, "caller-1").unwrap().is_some());
    }

    #[test]
    fn set_order_id_records_reference() {
        let conn = test_db();
        let appt = make_appointment("caller-1", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        set_order_id(&conn, &appt.id, "order_abc").unwrap();
        let loaded = get_appointment(&conn, &appt.id, "caller-1").unwrap().unwrap();
        assert_eq!(loaded.order_id.as_deref(), Some("order_abc"));
    }
}
