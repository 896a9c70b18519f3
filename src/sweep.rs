//! Stale pending-order sweeper.
//!
//! A checkout abandoned after order initiation leaves its appointment
//! `pending` forever — the confirmation that would resolve it never
//! arrives. This task periodically deletes `pending` rows older than the
//! configured TTL. Scheduled and terminal rows are never touched.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::db;

/// How often the sweeper wakes up relative to the TTL. A 30-minute TTL
/// sweeps every 5 minutes.
const SWEEPS_PER_TTL: u32 = 6;

/// Run one sweep pass: delete pending rows older than `ttl_mins`.
pub fn sweep_once(db_path: &PathBuf, ttl_mins: u64) -> Result<usize, db::DatabaseError> {
    let conn = db::open_database(db_path)?;
    let cutoff = Utc::now() - chrono::Duration::minutes(ttl_mins as i64);
    let swept = db::repository::delete_stale_pending(&conn, cutoff)?;
    if swept > 0 {
        tracing::info!(swept, ttl_mins, "Swept stale pending appointments");
    }
    Ok(swept)
}

/// Spawn the periodic sweeper. A TTL of 0 disables it.
pub fn start_sweeper(db_path: PathBuf, ttl_mins: u64) -> Option<tokio::task::JoinHandle<()>> {
    if ttl_mins == 0 {
        tracing::info!("Pending-order sweeper disabled");
        return None;
    }

    let interval_secs = (ttl_mins * 60 / SWEEPS_PER_TTL as u64).max(1);
    tracing::info!(ttl_mins, interval_secs, "Pending-order sweeper started");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it so a restart doesn't
        // double-sweep.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let path = db_path.clone();
            let result =
                tokio::task::spawn_blocking(move || sweep_once(&path, ttl_mins)).await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => tracing::error!(error = %err, "Sweep pass failed"),
                Err(err) => tracing::error!(error = %err, "Sweep task panicked"),
            }
        }
    }))
}
