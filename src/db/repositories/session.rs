//! Parking session repository
//!
//! Database operations for the occupancy ledger.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for ledger data access
//! - `SqlxSessionRepository` implementing the trait over the SQLite store
//!
//! Timestamps are stored as ISO-8601 text. Loading is tolerant: an
//! unparseable exit value leaves the session active, and a row whose entry
//! value cannot be parsed is skipped with a warning instead of failing the
//! load. Filtering therefore happens on the mapped rows, in one place, not
//! in SQL predicates that would disagree with the tolerant mapping.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{LotCategory, ParkingSession, SessionStatus};

/// Ledger repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Append a new session, returning it with the assigned row ID
    async fn insert(&self, session: &ParkingSession) -> Result<ParkingSession>;

    /// Set the exit time on a session, replacing whatever the column held.
    /// Callers verify the session is active through the mapped view first.
    async fn close(&self, id: i64, exit_time: DateTime<Utc>) -> Result<()>;

    /// Find the active session for a plate, if any
    async fn find_active_by_plate(&self, plate: &str) -> Result<Option<ParkingSession>>;

    /// Active sessions, optionally restricted to one category, in ledger order
    async fn list_active(&self, category: Option<LotCategory>) -> Result<Vec<ParkingSession>>;

    /// Number of active sessions in a category
    async fn count_active(&self, category: LotCategory) -> Result<i64>;

    /// The full ledger, most recent entry first
    async fn list_all(&self) -> Result<Vec<ParkingSession>>;
}

/// SQLx-based ledger repository over the SQLite store
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_in_ledger_order(&self) -> Result<Vec<ParkingSession>> {
        let rows = sqlx::query("SELECT id, plate, category, entry, exit FROM parking_sessions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load ledger rows")?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(session) = map_row(row) {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn insert(&self, session: &ParkingSession) -> Result<ParkingSession> {
        let result = sqlx::query(
            "INSERT INTO parking_sessions (plate, category, entry, exit) VALUES (?, ?, ?, NULL)",
        )
        .bind(&session.plate)
        .bind(session.category.label())
        .bind(format_timestamp(session.entry_time))
        .execute(&self.pool)
        .await
        .context("Failed to insert parking session")?;

        let mut created = session.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn close(&self, id: i64, exit_time: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE parking_sessions SET exit = ? WHERE id = ?")
            .bind(format_timestamp(exit_time))
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to close parking session")?;
        if result.rows_affected() != 1 {
            anyhow::bail!("No parking session with id {}", id);
        }
        Ok(())
    }

    async fn find_active_by_plate(&self, plate: &str) -> Result<Option<ParkingSession>> {
        let sessions = self.fetch_in_ledger_order().await?;
        Ok(sessions
            .into_iter()
            .find(|s| s.is_active() && s.plate == plate))
    }

    async fn list_active(&self, category: Option<LotCategory>) -> Result<Vec<ParkingSession>> {
        let sessions = self.fetch_in_ledger_order().await?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.is_active() && category.map_or(true, |c| s.category == c))
            .collect())
    }

    async fn count_active(&self, category: LotCategory) -> Result<i64> {
        Ok(self.list_active(Some(category)).await?.len() as i64)
    }

    async fn list_all(&self) -> Result<Vec<ParkingSession>> {
        let mut sessions = self.fetch_in_ledger_order().await?;
        sessions.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        Ok(sessions)
    }
}

/// Serialize a timestamp for storage.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Parse a stored timestamp, accepting RFC 3339 or a bare
/// `YYYY-MM-DD HH:MM:SS`. Returns None for anything else.
fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Map one ledger row, tolerantly. Returns None for rows that cannot
/// participate in occupancy (unparseable entry, unknown category).
fn map_row(row: &sqlx::sqlite::SqliteRow) -> Option<ParkingSession> {
    let id: i64 = row.get("id");
    let plate: String = row.get("plate");
    let category_raw: String = row.get("category");
    let entry_raw: Option<String> = row.get("entry");
    let exit_raw: Option<String> = row.get("exit");

    let category = match category_raw.parse::<LotCategory>() {
        Ok(category) => category,
        Err(_) => {
            tracing::warn!("Skipping ledger row {}: unknown category {:?}", id, category_raw);
            return None;
        }
    };

    let entry_time = match parse_timestamp(entry_raw.as_deref()) {
        Some(ts) => ts,
        None => {
            tracing::warn!("Skipping ledger row {}: unparseable entry {:?}", id, entry_raw);
            return None;
        }
    };

    // An unparseable exit is treated as absent: the session stays active.
    let status = match parse_timestamp(exit_raw.as_deref()) {
        Some(exit_time) => SessionStatus::Closed { exit_time },
        None => SessionStatus::Active,
    };

    Some(ParkingSession {
        id,
        plate,
        category,
        entry_time,
        status,
    })
}
