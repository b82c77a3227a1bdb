//! Parking session model
//!
//! One `ParkingSession` is created per park-in event and closed at most once
//! by a park-out. Sessions are never deleted; the full ordered collection of
//! them is the ledger.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::LotCategory;

/// Whether a session is still occupying a space.
///
/// Modeled as a sum type rather than an optional exit field so that "active"
/// and "closed" cannot be confused: a closed session always carries its exit
/// time, an active one structurally cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionStatus {
    /// Vehicle is currently parked
    Active,
    /// Vehicle has exited; the record is immutable from here on
    Closed { exit_time: DateTime<Utc> },
}

/// One park-in event in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSession {
    /// Ledger row ID, assigned by the store
    pub id: i64,
    /// Normalized (trimmed, uppercased) license plate
    pub plate: String,
    /// Category the vehicle parked under
    pub category: LotCategory,
    /// Set at creation, immutable thereafter
    pub entry_time: DateTime<Utc>,
    /// Active or closed with an exit time
    pub status: SessionStatus,
}

impl ParkingSession {
    /// Create a new active session. The ID is assigned by the store.
    pub fn new(plate: String, category: LotCategory, entry_time: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            plate,
            category,
            entry_time,
            status: SessionStatus::Active,
        }
    }

    /// Whether the vehicle is still parked.
    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }

    /// Exit time, if the session has been closed.
    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        match self.status {
            SessionStatus::Active => None,
            SessionStatus::Closed { exit_time } => Some(exit_time),
        }
    }

    /// Time spent parked: up to the exit time for closed sessions, up to
    /// `now` for active ones.
    pub fn parked_duration(&self, now: DateTime<Utc>) -> Duration {
        self.exit_time().unwrap_or(now) - self.entry_time
    }

    /// Parked duration in fractional hours.
    pub fn hours_parked(&self, now: DateTime<Utc>) -> f64 {
        self.parked_duration(now).num_seconds() as f64 / 3600.0
    }

    /// Close the session. A closed session stays closed.
    pub fn close(&mut self, exit_time: DateTime<Utc>) {
        if self.is_active() {
            self.status = SessionStatus::Closed { exit_time };
        }
    }
}

/// Normalize a caller-supplied plate: trim surrounding whitespace, uppercase.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}
