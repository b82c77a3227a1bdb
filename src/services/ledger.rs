//! Occupancy ledger service
//!
//! Implements the core business rules for the parking ledger:
//! - Park-in with plate normalization, uniqueness, and capacity checks
//! - Park-out closing the unique active session for a plate
//! - Occupancy, over-duration, and history queries
//!
//! Every precondition is checked before any mutation, so a rejected request
//! leaves the ledger unchanged. Mutations run under a single write lock so
//! the uniqueness and capacity checks stay atomic with the insert/update.

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::repositories::SessionRepository;
use crate::models::{normalize_plate, LotCategory, ParkingSession, ALL_CATEGORIES};

/// Error types for ledger operations.
///
/// All of these stem from caller-supplied state and are locally recoverable;
/// `Internal` is the only one signalling a store fault.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Empty/malformed plate or unknown category
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Park-in for a plate that already has an active session
    #[error("Plate {0} is already parked on campus")]
    AlreadyParked(String),

    /// Park-in when the category is at capacity
    #[error("{0} is full")]
    CategoryFull(LotCategory),

    /// Park-out for a plate with no active session
    #[error("Plate {0} is not currently parked")]
    NotParked(String),

    /// Store failure
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Point-in-time occupancy of one category.
///
/// `free` is the raw signed value; it can go negative only if corrupted
/// external data bypassed the park-in checks. Callers clamp for display but
/// the raw value is preserved for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOccupancy {
    pub category: LotCategory,
    pub capacity: i64,
    pub used: i64,
    pub free: i64,
}

/// An active session that has exceeded an hours threshold.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueSession {
    #[serde(flatten)]
    pub session: ParkingSession,
    pub hours_parked: f64,
}

/// The occupancy ledger, sole owner and writer of the durable session store.
pub struct OccupancyLedger {
    repo: Arc<dyn SessionRepository>,
    write_lock: Mutex<()>,
}

impl OccupancyLedger {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// Record a vehicle entering campus parking.
    ///
    /// Preconditions, checked in order:
    /// 1. normalized plate is non-empty, else `InvalidInput`
    /// 2. no active session exists for the plate, else `AlreadyParked`
    /// 3. the category has a free space, else `CategoryFull`
    pub async fn park_in(
        &self,
        plate: &str,
        category: LotCategory,
    ) -> Result<ParkingSession, LedgerError> {
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return Err(LedgerError::InvalidInput(
                "license plate must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        if self
            .repo
            .find_active_by_plate(&plate)
            .await
            .context("Failed to check for existing session")?
            .is_some()
        {
            return Err(LedgerError::AlreadyParked(plate));
        }

        let used = self
            .repo
            .count_active(category)
            .await
            .context("Failed to count active sessions")?;
        if used >= category.capacity() {
            return Err(LedgerError::CategoryFull(category));
        }

        let session = ParkingSession::new(plate, category, Utc::now());
        let created = self
            .repo
            .insert(&session)
            .await
            .context("Failed to append session")?;

        tracing::info!("{} parked in {}", created.plate, category);
        Ok(created)
    }

    /// Record a vehicle exiting campus parking.
    ///
    /// Requires an active session for the plate; an empty plate never has
    /// one, so it falls under `NotParked` as well.
    pub async fn park_out(&self, plate: &str) -> Result<ParkingSession, LedgerError> {
        let plate = normalize_plate(plate);

        let _guard = self.write_lock.lock().await;

        let mut session = self
            .repo
            .find_active_by_plate(&plate)
            .await
            .context("Failed to look up active session")?
            .ok_or_else(|| LedgerError::NotParked(plate.clone()))?;

        let exit_time = Utc::now();
        self.repo
            .close(session.id, exit_time)
            .await
            .context("Failed to close session")?;
        session.close(exit_time);

        tracing::info!("{} exited campus parking", session.plate);
        Ok(session)
    }

    /// Active sessions in a category, in ledger order.
    pub async fn active_sessions(
        &self,
        category: LotCategory,
    ) -> Result<Vec<ParkingSession>, LedgerError> {
        Ok(self
            .repo
            .list_active(Some(category))
            .await
            .context("Failed to list active sessions")?)
    }

    /// Occupancy snapshot of one category.
    pub async fn occupancy(&self, category: LotCategory) -> Result<CategoryOccupancy, LedgerError> {
        let used = self
            .repo
            .count_active(category)
            .await
            .context("Failed to count active sessions")?;
        Ok(CategoryOccupancy {
            category,
            capacity: category.capacity(),
            used,
            free: category.capacity() - used,
        })
    }

    /// Occupancy snapshots for every category, in display order.
    pub async fn occupancy_summary(&self) -> Result<Vec<CategoryOccupancy>, LedgerError> {
        let mut summary = Vec::with_capacity(ALL_CATEGORIES.len());
        for category in ALL_CATEGORIES {
            summary.push(self.occupancy(category).await?);
        }
        Ok(summary)
    }

    /// Raw signed free-space count for a category.
    pub async fn free_spaces(&self, category: LotCategory) -> Result<i64, LedgerError> {
        Ok(self.occupancy(category).await?.free)
    }

    /// Active sessions across all categories parked strictly longer than
    /// `threshold_hours`. Pure query, no mutation.
    pub async fn over_duration(
        &self,
        threshold_hours: f64,
    ) -> Result<Vec<OverdueSession>, LedgerError> {
        let now = Utc::now();
        let active = self
            .repo
            .list_active(None)
            .await
            .context("Failed to list active sessions")?;

        Ok(active
            .into_iter()
            .map(|session| OverdueSession {
                hours_parked: session.hours_parked(now),
                session,
            })
            .filter(|o| o.hours_parked > threshold_hours)
            .collect())
    }

    /// The full ledger, most recent entry first. Never pruned.
    pub async fn history(&self) -> Result<Vec<ParkingSession>, LedgerError> {
        Ok(self
            .repo
            .list_all()
            .await
            .context("Failed to load history")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSessionRepository;
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;
    use sqlx::SqlitePool;

    async fn setup_ledger() -> (SqlitePool, OccupancyLedger) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let ledger = OccupancyLedger::new(SqlxSessionRepository::boxed(pool.clone()));
        (pool, ledger)
    }

    // ========================================================================
    // Park-in tests
    // ========================================================================

    #[tokio::test]
    async fn test_park_in_on_empty_ledger() {
        let (_pool, ledger) = setup_ledger().await;

        let session = ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("park in");
        assert_eq!(session.plate, "ABC123");
        assert!(session.is_active());

        // Scenario 1: capacity 320 leaves 319 free
        assert_eq!(
            ledger.free_spaces(LotCategory::Orange).await.expect("free"),
            319
        );
    }

    #[tokio::test]
    async fn test_park_in_normalizes_plate() {
        let (_pool, ledger) = setup_ledger().await;

        let session = ledger
            .park_in("  abc 123 ", LotCategory::Green)
            .await
            .expect("park in");
        assert_eq!(session.plate, "ABC 123");
    }

    #[tokio::test]
    async fn test_park_in_empty_plate_rejected() {
        let (_pool, ledger) = setup_ledger().await;

        let result = ledger.park_in("   ", LotCategory::Orange).await;
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_double_park_in_rejected() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("first park in");
        let result = ledger.park_in("ABC123", LotCategory::Orange).await;
        assert!(matches!(result, Err(LedgerError::AlreadyParked(_))));

        // Ledger still holds exactly one session for the plate
        let history = ledger.history().await.expect("history");
        assert_eq!(history.iter().filter(|s| s.plate == "ABC123").count(), 1);
    }

    #[tokio::test]
    async fn test_double_park_in_rejected_across_categories() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("park in");
        // One active session per plate campus-wide, not per category
        let result = ledger.park_in("abc123", LotCategory::Green).await;
        assert!(matches!(result, Err(LedgerError::AlreadyParked(_))));
    }

    #[tokio::test]
    async fn test_category_full_rejected() {
        let (_pool, ledger) = setup_ledger().await;

        for i in 0..LotCategory::Blue.capacity() {
            ledger
                .park_in(&format!("FAC{:03}", i), LotCategory::Blue)
                .await
                .expect("fill blue");
        }
        assert_eq!(
            ledger.free_spaces(LotCategory::Blue).await.expect("free"),
            0
        );

        let result = ledger.park_in("ONEMORE", LotCategory::Blue).await;
        assert!(matches!(
            result,
            Err(LedgerError::CategoryFull(LotCategory::Blue))
        ));

        // Other categories are unaffected
        ledger
            .park_in("ONEMORE", LotCategory::Orange)
            .await
            .expect("other category still open");
    }

    // ========================================================================
    // Park-out tests
    // ========================================================================

    #[tokio::test]
    async fn test_park_out_closes_session() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("park in");
        let closed = ledger.park_out("abc123").await.expect("park out");
        assert!(!closed.is_active());
        assert!(closed.exit_time().unwrap() >= closed.entry_time);

        assert_eq!(
            ledger.free_spaces(LotCategory::Orange).await.expect("free"),
            320
        );
    }

    #[tokio::test]
    async fn test_park_out_unknown_plate_rejected() {
        let (_pool, ledger) = setup_ledger().await;

        let result = ledger.park_out("ZZZ999").await;
        assert!(matches!(result, Err(LedgerError::NotParked(_))));
    }

    #[tokio::test]
    async fn test_park_out_empty_plate_rejected() {
        let (_pool, ledger) = setup_ledger().await;

        let result = ledger.park_out("  ").await;
        assert!(matches!(result, Err(LedgerError::NotParked(_))));
    }

    #[tokio::test]
    async fn test_park_out_persists_over_garbage_exit_value() {
        let (pool, ledger) = setup_ledger().await;

        // A corrupted row whose exit column holds junk counts as active
        sqlx::query(
            "INSERT INTO parking_sessions (plate, category, entry, exit) VALUES (?, ?, ?, ?)",
        )
        .bind("CORRUPT")
        .bind(LotCategory::Orange.label())
        .bind(
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        )
        .bind("not-a-timestamp")
        .execute(&pool)
        .await
        .expect("raw insert");
        assert_eq!(
            ledger.free_spaces(LotCategory::Orange).await.expect("free"),
            319
        );

        let closed = ledger.park_out("CORRUPT").await.expect("park out");
        assert!(!closed.is_active());

        // The close must stick: the slot is freed and the plate is gone
        // from the active view on re-read
        assert_eq!(
            ledger.free_spaces(LotCategory::Orange).await.expect("free"),
            320
        );
        assert!(ledger
            .active_sessions(LotCategory::Orange)
            .await
            .expect("active")
            .is_empty());
    }

    #[tokio::test]
    async fn test_reentry_creates_new_record() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("park in");
        ledger.park_out("ABC123").await.expect("park out");
        ledger
            .park_in("ABC123", LotCategory::Green)
            .await
            .expect("park in again");

        let history = ledger.history().await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|s| s.is_active()).count(), 1);
    }

    // ========================================================================
    // Query tests
    // ========================================================================

    #[tokio::test]
    async fn test_active_sessions_by_category() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("RES001", LotCategory::Orange)
            .await
            .expect("park in");
        ledger
            .park_in("COM001", LotCategory::Green)
            .await
            .expect("park in");
        ledger
            .park_in("RES002", LotCategory::Orange)
            .await
            .expect("park in");
        ledger.park_out("RES001").await.expect("park out");

        let orange = ledger
            .active_sessions(LotCategory::Orange)
            .await
            .expect("active");
        assert_eq!(orange.len(), 1);
        assert_eq!(orange[0].plate, "RES002");
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let (_pool, ledger) = setup_ledger().await;

        ledger
            .park_in("ABC123", LotCategory::Orange)
            .await
            .expect("park in");

        let first = ledger.history().await.expect("history");
        let second = ledger.history().await.expect("history");
        assert_eq!(first, second);

        let active_a = ledger
            .active_sessions(LotCategory::Orange)
            .await
            .expect("active");
        let active_b = ledger
            .active_sessions(LotCategory::Orange)
            .await
            .expect("active");
        assert_eq!(active_a, active_b);
    }

    #[tokio::test]
    async fn test_over_duration_threshold() {
        let (pool, ledger) = setup_ledger().await;

        let session = ledger
            .park_in("XYZ000", LotCategory::Green)
            .await
            .expect("park in");

        // Backdate the entry five hours
        let backdated = (Utc::now() - chrono::Duration::hours(5))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        sqlx::query("UPDATE parking_sessions SET entry = ? WHERE id = ?")
            .bind(&backdated)
            .bind(session.id)
            .execute(&pool)
            .await
            .expect("backdate");

        let over_four = ledger.over_duration(4.0).await.expect("query");
        assert_eq!(over_four.len(), 1);
        assert_eq!(over_four[0].session.plate, "XYZ000");
        assert!(over_four[0].hours_parked > 4.0);

        let over_six = ledger.over_duration(6.0).await.expect("query");
        assert!(over_six.is_empty());
    }

    #[tokio::test]
    async fn test_over_duration_ignores_closed_sessions() {
        let (pool, ledger) = setup_ledger().await;

        let session = ledger
            .park_in("GONE01", LotCategory::Blue)
            .await
            .expect("park in");
        let backdated = (Utc::now() - chrono::Duration::hours(10))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        sqlx::query("UPDATE parking_sessions SET entry = ? WHERE id = ?")
            .bind(&backdated)
            .bind(session.id)
            .execute(&pool)
            .await
            .expect("backdate");
        ledger.park_out("GONE01").await.expect("park out");

        assert!(ledger.over_duration(1.0).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn test_history_most_recent_first() {
        let (pool, ledger) = setup_ledger().await;

        let first = ledger
            .park_in("FIRST1", LotCategory::Orange)
            .await
            .expect("park in");
        let backdated = (Utc::now() - chrono::Duration::hours(2))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        sqlx::query("UPDATE parking_sessions SET entry = ? WHERE id = ?")
            .bind(&backdated)
            .bind(first.id)
            .execute(&pool)
            .await
            .expect("backdate");

        ledger
            .park_in("SECOND", LotCategory::Orange)
            .await
            .expect("park in");

        let history = ledger.history().await.expect("history");
        assert_eq!(history[0].plate, "SECOND");
        assert_eq!(history[1].plate, "FIRST1");
    }

    // ========================================================================
    // Durability
    // ========================================================================

    #[tokio::test]
    async fn test_round_trip_through_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = crate::config::DatabaseConfig {
            url: dir.path().join("parking.db").to_string_lossy().to_string(),
        };

        let before = {
            let pool = crate::db::create_pool(&config).await.expect("pool");
            migrations::run_migrations(&pool).await.expect("migrations");
            let ledger = OccupancyLedger::new(SqlxSessionRepository::boxed(pool.clone()));

            ledger
                .park_in("KEEP01", LotCategory::Orange)
                .await
                .expect("park in");
            ledger
                .park_in("KEEP02", LotCategory::Blue)
                .await
                .expect("park in");
            ledger.park_out("KEEP02").await.expect("park out");

            let history = ledger.history().await.expect("history");
            pool.close().await;
            history
        };

        // Reopen the same file and compare
        let pool = crate::db::create_pool(&config).await.expect("reopen");
        migrations::run_migrations(&pool).await.expect("migrations");
        let ledger = OccupancyLedger::new(SqlxSessionRepository::boxed(pool.clone()));

        let after = ledger.history().await.expect("history");
        assert_eq!(before, after);
        pool.close().await;
    }

    // ========================================================================
    // Property-based tests
    // ========================================================================

    /// One step of a random park-in/park-out workload.
    #[derive(Debug, Clone)]
    enum Op {
        ParkIn(u8, LotCategory),
        ParkOut(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let category = prop_oneof![
            Just(LotCategory::Orange),
            Just(LotCategory::Green),
            Just(LotCategory::Blue),
        ];
        prop_oneof![
            (0u8..6, category).prop_map(|(p, c)| Op::ParkIn(p, c)),
            (0u8..6).prop_map(Op::ParkOut),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Under any sequence of park-in/park-out calls, no plate ever has
        /// two simultaneously active sessions and no category ever exceeds
        /// its capacity.
        #[test]
        fn property_uniqueness_and_capacity_hold(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let (_pool, ledger) = setup_ledger().await;

                for op in &ops {
                    match op {
                        Op::ParkIn(p, category) => {
                            // Outcome may be AlreadyParked; both are legal
                            let _ = ledger.park_in(&format!("P{:02}", p), *category).await;
                        }
                        Op::ParkOut(p) => {
                            let _ = ledger.park_out(&format!("P{:02}", p)).await;
                        }
                    }

                    // Uniqueness: at most one active session per plate
                    let history = ledger.history().await.expect("history");
                    let mut active_plates: Vec<&str> = history
                        .iter()
                        .filter(|s| s.is_active())
                        .map(|s| s.plate.as_str())
                        .collect();
                    let total_active = active_plates.len();
                    active_plates.sort();
                    active_plates.dedup();
                    prop_assert_eq!(active_plates.len(), total_active);

                    // Capacity: never exceeded in any category
                    for category in ALL_CATEGORIES {
                        let occupancy = ledger.occupancy(category).await.expect("occupancy");
                        prop_assert!(occupancy.used <= occupancy.capacity);
                        prop_assert!(occupancy.free >= 0);
                    }
                }

                Ok(())
            });
            result?;
        }
    }
}
