//! Business logic services
//!
//! - `ledger`: the occupancy ledger owning all parking-session state
//! - `reference`: read-only lookups over immutable campus data

pub mod ledger;
pub mod reference;

pub use ledger::{CategoryOccupancy, LedgerError, OccupancyLedger, OverdueSession};
pub use reference::{LotInfo, ReferenceError, ReferenceService};
