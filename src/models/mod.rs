//! Data models
//!
//! Models represent:
//! - The ledger entity (ParkingSession with its status sum type)
//! - Process-wide constant reference data (LotCategory, Zone, WalkingTime)

mod category;
mod session;
mod zone;

pub use category::{LotCategory, UnknownCategory, ALL_CATEGORIES};
pub use session::{normalize_plate, ParkingSession, SessionStatus};
pub use zone::{WalkingTime, Zone};
