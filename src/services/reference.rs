//! Zone/lot reference service
//!
//! Pure lookups over immutable campus data: signage zones, visitor lots,
//! walking times, after-hours rules, and destination lot suggestions. The
//! data is fixed at startup and never mutated.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::AfterHoursConfig;
use crate::models::{LotCategory, WalkingTime, Zone};

/// Lots open to campus visitors regardless of permit.
pub const VISITOR_LOTS: [&str; 4] = ["C-1", "C-2", "C-3", "K-1"];

/// Signage zones from the campus map. Zones overlap; a lot code may appear
/// in several of them.
static ZONES: Lazy<Vec<Zone>> = Lazy::new(|| {
    vec![
        Zone::new(
            "Blue",
            "Blue Zone",
            &[
                "A-1", "A-2", "A-3", "C-4", "C-5", "D-1", "G-1", "G-2", "G-3", "J-1", "J-2",
                "J-3", "K-1", "K-2", "K-3", "O-1",
            ],
        ),
        Zone::new("Dark Blue", "Dark Blue Zone", &["M-1"]),
        Zone::new("Red", "Red Zone", &["F-1", "F-2"]),
        Zone::new("Yellow", "Yellow Zone", &["H-2", "I-1"]),
        Zone::new("Purple", "Purple Zone", &["M-2", "G-2"]),
        Zone::new("Gold", "Gold Zone", &["N-1", "N-2"]),
        Zone::new("Gray", "Gray Zone", &["H-1", "H-2"]),
        Zone::new(
            "Green",
            "Green Zone",
            &["B-1", "B-2", "B-3", "E-1", "G-3", "H-1", "H-2"],
        ),
    ]
});

/// Approximate walking times between key campus landmarks. Literal pairs
/// only; the reverse direction is not implied.
static WALKING_TIMES: Lazy<Vec<WalkingTime>> = Lazy::new(|| {
    vec![
        WalkingTime::new("Dolan Campus", "BCC", 8),
        WalkingTime::new("BCC", "Dolan School of Business", 7),
        WalkingTime::new("Townhouses", "BCC", 8),
        WalkingTime::new("Village", "BCC", 4),
        WalkingTime::new("Regis Hall", "RecPlex", 4),
        WalkingTime::new("Dolan Campus", "Dolan School of Business", 15),
    ]
});

/// A recommended lot per category for a campus destination.
struct Recommendation {
    destination: &'static str,
    orange: &'static str,
    green: &'static str,
    blue: &'static str,
}

const RECOMMENDATIONS: [Recommendation; 7] = [
    Recommendation {
        destination: "Barone Campus Center (BCC)",
        orange: "H-2",
        green: "B-1",
        blue: "C-4",
    },
    Recommendation {
        destination: "Dolan School of Business",
        orange: "M-2",
        green: "E-1",
        blue: "D-1",
    },
    Recommendation {
        destination: "RecPlex",
        orange: "H-2",
        green: "H-1",
        blue: "G-1",
    },
    Recommendation {
        destination: "Library",
        orange: "F-1",
        green: "B-2",
        blue: "K-1",
    },
    Recommendation {
        destination: "Townhouses",
        orange: "F-2",
        green: "N-1",
        blue: "O-1",
    },
    Recommendation {
        destination: "The Village / Regis area",
        orange: "H-2",
        green: "H-1",
        blue: "J-1",
    },
    Recommendation {
        destination: "Dolan Campus",
        orange: "M-2",
        green: "M-1",
        blue: "D-1",
    },
];

/// Error type for reference lookups
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Zone, lot, walking-time pair, or destination has no match
    #[error("{0} not found")]
    NotFound(String),
}

/// Everything known about one lot code.
#[derive(Debug, Clone, Serialize)]
pub struct LotInfo {
    pub lot: String,
    pub zones: Vec<String>,
    pub is_visitor_lot: bool,
}

/// Read-only lookup service over the campus reference data.
pub struct ReferenceService {
    after_hours_lots: BTreeSet<String>,
}

impl ReferenceService {
    /// Build the service, resolving the after-hours lot set from config.
    pub fn new(config: &AfterHoursConfig) -> Self {
        // Faculty lots open up after hours, adjusted by config
        let mut after_hours_lots: BTreeSet<String> = LotCategory::Blue
            .lots()
            .iter()
            .map(|l| l.to_string())
            .collect();
        for lot in &config.extra_lots {
            after_hours_lots.insert(lot.trim().to_uppercase());
        }
        for lot in &config.excluded_lots {
            after_hours_lots.remove(&lot.trim().to_uppercase());
        }

        Self { after_hours_lots }
    }

    /// All signage zones.
    pub fn zones(&self) -> &'static [Zone] {
        &ZONES
    }

    /// Look up a zone by name, case-insensitively.
    pub fn zone_by_name(&self, name: &str) -> Result<&'static Zone, ReferenceError> {
        ZONES
            .iter()
            .find(|z| z.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ReferenceError::NotFound(format!("zone '{}'", name.trim())))
    }

    /// Zones containing a lot code. May be empty; may hold several zones.
    pub fn zones_containing(&self, lot_code: &str) -> Vec<&'static Zone> {
        ZONES.iter().filter(|z| z.contains_lot(lot_code)).collect()
    }

    /// Whether a lot is a visitor lot.
    pub fn is_visitor_lot(&self, lot_code: &str) -> bool {
        VISITOR_LOTS
            .iter()
            .any(|l| l.eq_ignore_ascii_case(lot_code.trim()))
    }

    /// Everything known about a lot code. `NotFound` if the code appears in
    /// no zone and is not a visitor lot.
    pub fn lot_info(&self, lot_code: &str) -> Result<LotInfo, ReferenceError> {
        let lot = lot_code.trim().to_uppercase();
        let zones: Vec<String> = self
            .zones_containing(&lot)
            .iter()
            .map(|z| z.name.clone())
            .collect();
        let is_visitor_lot = self.is_visitor_lot(&lot);

        if zones.is_empty() && !is_visitor_lot {
            return Err(ReferenceError::NotFound(format!("lot '{}'", lot)));
        }

        Ok(LotInfo {
            lot,
            zones,
            is_visitor_lot,
        })
    }

    /// The full walking-time table.
    pub fn walking_times(&self) -> &'static [WalkingTime] {
        &WALKING_TIMES
    }

    /// Minutes between two landmarks. Only the literal pairs in the table
    /// are answered; no path computation.
    pub fn walking_time(&self, from: &str, to: &str) -> Result<u32, ReferenceError> {
        WALKING_TIMES
            .iter()
            .find(|wt| wt.matches(from, to))
            .map(|wt| wt.minutes)
            .ok_or_else(|| {
                ReferenceError::NotFound(format!("walking time '{}' to '{}'", from.trim(), to.trim()))
            })
    }

    /// Lot codes where parking is allowed after hours.
    pub fn after_hours_allowed_lots(&self) -> &BTreeSet<String> {
        &self.after_hours_lots
    }

    /// Known destinations for lot recommendations.
    pub fn destinations(&self) -> Vec<&'static str> {
        RECOMMENDATIONS.iter().map(|r| r.destination).collect()
    }

    /// Recommended lot for a destination and permit category.
    pub fn recommend_lot(
        &self,
        destination: &str,
        category: LotCategory,
    ) -> Result<&'static str, ReferenceError> {
        RECOMMENDATIONS
            .iter()
            .find(|r| r.destination.eq_ignore_ascii_case(destination.trim()))
            .map(|r| match category {
                LotCategory::Orange => r.orange,
                LotCategory::Green => r.green,
                LotCategory::Blue => r.blue,
            })
            .ok_or_else(|| {
                ReferenceError::NotFound(format!("destination '{}'", destination.trim()))
            })
    }
}
