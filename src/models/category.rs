//! Lot category model
//!
//! Defines the fixed enumeration of permit categories and their process-wide
//! constant data: display label, total capacity, and member lot codes from
//! the campus map. This data never changes at runtime.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A permit/lot category with a fixed total capacity.
///
/// Categories partition the campus spaces by who may park there; they are
/// distinct from [`Zone`](crate::models::Zone)s, which are overlapping
/// signage groupings of the same lot codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LotCategory {
    /// Resident student parking
    Orange,
    /// Commuter and nonresident parking
    Green,
    /// Faculty and staff parking
    Blue,
}

/// All categories, in display order.
pub const ALL_CATEGORIES: [LotCategory; 3] =
    [LotCategory::Orange, LotCategory::Green, LotCategory::Blue];

impl LotCategory {
    /// Full display label, also the form stored in the ledger.
    pub fn label(&self) -> &'static str {
        match self {
            LotCategory::Orange => "Orange (Residents)",
            LotCategory::Green => "Green (Commuters)",
            LotCategory::Blue => "Blue (Faculty)",
        }
    }

    /// Short color name.
    pub fn name(&self) -> &'static str {
        match self {
            LotCategory::Orange => "Orange",
            LotCategory::Green => "Green",
            LotCategory::Blue => "Blue",
        }
    }

    /// Total number of spaces in this category.
    pub fn capacity(&self) -> i64 {
        match self {
            LotCategory::Orange => 320,
            LotCategory::Green => 480,
            LotCategory::Blue => 200,
        }
    }

    /// Lot codes belonging to this category.
    pub fn lots(&self) -> &'static [&'static str] {
        match self {
            LotCategory::Orange => &["F-1", "F-2", "H-2", "I-1", "M-2"],
            LotCategory::Green => &["B-1", "B-2", "B-3", "E-1", "H-1", "M-1", "N-1", "N-2"],
            LotCategory::Blue => &[
                "A-1", "A-2", "A-3", "C-4", "C-5", "D-1", "G-1", "G-2", "G-3", "J-1", "J-2",
                "J-3", "K-1", "K-2", "K-3", "O-1",
            ],
        }
    }
}

impl fmt::Display for LotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string does not name a known category
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown lot category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for LotCategory {
    type Err = UnknownCategory;

    /// Parse a category name, case-insensitively.
    ///
    /// Accepts the bare color ("orange") as well as the full ledger label
    /// ("Orange (Residents)").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = s.split('(').next().unwrap_or("").trim().to_lowercase();
        match color.as_str() {
            "orange" => Ok(LotCategory::Orange),
            "green" => Ok(LotCategory::Green),
            "blue" => Ok(LotCategory::Blue),
            _ => Err(UnknownCategory(s.trim().to_string())),
        }
    }
}

impl Serialize for LotCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LotCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
