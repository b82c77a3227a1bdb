//! Zone and walking-time reference models
//!
//! Zones are named, possibly overlapping groupings of lot codes used for
//! signage; they are distinct from capacity categories. Walking times are a
//! small fixed table of literal point-to-point pairs.

use serde::{Deserialize, Serialize};

/// A signage zone grouping lot codes. A lot may appear in several zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Short key, e.g. "Blue" or "Dark Blue"
    pub name: String,
    /// Display label, e.g. "Blue Zone"
    pub label: String,
    /// Member lot codes
    pub lots: Vec<String>,
}

impl Zone {
    pub fn new(name: &str, label: &str, lots: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            lots: lots.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Case-insensitive membership check.
    pub fn contains_lot(&self, lot_code: &str) -> bool {
        self.lots.iter().any(|l| l.eq_ignore_ascii_case(lot_code))
    }
}

/// An approximate walking time between two campus landmarks.
///
/// Only the literal pairs in the table are answerable; this is not a graph
/// and no path computation happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkingTime {
    pub from: String,
    pub to: String,
    pub minutes: u32,
}

impl WalkingTime {
    pub fn new(from: &str, to: &str, minutes: u32) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            minutes,
        }
    }

    /// Case-insensitive match against a queried pair, in the listed
    /// direction only.
    pub fn matches(&self, from: &str, to: &str) -> bool {
        self.from.eq_ignore_ascii_case(from.trim()) && self.to.eq_ignore_ascii_case(to.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_contains_lot_case_insensitive() {
        let zone = Zone::new("Red", "Red Zone", &["F-1", "F-2"]);
        assert!(zone.contains_lot("F-1"));
        assert!(zone.contains_lot("f-2"));
        assert!(!zone.contains_lot("B-1"));
    }

    #[test]
    fn test_walking_time_matches_listed_direction_only() {
        let wt = WalkingTime::new("Village", "BCC", 4);
        assert!(wt.matches("village", "bcc"));
        assert!(wt.matches(" Village ", "BCC"));
        assert!(!wt.matches("BCC", "Village"));
    }
}
