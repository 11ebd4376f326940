//! Purchase outcome types

use serde::Serialize;

/// Numbers the server assigned to one slot of a successful purchase
///
/// Parsed from the submit response's `arrGameChoiceNum` entries, which look
/// like `"01|02|03|04|05|06|A3"`: six pipe-joined numbers followed by the
/// slot label with a trailing selection-mode digit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssignedSlot {
    /// Slot label ("A".."E"), empty if the entry had no label segment
    pub label: String,
    /// The six assigned numbers; shorter if segments failed to parse
    pub numbers: Vec<u8>,
    /// The raw entry as received, for display and diagnostics
    pub raw: String,
}

impl AssignedSlot {
    /// Parse one `arrGameChoiceNum` entry, keeping the raw form around
    pub fn parse(entry: &str) -> Self {
        let segments: Vec<&str> = entry.split('|').collect();

        let numbers = segments
            .iter()
            .take(6)
            .filter_map(|segment| segment.trim().parse::<u8>().ok())
            .collect();

        let label = segments
            .get(6)
            .map(|tail| tail.trim_end_matches(|c: char| c.is_ascii_digit()))
            .unwrap_or("")
            .to_string();

        Self {
            label,
            numbers,
            raw: entry.to_string(),
        }
    }
}

/// Classified result of one purchase call
///
/// Malformed responses (HTML where JSON was expected) are not an outcome;
/// they surface as [`crate::Error::MalformedResponse`] once the retry
/// budget is exhausted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// The purchase executed; the server assigned numbers per slot
    Success {
        /// Round the tickets were bought into
        round: String,
        /// Per-slot assigned numbers
        slots: Vec<AssignedSlot>,
    },
    /// Well-formed response reporting a domain-level refusal
    /// (insufficient balance, duplicate purchase, sales closed, ...)
    BusinessFailure {
        /// The server's `resultMsg`
        reason: String,
    },
}

impl PurchaseOutcome {
    /// Whether the purchase executed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_slot_parse() {
        let slot = AssignedSlot::parse("01|02|03|04|05|06|A3");
        assert_eq!(slot.label, "A");
        assert_eq!(slot.numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(slot.raw, "01|02|03|04|05|06|A3");
    }

    #[test]
    fn test_assigned_slot_parse_without_label_segment() {
        let slot = AssignedSlot::parse("11|12|13|14|15|16");
        assert_eq!(slot.label, "");
        assert_eq!(slot.numbers, vec![11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn test_assigned_slot_parse_garbage_keeps_raw() {
        let slot = AssignedSlot::parse("??");
        assert!(slot.numbers.is_empty());
        assert_eq!(slot.raw, "??");
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let outcome = PurchaseOutcome::BusinessFailure {
            reason: "잔액이 부족합니다".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "business_failure");
        assert_eq!(json["reason"], "잔액이 부족합니다");
        assert!(!outcome.is_success());
    }
}
