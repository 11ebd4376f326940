//! Normalized winning-record types
//!
//! The ledger and detail endpoints report the same facts under shifting
//! field names; these types are the uniform projection the rest of the
//! application (and the notification layer behind it) consumes.

use serde::Serialize;

/// How the numbers of one slot line were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Server-generated numbers
    Auto,
    /// Caller-supplied numbers
    Manual,
    /// Mixed: some numbers fixed, the rest generated
    SemiAuto,
    /// The endpoints never revealed a usable method field
    Unknown,
}

impl SelectionMethod {
    /// Map a raw field value onto a method
    ///
    /// Accepts the site's numeric gen-type codes as well as the Korean and
    /// English labels that show up in detail payloads. Anything else is
    /// `Unknown` — a legitimate terminal value, not an error.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "auto" | "자동" => Self::Auto,
            "1" | "manual" | "수동" => Self::Manual,
            "2" | "semi" | "semiauto" | "semi-auto" | "반자동" => Self::SemiAuto,
            _ => Self::Unknown,
        }
    }
}

/// Win classification of one slot line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WinStatus {
    /// Placed at `rank` (1 is the jackpot)
    Won {
        /// Prize rank, 1..=5
        rank: u8,
    },
    /// No prize this round
    Lost,
    /// The round has not been drawn yet, or the field was unreadable
    Unknown,
}

impl WinStatus {
    /// Interpret the site's `winGrade`-style rank value
    ///
    /// 0 or missing means no win; 1..=5 is a prize rank.
    pub fn from_grade(grade: Option<i64>) -> Self {
        match grade {
            Some(0) => Self::Lost,
            Some(rank @ 1..=5) => Self::Won { rank: rank as u8 },
            Some(_) => Self::Unknown,
            None => Self::Unknown,
        }
    }
}

/// One ball of a slot line, flagged when it matched the draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ball {
    /// Ball number, 1..=45
    pub number: u8,
    /// Whether this number was among the drawn numbers
    pub matched: bool,
}

/// One slot line of a historical purchase
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlotLine {
    /// Slot label within the ticket
    pub label: String,
    /// Win classification
    pub status: WinStatus,
    /// How the numbers were chosen
    pub method: SelectionMethod,
    /// The six numbers with matched flags
    pub balls: Vec<Ball>,
}

/// Normalized projection of the most recent round's purchases
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WinningRecord {
    /// Draw round
    pub round: u32,
    /// Total prize over all lines, formatted with thousands separators
    pub total_prize: String,
    /// Latest purchase date among the round's entries
    pub purchase_date: String,
    /// Result announcement date
    pub result_date: String,
    /// Per-slot lines
    pub lines: Vec<SlotLine>,
}

/// Verification outcome: a record, or the explicit no-data sentinel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WinningCheck {
    /// No purchases found in the search window
    NoData,
    /// The newest round's normalized record
    Record(WinningRecord),
}

impl WinningCheck {
    /// Whether any winning data was found
    pub fn has_data(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", SelectionMethod::Auto)]
    #[case("AUTO", SelectionMethod::Auto)]
    #[case("자동", SelectionMethod::Auto)]
    #[case("1", SelectionMethod::Manual)]
    #[case("수동", SelectionMethod::Manual)]
    #[case("2", SelectionMethod::SemiAuto)]
    #[case("반자동", SelectionMethod::SemiAuto)]
    #[case("whatever", SelectionMethod::Unknown)]
    #[case("", SelectionMethod::Unknown)]
    fn test_selection_method_from_raw(#[case] raw: &str, #[case] expected: SelectionMethod) {
        assert_eq!(SelectionMethod::from_raw(raw), expected);
    }

    #[test]
    fn test_win_status_from_grade() {
        assert_eq!(WinStatus::from_grade(Some(0)), WinStatus::Lost);
        assert_eq!(WinStatus::from_grade(Some(1)), WinStatus::Won { rank: 1 });
        assert_eq!(WinStatus::from_grade(Some(5)), WinStatus::Won { rank: 5 });
        assert_eq!(WinStatus::from_grade(Some(99)), WinStatus::Unknown);
        assert_eq!(WinStatus::from_grade(None), WinStatus::Unknown);
    }

    #[test]
    fn test_winning_check_serialization() {
        let check = WinningCheck::NoData;
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "no_data");
        assert!(!check.has_data());
    }
}
