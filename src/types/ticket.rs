//! Ticket selection and purchase-form slot rendering

use crate::{Error, Result};
use serde::Serialize;

/// Slot labels, assigned by position within one purchase
pub const SLOT_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Maximum slots per purchase call
pub const MAX_SLOTS: usize = SLOT_LABELS.len();

/// Price of one slot in won
pub const SLOT_PRICE_WON: u32 = 1000;

/// Valid ball number range
const NUMBER_RANGE: std::ops::RangeInclusive<u8> = 1..=45;

/// Numbers per slot
const NUMBERS_PER_SLOT: usize = 6;

/// Number selection for one purchase call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketSelection {
    /// Server-generated numbers for `count` slots
    Auto {
        /// Requested slot count, 1..=5
        count: usize,
    },
    /// Caller-supplied number sets, one per slot
    Manual {
        /// One set of six numbers per requested slot
        sets: Vec<Vec<u8>>,
    },
}

/// One slot entry in the purchase form's `param` field
///
/// `alpabet` is the site's own field name, misspelling included.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GameSlot {
    /// "0" for auto, "1" for manual
    #[serde(rename = "genType")]
    pub gen_type: &'static str,
    /// Comma-joined two-digit numbers; absent for auto slots
    #[serde(rename = "arrGameChoiceNum")]
    pub numbers: Option<String>,
    /// Slot label
    #[serde(rename = "alpabet")]
    pub alphabet: &'static str,
}

impl TicketSelection {
    /// Server-picked numbers for `count` slots
    pub fn auto(count: usize) -> Self {
        Self::Auto { count }
    }

    /// Caller-picked number sets
    pub fn manual(sets: Vec<Vec<u8>>) -> Self {
        Self::Manual { sets }
    }

    /// Number of slots this selection requests
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Auto { count } => *count,
            Self::Manual { sets } => sets.len(),
        }
    }

    /// Check the count/range invariants
    ///
    /// Rejected selections never reach the network.
    pub fn validate(&self) -> Result<()> {
        let count = self.slot_count();
        if count == 0 || count > MAX_SLOTS {
            return Err(Error::validation(format!(
                "slot count must be between 1 and {}, got {}",
                MAX_SLOTS, count
            )));
        }

        if let Self::Manual { sets } = self {
            for (index, set) in sets.iter().enumerate() {
                if set.len() != NUMBERS_PER_SLOT {
                    return Err(Error::validation(format!(
                        "slot {} needs exactly {} numbers, got {}",
                        SLOT_LABELS[index],
                        NUMBERS_PER_SLOT,
                        set.len()
                    )));
                }
                for number in set {
                    if !NUMBER_RANGE.contains(number) {
                        return Err(Error::validation(format!(
                            "slot {} number {} is out of range 1..=45",
                            SLOT_LABELS[index], number
                        )));
                    }
                }
                let mut seen = [false; 46];
                for number in set {
                    if std::mem::replace(&mut seen[*number as usize], true) {
                        return Err(Error::validation(format!(
                            "slot {} contains duplicate number {}",
                            SLOT_LABELS[index], number
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the per-slot `param` entries the purchase form expects
    pub fn to_game_slots(&self) -> Result<Vec<GameSlot>> {
        self.validate()?;

        let slots = match self {
            Self::Auto { count } => SLOT_LABELS[..*count]
                .iter()
                .map(|&label| GameSlot {
                    gen_type: "0",
                    numbers: None,
                    alphabet: label,
                })
                .collect(),
            Self::Manual { sets } => sets
                .iter()
                .zip(SLOT_LABELS.iter())
                .map(|(set, &label)| GameSlot {
                    gen_type: "1",
                    numbers: Some(
                        set.iter()
                            .map(|number| format!("{:02}", number))
                            .collect::<Vec<_>>()
                            .join(","),
                    ),
                    alphabet: label,
                })
                .collect(),
        };

        Ok(slots)
    }

    /// Purchase amount in won for this selection
    pub fn amount_won(&self) -> u32 {
        SLOT_PRICE_WON * self.slot_count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_auto_slots() {
        let slots = TicketSelection::auto(3).to_game_slots().unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].alphabet, "A");
        assert_eq!(slots[2].alphabet, "C");
        assert!(slots.iter().all(|s| s.gen_type == "0" && s.numbers.is_none()));
    }

    #[test]
    fn test_manual_slots_zero_pad_numbers() {
        let selection = TicketSelection::manual(vec![vec![1, 2, 13, 24, 35, 45]]);
        let slots = selection.to_game_slots().unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].gen_type, "1");
        assert_eq!(slots[0].numbers.as_deref(), Some("01,02,13,24,35,45"));
    }

    #[rstest]
    #[case::zero_slots(TicketSelection::auto(0))]
    #[case::too_many_slots(TicketSelection::auto(6))]
    #[case::short_set(TicketSelection::manual(vec![vec![1, 2, 3, 4, 5]]))]
    #[case::long_set(TicketSelection::manual(vec![vec![1, 2, 3, 4, 5, 6, 7]]))]
    #[case::number_too_large(TicketSelection::manual(vec![vec![1, 2, 3, 4, 5, 46]]))]
    #[case::number_zero(TicketSelection::manual(vec![vec![0, 2, 3, 4, 5, 6]]))]
    #[case::duplicate_number(TicketSelection::manual(vec![vec![7, 7, 3, 4, 5, 6]]))]
    fn test_invalid_selections_rejected(#[case] selection: TicketSelection) {
        assert!(matches!(
            selection.validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_max_slot_manual_selection_is_valid() {
        let sets = (0..5)
            .map(|i| vec![1 + i, 10 + i, 20 + i, 30 + i, 40 + i, 45 - i])
            .collect();
        let selection = TicketSelection::manual(sets);
        assert!(selection.validate().is_ok());
        assert_eq!(selection.amount_won(), 5000);
    }

    #[test]
    fn test_game_slot_serializes_site_field_names() {
        let slots = TicketSelection::auto(1).to_game_slots().unwrap();
        let json = serde_json::to_string(&slots).unwrap();
        assert_eq!(
            json,
            r#"[{"genType":"0","arrGameChoiceNum":null,"alpabet":"A"}]"#
        );
    }
}
