//! Boards (tickets), the field-count price table and selection validation.

use crate::domain::{BoardId, Decimal, PlayerId, RoundId};
use crate::error::LotteryError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Lowest number a player or the draw may pick.
pub const MIN_NUMBER: i32 = 1;
/// Highest number a player or the draw may pick.
pub const MAX_NUMBER: i32 = 16;

/// Static price per field count, in whole currency units.
pub const PRICE_TABLE: [(u8, i64); 4] = [(5, 20), (6, 40), (7, 80), (8, 160)];

/// Number of fields chosen on a board: 5, 6, 7 or 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldCount(u8);

impl FieldCount {
    pub fn new(count: i32) -> Result<Self, LotteryError> {
        PRICE_TABLE
            .iter()
            .find(|(fields, _)| i32::from(*fields) == count)
            .map(|(fields, _)| FieldCount(*fields))
            .ok_or(LotteryError::InvalidFieldCount(count))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn price(&self) -> Decimal {
        PRICE_TABLE
            .iter()
            .find(|(fields, _)| *fields == self.0)
            .map(|(_, price)| Decimal::from_units(*price))
            .unwrap_or_default()
    }
}

pub fn in_number_range(n: i32) -> bool {
    (MIN_NUMBER..=MAX_NUMBER).contains(&n)
}

/// A validated board selection: field count plus its sorted, distinct numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub field_count: FieldCount,
    pub numbers: Vec<u8>,
}

impl Selection {
    /// Validate a raw selection, reporting the first violated rule.
    ///
    /// Order: field count, number count, duplicates, range.
    pub fn validate(field_count: i32, numbers: &[i32]) -> Result<Self, LotteryError> {
        let field_count = FieldCount::new(field_count)?;

        if numbers.len() != usize::from(field_count.get()) {
            return Err(LotteryError::NumberCountMismatch {
                expected: usize::from(field_count.get()),
                actual: numbers.len(),
            });
        }

        let mut seen = HashSet::with_capacity(numbers.len());
        for n in numbers {
            if !seen.insert(*n) {
                return Err(LotteryError::DuplicateNumbers(*n));
            }
        }

        if let Some(n) = numbers.iter().find(|n| !in_number_range(**n)) {
            return Err(LotteryError::NumberOutOfRange(*n));
        }

        let mut sorted: Vec<u8> = numbers.iter().map(|n| *n as u8).collect();
        sorted.sort_unstable();

        Ok(Selection {
            field_count,
            numbers: sorted,
        })
    }

    pub fn price(&self) -> Decimal {
        self.field_count.price()
    }
}

/// A player's ticket in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub field_count: FieldCount,
    pub price: Decimal,
    /// Sorted ascending.
    pub numbers: Vec<u8>,
    pub is_winning: bool,
    pub created_at: DateTime<Utc>,
}

impl Board {
    pub fn new(
        player_id: PlayerId,
        round_id: RoundId,
        selection: Selection,
        created_at: DateTime<Utc>,
    ) -> Self {
        Board {
            id: BoardId::new(),
            player_id,
            round_id,
            price: selection.price(),
            field_count: selection.field_count,
            numbers: selection.numbers,
            is_winning: false,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table() {
        assert_eq!(FieldCount::new(5).unwrap().price(), Decimal::from_units(20));
        assert_eq!(FieldCount::new(6).unwrap().price(), Decimal::from_units(40));
        assert_eq!(FieldCount::new(7).unwrap().price(), Decimal::from_units(80));
        assert_eq!(FieldCount::new(8).unwrap().price(), Decimal::from_units(160));
    }

    #[test]
    fn test_invalid_field_count() {
        for count in [0, 4, 9, -5] {
            assert!(matches!(
                FieldCount::new(count),
                Err(LotteryError::InvalidFieldCount(c)) if c == count
            ));
        }
    }

    #[test]
    fn test_selection_sorts_numbers() {
        let selection = Selection::validate(5, &[8, 1, 7, 2, 5]).unwrap();
        assert_eq!(selection.numbers, vec![1, 2, 5, 7, 8]);
        assert_eq!(selection.price(), Decimal::from_units(20));
    }

    #[test]
    fn test_selection_count_mismatch() {
        let err = Selection::validate(6, &[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::NumberCountMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_selection_duplicates() {
        let err = Selection::validate(5, &[1, 2, 3, 3, 4]).unwrap_err();
        assert!(matches!(err, LotteryError::DuplicateNumbers(3)));
    }

    #[test]
    fn test_selection_out_of_range() {
        let err = Selection::validate(5, &[1, 2, 3, 4, 17]).unwrap_err();
        assert!(matches!(err, LotteryError::NumberOutOfRange(17)));

        let err = Selection::validate(5, &[0, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, LotteryError::NumberOutOfRange(0)));
    }

    #[test]
    fn test_first_violation_wins() {
        // Wrong count and duplicates: count is reported.
        let err = Selection::validate(5, &[1, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, LotteryError::NumberCountMismatch { .. }));

        // Duplicates and out of range: duplicates are reported.
        let err = Selection::validate(5, &[20, 20, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, LotteryError::DuplicateNumbers(20)));

        // Bad field count trumps everything.
        let err = Selection::validate(3, &[20, 20, 1]).unwrap_err();
        assert!(matches!(err, LotteryError::InvalidFieldCount(3)));
    }
}
