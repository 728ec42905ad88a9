/// A board wins when every drawn number appears among its numbers.
///
/// The drawn numbers behave as a set: order is irrelevant and duplicates collapse.
pub fn is_winning(board_numbers: &[u8], drawn: [u8; 3]) -> bool {
    drawn.iter().all(|n| board_numbers.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superset_wins() {
        assert!(is_winning(&[1, 2, 5, 7, 8], [1, 2, 5]));
    }

    #[test]
    fn test_missing_number_loses() {
        assert!(!is_winning(&[1, 2, 5, 7, 8], [1, 2, 9]));
    }

    #[test]
    fn test_order_irrelevant() {
        assert!(is_winning(&[1, 2, 4, 5, 7], [5, 1, 2]));
        assert!(is_winning(&[1, 2, 4, 5, 7], [2, 5, 1]));
    }

    #[test]
    fn test_duplicates_collapse() {
        assert!(is_winning(&[3, 9, 10, 11, 12], [9, 9, 9]));
        assert!(is_winning(&[3, 9, 10, 11, 12], [3, 9, 3]));
        assert!(!is_winning(&[3, 9, 10, 11, 12], [4, 4, 9]));
    }

    #[test]
    fn test_exhaustive_against_set_semantics() {
        let board = [2u8, 4, 6, 8, 10, 12];
        for a in 1..=16u8 {
            for b in 1..=16u8 {
                for c in 1..=16u8 {
                    let expected = [a, b, c].iter().all(|n| n % 2 == 0 && *n <= 12);
                    assert_eq!(is_winning(&board, [a, b, c]), expected, "{a},{b},{c}");
                }
            }
        }
    }
}
