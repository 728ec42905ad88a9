use crate::domain::Decimal;

/// Spendable balance derived from the ledger's source records.
///
/// `approved_deposits` are the amounts of approved, non-dismissed deposits;
/// `active_charges` are the prices of the player's boards in non-voided rounds.
/// The result is floored at zero.
pub fn compute_balance(approved_deposits: &[Decimal], active_charges: &[Decimal]) -> Decimal {
    let credits: Decimal = approved_deposits.iter().sum();
    let debits: Decimal = active_charges.iter().sum();
    (credits - debits).floor_zero()
}

/// How much is missing to afford `price`, or `None` when the balance covers it.
pub fn shortfall(balance: Decimal, price: Decimal) -> Option<Decimal> {
    if balance >= price {
        None
    } else {
        Some(price - balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_ledger_is_zero() {
        assert_eq!(compute_balance(&[], &[]), Decimal::zero());
    }

    #[test]
    fn test_deposits_minus_charges() {
        let balance = compute_balance(&[d("100"), d("50.50")], &[d("20"), d("40")]);
        assert_eq!(balance, d("90.5"));
    }

    #[test]
    fn test_balance_never_negative() {
        assert_eq!(compute_balance(&[d("10")], &[d("20")]), Decimal::zero());
        assert_eq!(compute_balance(&[], &[d("160")]), Decimal::zero());
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(shortfall(d("80"), d("20")), None);
        assert_eq!(shortfall(d("20"), d("20")), None);
        assert_eq!(shortfall(d("15"), d("40")), Some(d("25")));
    }
}
