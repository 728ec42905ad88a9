//! Guards for the round state machine.
//!
//! Each check inspects a round snapshot and the current time and either
//! approves the transition or returns the error the caller should see. The
//! store applies approved transitions with a compare-and-swap on the status,
//! so a concurrent writer that got there first surfaces as the same errors.

use crate::domain::board::in_number_range;
use crate::domain::{Round, RoundStatus};
use crate::error::LotteryError;
use chrono::{DateTime, Utc};

/// Open → Closed, once the deadline has been reached.
pub fn deadline_reached(round: &Round, now: DateTime<Utc>) -> bool {
    round.status == RoundStatus::Open && now >= round.draw_deadline
}

pub fn check_close(round: &Round) -> Result<(), LotteryError> {
    if !round.status.can_transition_to(RoundStatus::Closed) {
        return Err(LotteryError::RoundNotOpen(round.id));
    }
    Ok(())
}

pub fn check_purchase(round: &Round) -> Result<(), LotteryError> {
    check_close(round)
}

/// Closed → Settled.
pub fn check_draw(
    round: &Round,
    numbers: [i32; 3],
    now: DateTime<Utc>,
) -> Result<[u8; 3], LotteryError> {
    if !round.status.can_transition_to(RoundStatus::Settled) {
        return Err(match round.status {
            RoundStatus::Settled => LotteryError::NumbersAlreadyDrawn(round.id),
            _ => LotteryError::RoundNotClosed(round.id),
        });
    }
    if round.winning_numbers.is_some() {
        return Err(LotteryError::NumbersAlreadyDrawn(round.id));
    }

    if let Some(n) = numbers.iter().find(|n| !in_number_range(**n)) {
        return Err(LotteryError::NumberOutOfRange(*n));
    }

    let expires_at = round.draw_window_closes_at();
    if now > expires_at {
        return Err(LotteryError::DrawWindowExpired {
            expired_at: expires_at,
        });
    }

    Ok(numbers.map(|n| n as u8))
}

/// Closed → Voided.
pub fn check_refund(round: &Round, now: DateTime<Utc>) -> Result<(), LotteryError> {
    if !round.status.can_transition_to(RoundStatus::Voided) {
        return Err(match round.status {
            RoundStatus::Settled => LotteryError::AlreadySettled(round.id),
            _ => LotteryError::RoundNotClosed(round.id),
        });
    }
    if round.winning_numbers.is_some() {
        return Err(LotteryError::AlreadySettled(round.id));
    }

    let opens_after = round.draw_window_closes_at();
    if now <= opens_after {
        let remaining_ms = (opens_after - now).num_milliseconds();
        return Err(LotteryError::RefundWindowNotYetOpen {
            hours_remaining: remaining_ms as f64 / 3_600_000.0,
            opens_at: opens_after,
        });
    }

    Ok(())
}
