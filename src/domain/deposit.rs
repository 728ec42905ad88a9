//! Player deposits awaiting or carrying administrator approval.

use crate::domain::{Decimal, DepositId, PlayerId};
use crate::error::LotteryError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Largest single deposit accepted.
pub const MAX_DEPOSIT_UNITS: i64 = 100_000;
/// Longest external payment reference accepted.
pub const MAX_EXTERNAL_REF_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DepositStatus {
    Pending,
    Approved,
}

/// A credit to a player's balance, reconciled against an external payment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: DepositId,
    pub player_id: PlayerId,
    pub amount: Decimal,
    pub external_ref: String,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Deposit {
    pub fn new_pending(
        player_id: PlayerId,
        amount: Decimal,
        external_ref: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Deposit {
            id: DepositId::new(),
            player_id,
            amount,
            external_ref,
            status: DepositStatus::Pending,
            created_at,
            approved_at: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DepositStatus::Approved
    }
}

/// Amounts must be positive, bounded, and expressible in two decimal places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LotteryError> {
    if !amount.is_positive() {
        return Err(LotteryError::InvalidAmount(format!(
            "amount must be greater than 0, got {}",
            amount
        )));
    }
    if amount > Decimal::from_units(MAX_DEPOSIT_UNITS) {
        return Err(LotteryError::InvalidAmount(format!(
            "amount must not exceed {}, got {}",
            MAX_DEPOSIT_UNITS, amount
        )));
    }
    if amount.exceeds_money_scale() {
        return Err(LotteryError::InvalidAmount(format!(
            "amount must have at most two decimal places, got {}",
            amount
        )));
    }
    Ok(amount)
}

pub fn validate_external_ref(external_ref: &str) -> Result<String, LotteryError> {
    let trimmed = external_ref.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_EXTERNAL_REF_LEN {
        return Err(LotteryError::InvalidExternalRef);
    }
    Ok(trimmed.to_string())
}
