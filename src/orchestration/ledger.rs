use crate::clock::Clock;
use crate::db::Repository;
use crate::domain::deposit::{validate_amount, validate_external_ref};
use crate::domain::{Decimal, Deposit, DepositId, DepositStatus, PlayerId};
use crate::engine::compute_balance;
use crate::error::LotteryError;
use std::sync::Arc;
use tracing::info;

/// Deposits and the derived player balance.
#[derive(Clone)]
pub struct LedgerService {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(repo: Arc<Repository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Approved deposits minus active board charges, floored at zero.
    ///
    /// Recomputed from the source records on every call.
    pub async fn balance(&self, player_id: PlayerId) -> Result<Decimal, LotteryError> {
        if self.repo.get_player(player_id).await?.is_none() {
            return Err(LotteryError::not_found("Player", player_id));
        }
        let deposits = self.repo.approved_amounts(player_id).await?;
        let charges = self.repo.active_charges(player_id).await?;
        Ok(compute_balance(&deposits, &charges))
    }

    pub async fn record_deposit(
        &self,
        player_id: PlayerId,
        amount: Decimal,
        external_ref: &str,
    ) -> Result<Deposit, LotteryError> {
        let amount = validate_amount(amount)?;
        let external_ref = validate_external_ref(external_ref)?;

        let mut tx = self.repo.begin_write().await?;
        if tx.player(player_id).await?.is_none() {
            return Err(LotteryError::not_found("Player", player_id));
        }
        let deposit = Deposit::new_pending(player_id, amount, external_ref, self.clock.now());
        tx.insert_deposit(&deposit).await?;
        tx.commit().await?;

        info!(
            deposit_id = %deposit.id,
            player_id = %player_id,
            amount = %deposit.amount,
            "Deposit recorded"
        );
        Ok(deposit)
    }

    /// Approve a pending deposit, optionally correcting its amount.
    pub async fn approve_deposit(
        &self,
        deposit_id: DepositId,
        override_amount: Option<Decimal>,
    ) -> Result<Deposit, LotteryError> {
        let override_amount = override_amount.map(validate_amount).transpose()?;

        let mut tx = self.repo.begin_write().await?;
        let mut deposit = tx
            .deposit(deposit_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Deposit", deposit_id))?;
        if deposit.is_approved() {
            return Err(LotteryError::AlreadyApproved(deposit_id));
        }

        let now = self.clock.now();
        let amount = override_amount.unwrap_or(deposit.amount);
        if !tx.approve_deposit(deposit_id, amount, now).await? {
            return Err(LotteryError::AlreadyApproved(deposit_id));
        }
        tx.commit().await?;

        deposit.amount = amount;
        deposit.status = DepositStatus::Approved;
        deposit.approved_at = Some(now);

        info!(
            deposit_id = %deposit_id,
            player_id = %deposit.player_id,
            amount = %amount,
            corrected = override_amount.is_some(),
            "Deposit approved"
        );
        Ok(deposit)
    }

    /// Soft-delete a pending deposit. Approved deposits cannot be dismissed.
    pub async fn dismiss_deposit(&self, deposit_id: DepositId) -> Result<DepositId, LotteryError> {
        let mut tx = self.repo.begin_write().await?;
        let deposit = tx
            .deposit(deposit_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Deposit", deposit_id))?;
        if deposit.is_approved() {
            return Err(LotteryError::AlreadyApproved(deposit_id));
        }
        if !tx.dismiss_deposit(deposit_id, self.clock.now()).await? {
            return Err(LotteryError::AlreadyApproved(deposit_id));
        }
        tx.commit().await?;

        info!(deposit_id = %deposit_id, player_id = %deposit.player_id, "Deposit dismissed");
        Ok(deposit_id)
    }

    pub async fn pending_deposits(&self) -> Result<Vec<Deposit>, LotteryError> {
        Ok(self.repo.pending_deposits().await?)
    }

    pub async fn player_deposits(&self, player_id: PlayerId) -> Result<Vec<Deposit>, LotteryError> {
        if self.repo.get_player(player_id).await?.is_none() {
            return Err(LotteryError::not_found("Player", player_id));
        }
        Ok(self.repo.player_deposits(player_id).await?)
    }
}
