use crate::clock::Clock;
use crate::db::Repository;
use crate::domain::{Board, PlayerId, RoundId, Selection};
use crate::engine::ledger::shortfall;
use crate::engine::{compute_balance, lifecycle};
use crate::error::LotteryError;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub field_count: i32,
    pub numbers: Vec<i32>,
}

/// Buys boards against a player's derived balance.
#[derive(Clone)]
pub struct BoardPurchaser {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
}

impl BoardPurchaser {
    pub fn new(repo: Arc<Repository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Validate the selection, then check the player, the round and the balance
    /// and create the board, all inside one write transaction.
    ///
    /// The first violated rule wins.
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<Board, LotteryError> {
        let selection = Selection::validate(request.field_count, &request.numbers)?;
        let price = selection.price();

        let mut tx = self.repo.begin_write().await?;

        let player = tx
            .player(request.player_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Player", request.player_id))?;
        if !player.is_active {
            return Err(LotteryError::PlayerInactive(player.id));
        }

        let round = tx
            .round(request.round_id)
            .await?
            .ok_or(LotteryError::RoundNotOpen(request.round_id))?;
        lifecycle::check_purchase(&round)?;

        let deposits = tx.approved_amounts(player.id).await?;
        let charges = tx.active_charges(player.id).await?;
        let balance = compute_balance(&deposits, &charges);
        if let Some(missing) = shortfall(balance, price) {
            debug!(
                player_id = %player.id,
                price = %price,
                balance = %balance,
                missing = %missing,
                "Purchase rejected for insufficient balance"
            );
            return Err(LotteryError::InsufficientBalance {
                required: price,
                available: balance,
            });
        }

        let board = Board::new(player.id, round.id, selection, self.clock.now());
        tx.insert_board(&board).await?;
        tx.commit().await?;

        info!(
            board_id = %board.id,
            player_id = %board.player_id,
            round_id = %board.round_id,
            field_count = board.field_count.get(),
            price = %board.price,
            "Board purchased"
        );
        Ok(board)
    }
}
