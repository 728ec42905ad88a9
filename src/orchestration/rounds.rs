use crate::clock::Clock;
use crate::db::Repository;
use crate::domain::{Board, Round, RoundId, RoundStatus, RoundSummary, WinningNumbers};
use crate::engine::{is_winning, lifecycle};
use crate::error::LotteryError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Result of settling a round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOutcome {
    pub round_id: RoundId,
    pub winning_numbers: [u8; 3],
    pub drawn_at: DateTime<Utc>,
    pub total_boards: usize,
    pub winning_board_count: usize,
}

/// Result of voiding a round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    pub round_id: RoundId,
    pub refunded_board_count: u64,
}

/// Round queries and the administrator-driven transitions.
#[derive(Clone)]
pub struct RoundLifecycle {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
}

impl RoundLifecycle {
    pub fn new(repo: Arc<Repository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// The open round, if any. When several are open the newest one wins.
    pub async fn current_open_round(&self) -> Result<Option<RoundSummary>, LotteryError> {
        let Some(round) = self.repo.open_rounds().await?.into_iter().next() else {
            return Ok(None);
        };
        Ok(self.repo.round_summary(round.id).await?)
    }

    pub async fn get_round(&self, round_id: RoundId) -> Result<RoundSummary, LotteryError> {
        self.repo
            .round_summary(round_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Round", round_id))
    }

    /// All rounds, newest week first.
    pub async fn list_rounds(&self) -> Result<Vec<RoundSummary>, LotteryError> {
        Ok(self.repo.list_round_summaries().await?)
    }

    pub async fn round_boards(&self, round_id: RoundId) -> Result<Vec<Board>, LotteryError> {
        self.require_round(round_id).await?;
        Ok(self.repo.round_boards(round_id).await?)
    }

    pub async fn winning_boards(&self, round_id: RoundId) -> Result<Vec<Board>, LotteryError> {
        let round = self.require_round(round_id).await?;
        if round.winning_numbers.is_none() {
            return Err(LotteryError::RoundNotSettled(round_id));
        }
        Ok(self.repo.winning_boards(round_id).await?)
    }

    /// Create a new open round. Fails if one is already open.
    pub async fn open_round(
        &self,
        week_start: NaiveDate,
        draw_deadline: DateTime<Utc>,
    ) -> Result<Round, LotteryError> {
        let mut tx = self.repo.begin_write().await?;
        if !tx.open_rounds().await?.is_empty() {
            return Err(LotteryError::OpenRoundExists);
        }
        let round = Round::new_open(week_start, draw_deadline, self.clock.now());
        tx.insert_round(&round).await?;
        tx.commit().await?;

        info!(
            round_id = %round.id,
            week_start = %round.week_start,
            draw_deadline = %round.draw_deadline,
            "Round opened"
        );
        Ok(round)
    }

    pub async fn close_round(&self, round_id: RoundId) -> Result<Round, LotteryError> {
        let mut tx = self.repo.begin_write().await?;
        let mut round = tx
            .round(round_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Round", round_id))?;
        lifecycle::check_close(&round)?;

        if !tx.close_round(round_id, self.clock.now()).await? {
            return Err(LotteryError::RoundNotOpen(round_id));
        }
        tx.commit().await?;

        round.status = RoundStatus::Closed;
        info!(round_id = %round_id, "Round closed");
        Ok(round)
    }

    /// Closed → Settled: attach the drawn numbers and mark the winning boards.
    pub async fn draw_numbers(
        &self,
        round_id: RoundId,
        numbers: [i32; 3],
    ) -> Result<DrawOutcome, LotteryError> {
        let now = self.clock.now();
        let mut tx = self.repo.begin_write().await?;
        let round = tx
            .round(round_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Round", round_id))?;
        let drawn = lifecycle::check_draw(&round, numbers, now)?;

        let winning = WinningNumbers {
            numbers: drawn,
            drawn_at: now,
        };
        if !tx.settle_round(round_id, &winning).await? {
            return Err(LotteryError::NumbersAlreadyDrawn(round_id));
        }

        let boards = tx.round_boards(round_id).await?;
        let mut winning_board_count = 0;
        for board in &boards {
            let wins = is_winning(&board.numbers, drawn);
            if wins {
                winning_board_count += 1;
            }
            tx.set_board_winning(board.id, wins).await?;
        }
        tx.commit().await?;

        info!(
            round_id = %round_id,
            numbers = ?drawn,
            total_boards = boards.len(),
            winning_boards = winning_board_count,
            "Round settled"
        );
        Ok(DrawOutcome {
            round_id,
            winning_numbers: drawn,
            drawn_at: now,
            total_boards: boards.len(),
            winning_board_count,
        })
    }

    /// Closed → Voided: remove every board so each purchaser's balance is restored.
    pub async fn refund(&self, round_id: RoundId) -> Result<RefundOutcome, LotteryError> {
        let now = self.clock.now();
        let mut tx = self.repo.begin_write().await?;
        let round = tx
            .round(round_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Round", round_id))?;
        lifecycle::check_refund(&round, now)?;

        if !tx.void_round(round_id, now).await? {
            return Err(LotteryError::AlreadySettled(round_id));
        }
        let refunded_board_count = tx.soft_delete_round_boards(round_id, now).await?;
        tx.commit().await?;

        info!(round_id = %round_id, refunded_boards = refunded_board_count, "Round refunded");
        Ok(RefundOutcome {
            round_id,
            refunded_board_count,
        })
    }

    async fn require_round(&self, round_id: RoundId) -> Result<Round, LotteryError> {
        self.repo
            .get_round(round_id)
            .await?
            .ok_or_else(|| LotteryError::not_found("Round", round_id))
    }
}
