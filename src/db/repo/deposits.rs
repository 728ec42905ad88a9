use super::{parse_amounts, parse_column, Repository, WriteTx};
use crate::domain::primitives::{from_millis, to_millis};
use crate::domain::{Decimal, Deposit, DepositId, DepositStatus, PlayerId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const DEPOSIT_COLUMNS: &str =
    "id, player_id, amount, external_ref, is_approved, created_at, approved_at";

fn deposit_from_row(row: &SqliteRow) -> Result<Deposit, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let player_id: String = row.try_get("player_id")?;
    let amount: String = row.try_get("amount")?;
    let is_approved: bool = row.try_get("is_approved")?;
    let approved_at: Option<i64> = row.try_get("approved_at")?;

    Ok(Deposit {
        id: parse_column(&id)?,
        player_id: parse_column(&player_id)?,
        amount: parse_column(&amount)?,
        external_ref: row.try_get("external_ref")?,
        status: if is_approved {
            DepositStatus::Approved
        } else {
            DepositStatus::Pending
        },
        created_at: from_millis(row.try_get("created_at")?),
        approved_at: approved_at.map(from_millis),
    })
}

async fn fetch_deposit(
    conn: &mut SqliteConnection,
    id: DepositId,
) -> Result<Option<Deposit>, sqlx::Error> {
    let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE id = ? AND deleted_at IS NULL");
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(deposit_from_row).transpose()
}

async fn fetch_approved_amounts(
    conn: &mut SqliteConnection,
    player_id: PlayerId,
) -> Result<Vec<Decimal>, sqlx::Error> {
    let amounts: Vec<String> = sqlx::query_scalar(
        "SELECT amount FROM deposits WHERE player_id = ? AND is_approved = 1 AND deleted_at IS NULL",
    )
    .bind(player_id.to_string())
    .fetch_all(&mut *conn)
    .await?;
    parse_amounts(amounts)
}

impl Repository {
    pub async fn get_deposit(&self, id: DepositId) -> Result<Option<Deposit>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_deposit(&mut conn, id).await
    }

    /// Pending, non-dismissed deposits, oldest first.
    pub async fn pending_deposits(&self) -> Result<Vec<Deposit>, sqlx::Error> {
        let sql = format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits \
             WHERE is_approved = 0 AND deleted_at IS NULL ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(deposit_from_row).collect()
    }

    /// A player's non-dismissed deposits, newest first.
    pub async fn player_deposits(&self, player_id: PlayerId) -> Result<Vec<Deposit>, sqlx::Error> {
        let sql = format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits \
             WHERE player_id = ? AND deleted_at IS NULL ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(player_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(deposit_from_row).collect()
    }

    pub async fn approved_amounts(&self, player_id: PlayerId) -> Result<Vec<Decimal>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_approved_amounts(&mut conn, player_id).await
    }
}

impl WriteTx<'_> {
    pub async fn deposit(&mut self, id: DepositId) -> Result<Option<Deposit>, sqlx::Error> {
        fetch_deposit(self.conn(), id).await
    }

    pub async fn approved_amounts(&mut self, player_id: PlayerId) -> Result<Vec<Decimal>, sqlx::Error> {
        fetch_approved_amounts(self.conn(), player_id).await
    }

    pub async fn insert_deposit(&mut self, deposit: &Deposit) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO deposits (id, player_id, amount, external_ref, is_approved, created_at, approved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(deposit.id.to_string())
        .bind(deposit.player_id.to_string())
        .bind(deposit.amount.to_canonical_string())
        .bind(&deposit.external_ref)
        .bind(deposit.is_approved())
        .bind(to_millis(deposit.created_at))
        .bind(deposit.approved_at.map(to_millis))
        .execute(self.conn())
        .await?;
        Ok(())
    }

    /// Pending → Approved with the final amount. Returns false if the deposit
    /// was already approved or dismissed.
    pub async fn approve_deposit(
        &mut self,
        id: DepositId,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE deposits SET is_approved = 1, amount = ?, approved_at = ?
            WHERE id = ? AND is_approved = 0 AND deleted_at IS NULL
            "#,
        )
        .bind(amount.to_canonical_string())
        .bind(to_millis(at))
        .bind(id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Soft-delete a pending deposit. Returns false if it was approved or already dismissed.
    pub async fn dismiss_deposit(&mut self, id: DepositId, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deposits SET deleted_at = ? WHERE id = ? AND is_approved = 0 AND deleted_at IS NULL",
        )
        .bind(to_millis(at))
        .bind(id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
