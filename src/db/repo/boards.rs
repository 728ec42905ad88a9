use super::{decode_err, parse_amounts, parse_column, Repository, WriteTx};
use crate::domain::board::FieldCount;
use crate::domain::primitives::{from_millis, to_millis};
use crate::domain::{Board, BoardId, Decimal, PlayerId, RoundId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

// Numbers travel as a comma-joined list so one row carries a whole board.
const BOARD_SELECT: &str = r#"
    SELECT b.id, b.player_id, b.round_id, b.field_count, b.price, b.is_winning, b.created_at,
           (SELECT GROUP_CONCAT(n.number) FROM
               (SELECT number FROM board_numbers WHERE board_id = b.id ORDER BY number) n)
               AS numbers
    FROM boards b
"#;

fn board_from_row(row: &SqliteRow) -> Result<Board, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let player_id: String = row.try_get("player_id")?;
    let round_id: String = row.try_get("round_id")?;
    let price: String = row.try_get("price")?;
    let field_count: i64 = row.try_get("field_count")?;
    let numbers: Option<String> = row.try_get("numbers")?;

    let mut numbers = numbers
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(parse_column::<u8>)
        .collect::<Result<Vec<u8>, _>>()?;
    numbers.sort_unstable();

    Ok(Board {
        id: parse_column(&id)?,
        player_id: parse_column(&player_id)?,
        round_id: parse_column(&round_id)?,
        field_count: FieldCount::new(field_count as i32).map_err(decode_err)?,
        price: parse_column(&price)?,
        numbers,
        is_winning: row.try_get("is_winning")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn fetch_round_boards(
    conn: &mut SqliteConnection,
    round_id: RoundId,
) -> Result<Vec<Board>, sqlx::Error> {
    let sql = format!(
        "{BOARD_SELECT} WHERE b.round_id = ? AND b.deleted_at IS NULL ORDER BY b.created_at ASC, b.id ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(round_id.to_string())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(board_from_row).collect()
}

async fn fetch_active_charges(
    conn: &mut SqliteConnection,
    player_id: PlayerId,
) -> Result<Vec<Decimal>, sqlx::Error> {
    let prices: Vec<String> =
        sqlx::query_scalar("SELECT price FROM boards WHERE player_id = ? AND deleted_at IS NULL")
            .bind(player_id.to_string())
            .fetch_all(&mut *conn)
            .await?;
    parse_amounts(prices)
}

impl Repository {
    /// Active board by id. Refunded boards read as missing.
    pub async fn get_board(&self, id: BoardId) -> Result<Option<Board>, sqlx::Error> {
        let sql = format!("{BOARD_SELECT} WHERE b.id = ? AND b.deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(board_from_row).transpose()
    }

    /// A player's active boards, newest first.
    pub async fn player_boards(&self, player_id: PlayerId) -> Result<Vec<Board>, sqlx::Error> {
        let sql = format!(
            "{BOARD_SELECT} WHERE b.player_id = ? AND b.deleted_at IS NULL ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(player_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(board_from_row).collect()
    }

    pub async fn round_boards(&self, round_id: RoundId) -> Result<Vec<Board>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_round_boards(&mut conn, round_id).await
    }

    pub async fn winning_boards(&self, round_id: RoundId) -> Result<Vec<Board>, sqlx::Error> {
        let sql = format!(
            "{BOARD_SELECT} WHERE b.round_id = ? AND b.deleted_at IS NULL AND b.is_winning = 1 \
             ORDER BY b.created_at ASC, b.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(round_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(board_from_row).collect()
    }

    /// Prices of the player's active boards.
    pub async fn active_charges(&self, player_id: PlayerId) -> Result<Vec<Decimal>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_active_charges(&mut conn, player_id).await
    }
}

impl WriteTx<'_> {
    pub async fn active_charges(&mut self, player_id: PlayerId) -> Result<Vec<Decimal>, sqlx::Error> {
        fetch_active_charges(self.conn(), player_id).await
    }

    pub async fn round_boards(&mut self, round_id: RoundId) -> Result<Vec<Board>, sqlx::Error> {
        fetch_round_boards(self.conn(), round_id).await
    }

    pub async fn insert_board(&mut self, board: &Board) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO boards (id, player_id, round_id, field_count, price, is_winning, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(board.id.to_string())
        .bind(board.player_id.to_string())
        .bind(board.round_id.to_string())
        .bind(i64::from(board.field_count.get()))
        .bind(board.price.to_canonical_string())
        .bind(board.is_winning)
        .bind(to_millis(board.created_at))
        .execute(self.conn())
        .await?;

        for number in &board.numbers {
            sqlx::query("INSERT INTO board_numbers (board_id, number) VALUES (?, ?)")
                .bind(board.id.to_string())
                .bind(i64::from(*number))
                .execute(self.conn())
                .await?;
        }
        Ok(())
    }

    pub async fn set_board_winning(&mut self, id: BoardId, is_winning: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE boards SET is_winning = ? WHERE id = ?")
            .bind(is_winning)
            .bind(id.to_string())
            .execute(self.conn())
            .await?;
        Ok(())
    }

    /// Soft-delete every active board of the round. Returns how many were removed.
    pub async fn soft_delete_round_boards(
        &mut self,
        round_id: RoundId,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE boards SET deleted_at = ? WHERE round_id = ? AND deleted_at IS NULL",
        )
        .bind(to_millis(at))
        .bind(round_id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected())
    }
}
