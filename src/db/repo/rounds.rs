use super::{parse_column, Repository, WriteTx};
use crate::domain::primitives::{from_millis, to_millis};
use crate::domain::{Round, RoundId, RoundStatus, RoundSummary, WinningNumbers};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const ROUND_COLUMNS: &str = "r.id, r.week_start, r.draw_deadline, r.status, \
     r.winning_n1, r.winning_n2, r.winning_n3, r.drawn_at, r.created_at";

fn round_from_row(row: &SqliteRow) -> Result<Round, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let week_start: String = row.try_get("week_start")?;
    let status: String = row.try_get("status")?;

    let n1: Option<i64> = row.try_get("winning_n1")?;
    let n2: Option<i64> = row.try_get("winning_n2")?;
    let n3: Option<i64> = row.try_get("winning_n3")?;
    let drawn_at: Option<i64> = row.try_get("drawn_at")?;
    let winning_numbers = match (n1, n2, n3, drawn_at) {
        (Some(n1), Some(n2), Some(n3), Some(drawn_at)) => Some(WinningNumbers {
            numbers: [n1 as u8, n2 as u8, n3 as u8],
            drawn_at: from_millis(drawn_at),
        }),
        _ => None,
    };

    Ok(Round {
        id: parse_column(&id)?,
        week_start: parse_column::<NaiveDate>(&week_start)?,
        draw_deadline: from_millis(row.try_get("draw_deadline")?),
        status: parse_column::<RoundStatus>(&status)?,
        winning_numbers,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn fetch_round(conn: &mut SqliteConnection, id: RoundId) -> Result<Option<Round>, sqlx::Error> {
    let sql = format!("SELECT {ROUND_COLUMNS} FROM rounds r WHERE r.id = ?");
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(round_from_row).transpose()
}

/// Open rounds, most recently created first.
async fn fetch_open_rounds(conn: &mut SqliteConnection) -> Result<Vec<Round>, sqlx::Error> {
    let sql = format!(
        "SELECT {ROUND_COLUMNS} FROM rounds r WHERE r.status = 'open' \
         ORDER BY r.created_at DESC, r.draw_deadline DESC, r.id DESC"
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(round_from_row).collect()
}

impl Repository {
    pub async fn get_round(&self, id: RoundId) -> Result<Option<Round>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_round(&mut conn, id).await
    }

    pub async fn open_rounds(&self) -> Result<Vec<Round>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_rounds(&mut conn).await
    }

    /// Every round with its active and winning board counts, newest week first.
    pub async fn list_round_summaries(&self) -> Result<Vec<RoundSummary>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {ROUND_COLUMNS},
                   (SELECT COUNT(*) FROM boards b
                     WHERE b.round_id = r.id AND b.deleted_at IS NULL) AS board_count,
                   (SELECT COUNT(*) FROM boards b
                     WHERE b.round_id = r.id AND b.deleted_at IS NULL AND b.is_winning = 1)
                     AS winning_board_count
            FROM rounds r
            ORDER BY r.week_start DESC, r.created_at DESC
            "#
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(RoundSummary::new(
                    round_from_row(row)?,
                    row.try_get("board_count")?,
                    row.try_get("winning_board_count")?,
                ))
            })
            .collect()
    }

    pub async fn round_summary(&self, id: RoundId) -> Result<Option<RoundSummary>, sqlx::Error> {
        let Some(round) = self.get_round(id).await? else {
            return Ok(None);
        };
        let (board_count, winning_board_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(is_winning), 0)
            FROM boards
            WHERE round_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(RoundSummary::new(round, board_count, winning_board_count)))
    }
}

impl WriteTx<'_> {
    pub async fn round(&mut self, id: RoundId) -> Result<Option<Round>, sqlx::Error> {
        fetch_round(self.conn(), id).await
    }

    pub async fn open_rounds(&mut self) -> Result<Vec<Round>, sqlx::Error> {
        fetch_open_rounds(self.conn()).await
    }

    pub async fn insert_round(&mut self, round: &Round) -> Result<(), sqlx::Error> {
        let (n1, n2, n3, drawn_at) = match &round.winning_numbers {
            Some(w) => (
                Some(i64::from(w.numbers[0])),
                Some(i64::from(w.numbers[1])),
                Some(i64::from(w.numbers[2])),
                Some(to_millis(w.drawn_at)),
            ),
            None => (None, None, None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO rounds (
                id, week_start, draw_deadline, status,
                winning_n1, winning_n2, winning_n3, drawn_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(round.id.to_string())
        .bind(round.week_start.to_string())
        .bind(to_millis(round.draw_deadline))
        .bind(round.status.as_str())
        .bind(n1)
        .bind(n2)
        .bind(n3)
        .bind(drawn_at)
        .bind(to_millis(round.created_at))
        .execute(self.conn())
        .await?;
        Ok(())
    }

    /// Open → Closed. Returns false if the round was not open.
    pub async fn close_round(&mut self, id: RoundId, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rounds SET status = 'closed', closed_at = ? WHERE id = ? AND status = 'open'",
        )
        .bind(to_millis(at))
        .bind(id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Closed → Settled with the drawn numbers attached. Returns false if the
    /// round was not closed or already carries numbers.
    pub async fn settle_round(
        &mut self,
        id: RoundId,
        winning: &WinningNumbers,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE rounds
            SET status = 'settled', winning_n1 = ?, winning_n2 = ?, winning_n3 = ?, drawn_at = ?
            WHERE id = ? AND status = 'closed' AND winning_n1 IS NULL
            "#,
        )
        .bind(i64::from(winning.numbers[0]))
        .bind(i64::from(winning.numbers[1]))
        .bind(i64::from(winning.numbers[2]))
        .bind(to_millis(winning.drawn_at))
        .bind(id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Closed → Voided. Returns false if the round was not closed.
    pub async fn void_round(&mut self, id: RoundId, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE rounds SET status = 'voided', voided_at = ?
            WHERE id = ? AND status = 'closed' AND winning_n1 IS NULL
            "#,
        )
        .bind(to_millis(at))
        .bind(id.to_string())
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
