use super::{parse_column, Repository, WriteTx};
use crate::domain::primitives::{from_millis, to_millis};
use crate::domain::{Player, PlayerId};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const PLAYER_COLUMNS: &str = "id, full_name, email, phone, is_active, created_at";

fn player_from_row(row: &SqliteRow) -> Result<Player, sqlx::Error> {
    let id: String = row.try_get("id")?;
    Ok(Player {
        id: parse_column(&id)?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get("is_active")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn fetch_player(
    conn: &mut SqliteConnection,
    id: PlayerId,
) -> Result<Option<Player>, sqlx::Error> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?");
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(player_from_row).transpose()
}

impl Repository {
    pub async fn insert_player(&self, player: &Player) -> Result<(), sqlx::Error> {
        let mut tx = self.begin_write().await?;
        sqlx::query(
            r#"
            INSERT INTO players (id, full_name, email, phone, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(player.id.to_string())
        .bind(&player.full_name)
        .bind(&player.email)
        .bind(&player.phone)
        .bind(player.is_active)
        .bind(to_millis(player.created_at))
        .execute(tx.conn())
        .await?;
        tx.commit().await
    }

    pub async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_player(&mut conn, id).await
    }

    /// All players, oldest first.
    pub async fn list_players(&self) -> Result<Vec<Player>, sqlx::Error> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY created_at ASC, id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(player_from_row).collect()
    }

    /// Returns false when the player does not exist.
    pub async fn set_player_active(&self, id: PlayerId, active: bool) -> Result<bool, sqlx::Error> {
        let mut tx = self.begin_write().await?;
        let result = sqlx::query("UPDATE players SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id.to_string())
            .execute(tx.conn())
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl WriteTx<'_> {
    pub async fn player(&mut self, id: PlayerId) -> Result<Option<Player>, sqlx::Error> {
        fetch_player(self.conn(), id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::repo::test_support::setup_repo;
    use crate::domain::{Player, PlayerId};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_player_roundtrip_and_activation() {
        let (repo, _temp) = setup_repo().await;
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let player = Player::register("Jane Doe", "jane@example.com", "+4512345678", false, created)
            .unwrap();
        repo.insert_player(&player).await.unwrap();

        let loaded = repo.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(loaded, player);

        assert!(repo.set_player_active(player.id, true).await.unwrap());
        assert!(repo.get_player(player.id).await.unwrap().unwrap().is_active);

        assert!(!repo.set_player_active(PlayerId::new(), true).await.unwrap());
        assert_eq!(repo.list_players().await.unwrap().len(), 1);
    }
}
