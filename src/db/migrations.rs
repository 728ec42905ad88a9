//! Database bootstrap: file creation, pragmas and the embedded schema.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info, warn};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Pragmas applied to every pooled connection, in order.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON",
    "PRAGMA busy_timeout = 5000",
    "PRAGMA synchronous = NORMAL",
];

/// Open (creating if needed) the SQLite database and bring its schema up to date.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %err, "Could not create database directory");
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_connection(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    apply_schema(&pool).await?;

    info!(path = %db_path, "Database ready");
    Ok(pool)
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = SCHEMA_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut applied = 0usize;
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
        applied += 1;
    }

    info!(statements = applied, "Schema applied");
    Ok(())
}

async fn configure_connection(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in CONNECTION_PRAGMAS {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }

    // journal_mode reports the mode actually in effect.
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    debug!(journal_mode = %journal_mode, "SQLite connection configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fresh_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested")
            .join("lottery.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        assert!(Path::new(&db_path).exists());
        (pool, temp_dir)
    }

    #[tokio::test]
    async fn test_unusable_directory_fails_without_panicking() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let db_path = blocker.join("lottery.db").to_string_lossy().to_string();

        assert!(init_db(&db_path).await.is_err());
    }

    #[tokio::test]
    async fn test_schema_creates_all_tables() {
        let (pool, _temp) = fresh_pool().await;

        for table in ["players", "rounds", "boards", "board_numbers", "deposits"] {
            let result: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("query failed");
            assert_eq!(result.0, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let (pool, _temp) = fresh_pool().await;
        apply_schema(&pool).await.expect("second schema run failed");
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let (pool, _temp) = fresh_pool().await;

        let result: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);

        let orphan = sqlx::query(
            "INSERT INTO deposits (id, player_id, amount, external_ref, created_at) VALUES ('d', 'nobody', '1', 'x', 0)",
        )
        .execute(&pool)
        .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn test_board_numbers_reject_out_of_range() {
        let (pool, _temp) = fresh_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&mut *conn)
            .await
            .unwrap();

        let in_range = sqlx::query("INSERT INTO board_numbers (board_id, number) VALUES ('b', 16)")
            .execute(&mut *conn)
            .await;
        assert!(in_range.is_ok());

        let result = sqlx::query("INSERT INTO board_numbers (board_id, number) VALUES ('b', 17)")
            .execute(&mut *conn)
            .await;
        assert!(result.is_err());
    }
}
