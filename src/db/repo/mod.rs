//! Repository layer for database operations.
//!
//! Reads go through [`Repository`] against the pool. Every mutation runs in a
//! [`WriteTx`], which pairs a SQLite transaction with the process-wide writer
//! lock so check-then-write sequences (balance checks, status transitions)
//! cannot interleave. Methods are organized across submodules by entity:
//! - `players.rs` - player accounts
//! - `rounds.rs` - rounds and their status transitions
//! - `boards.rs` - boards and their numbers
//! - `deposits.rs` - deposits and ledger inputs

mod boards;
mod deposits;
mod players;
mod rounds;

use crate::domain::Decimal;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
    writer: Mutex<()>,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            writer: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a serialized write transaction.
    ///
    /// Waits for any other writer in this process to finish first.
    pub async fn begin_write(&self) -> Result<WriteTx<'_>, sqlx::Error> {
        let guard = self.writer.lock().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _writer: guard })
    }
}

/// A write transaction holding the writer lock. Dropping it without
/// [`WriteTx::commit`] rolls back.
pub struct WriteTx<'a> {
    // Declared before the guard so the rollback happens while the lock is still held.
    tx: Transaction<'static, Sqlite>,
    _writer: MutexGuard<'a, ()>,
}

impl WriteTx<'_> {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn parse_column<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(decode_err)
}

fn parse_amounts(raw: Vec<String>) -> Result<Vec<Decimal>, sqlx::Error> {
    raw.iter().map(|s| parse_column::<Decimal>(s)).collect()
}
