//! SQLite persistence.
//!
//! Query functions take a `&mut SqliteConnection` so the services can run
//! several of them inside one transaction.
//!
//! Write transactions are serialized through [`Database::begin`]: a deferred
//! SQLite transaction that reads before writing fails with `SQLITE_BUSY`
//! when another writer commits first, so writers queue on a lock instead.

pub mod attachments;
pub mod events;
pub mod guests;
pub mod profiles;
pub mod registrations;
pub mod tickets;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    write_lock: Arc<Mutex<()>>,
}

/// A transaction holding the process-wide write lock until it commits or
/// is dropped (which rolls it back).
pub struct WriteTransaction {
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl WriteTransaction {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.tx
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

impl Database {
    /// Open (or create) the database at `url` and apply migrations.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!(url = %url, "Database opened");

        let db = Self::from_pool(pool);
        db.run_migrations().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // The database lives only as long as its one connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self::from_pool(pool);
        db.run_migrations().await?;
        Ok(db)
    }

    fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        info!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Starts a write transaction. Reads that are not followed by writes
    /// should use [`Database::pool`] instead.
    pub async fn begin(&self) -> Result<WriteTransaction, sqlx::Error> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTransaction { tx, _guard: guard })
    }
}
