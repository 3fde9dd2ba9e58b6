pub mod models;
pub mod schema;
pub mod store;

use std::fs::create_dir_all;
use std::path::Path;

use anyhow::{Context, Error as AnyhowError, Result, anyhow};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use parking_lot::Mutex;
use tracing::debug;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionSetup;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionSetup {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pooled handle to the SQLite store. Reads go straight to the pool; writes
/// are serialized through `write_lock` so there is at most one writer per
/// store at a time.
#[derive(Debug)]
pub struct DatabaseHandle {
    pool: SqlitePool,
    pub write_lock: Mutex<()>,
}

/// The persistence collaborator's handle; all corpus/content operations are
/// implemented on it in `store.rs`.
pub type StoreHandle = DatabaseHandle;

impl DatabaseHandle {
    pub fn new(database_url: &str) -> Result<Self> {
        debug!("DatabaseHandle::new() {}", database_url);
        let manager = ConnectionManager::new(database_url);
        let pool = Pool::builder()
            .max_size(5)
            .connection_customizer(Box::new(ConnectionSetup))
            .build(manager)
            .with_context(|| format!("Failed to create pool for: {}", database_url))?;

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// Open (creating if needed) the store at `store_path` and bring the
    /// schema up to date.
    pub fn open(store_path: &Path) -> Result<Self> {
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)
                    .with_context(|| format!("Cannot create store directory {:?}", parent))?;
            }
        }

        // Diesel's SQLite backend takes a plain file path as its URL.
        let database_url = store_path.to_string_lossy().to_string();
        let handle = Self::new(&database_url)?;
        handle.run_migrations()?;
        handle.seed()?;
        Ok(handle)
    }

    pub fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(AnyhowError::from)
    }

    fn run_migrations(&self) -> Result<()> {
        let _lock = self.write_lock.lock();
        let mut conn = self.get_conn()?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
        if !versions.is_empty() {
            debug!("applied {} migrations", versions.len());
        }
        Ok(())
    }

    /// Performs a write operation on the store, guarded by the write lock.
    pub fn do_write<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, diesel::result::Error>,
    {
        let _lock = self.write_lock.lock();
        let mut db_conn = self.pool.get()
            .context("Failed to get connection from pool for write")?;
        operation(&mut db_conn).map_err(AnyhowError::from)
    }

    /// Performs a read operation on the store.
    pub fn do_read<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, diesel::result::Error>,
    {
        let mut db_conn = self.pool.get()
            .context("Failed to get connection from pool for read")?;
        operation(&mut db_conn).map_err(AnyhowError::from)
    }
}
