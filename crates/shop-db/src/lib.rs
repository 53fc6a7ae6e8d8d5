//! # shop-db
//!
//! SQLite storage for storefront-rs, behind an r2d2 connection pool.
//!
//! Each repository is a short-lived view over [`ShopDatabase`]; every call
//! checks out one pooled connection and returns it before returning.
//!
//! ```rust,ignore
//! use shop_db::ShopDatabase;
//!
//! let db = ShopDatabase::open("storefront.db")?;
//! let cart = db.carts().add_item("ABC123", product_id)?;
//! let order = db.orders().by_session("cs_test_123")?;
//! ```

pub mod carts;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod reviews;
pub mod schema;
pub mod users;
pub mod wishlists;

pub use carts::CartRepository;
pub use catalog::{CatalogRepository, NewProduct};
pub use error::{DbError, DbResult};
pub use orders::{Fulfillment, OrderRepository};
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;
use shop_core::Currency;
use tracing::info;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

const DEFAULT_POOL_SIZE: u32 = 8;

/// Handle to the storefront database
#[derive(Clone)]
pub struct ShopDatabase {
    pool: DbPool,
    currency: Currency,
}

impl ShopDatabase {
    /// Open (or create) a database file and apply the schema
    pub fn open(path: &str) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = r2d2::Pool::builder()
            .max_size(DEFAULT_POOL_SIZE)
            .build(manager)?;

        let db = Self::from_pool(pool)?;
        info!("Opened database at {}", path);
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every pooled connection to `:memory:` is a separate database, so the
    /// pool is pinned to one connection that never expires.
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        Self::from_pool(pool)
    }

    fn from_pool(pool: DbPool) -> DbResult<Self> {
        let conn = pool.get()?;
        schema::init(&conn)?;
        drop(conn);

        Ok(Self {
            pool,
            currency: Currency::default(),
        })
    }

    /// Currency that catalog prices are denominated in
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn conn(&self) -> DbResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(self)
    }

    pub fn carts(&self) -> CartRepository<'_> {
        CartRepository::new(self)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn reviews(&self) -> ReviewRepository<'_> {
        ReviewRepository::new(self)
    }

    pub fn wishlists(&self) -> WishlistRepository<'_> {
        WishlistRepository::new(self)
    }

    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(self)
    }

    /// Cheap liveness probe
    pub fn ping(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

pub(crate) fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_schema() {
        let db = ShopDatabase::in_memory().unwrap();
        db.ping().unwrap();

        let conn = db.conn().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_schema_init_idempotent() {
        let db = ShopDatabase::in_memory().unwrap();
        let conn = db.conn().unwrap();
        schema::init(&conn).unwrap();
    }
}
