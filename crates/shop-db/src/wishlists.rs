//! # Wishlists

use crate::catalog::require_product;
use crate::error::DbResult;
use crate::users::{self, user_from_row, USER_COLS};
use crate::{from_timestamp, now, ShopDatabase};
use rusqlite::{params, Connection, OptionalExtension, Row};
use shop_core::{WishlistEntry, WishlistToggle};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<WishlistEntry> {
    Ok(WishlistEntry {
        id: row.get(0)?,
        product_id: row.get(1)?,
        created_at: from_timestamp(row.get(2)?),
        updated_at: from_timestamp(row.get(3)?),
        user: user_from_row(row, 4)?,
    })
}

fn toggle_entry(conn: &Connection, user_id: i64, product_id: i64) -> DbResult<WishlistToggle> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM wishlists WHERE user_id = ?1 AND product_id = ?2",
            params![user_id, product_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        conn.execute("DELETE FROM wishlists WHERE id = ?1", params![id])?;
        return Ok(WishlistToggle::Removed);
    }

    conn.execute(
        "INSERT INTO wishlists (user_id, product_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params![user_id, product_id, now()],
    )?;

    let sql = format!(
        "SELECT w.id, w.product_id, w.created_at, w.updated_at, {}
         FROM wishlists w JOIN users u ON u.id = w.user_id
         WHERE w.id = ?1",
        USER_COLS
    );
    let entry = conn.query_row(&sql, params![conn.last_insert_rowid()], entry_from_row)?;
    Ok(WishlistToggle::Added(entry))
}

pub struct WishlistRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> WishlistRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    /// Remove the entry if present, otherwise add it. The user is created
    /// in the same transaction once the product is known to exist.
    pub fn toggle(&self, email: &str, product_id: i64) -> DbResult<WishlistToggle> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        require_product(&tx, product_id, self.db.currency())?;
        let user = users::get_or_create(&tx, email)?;

        let toggled = toggle_entry(&tx, user.id, product_id)?;
        tx.commit()?;
        Ok(toggled)
    }

    pub fn for_user(&self, user_id: i64) -> DbResult<Vec<WishlistEntry>> {
        let conn = self.db.conn()?;
        let sql = format!(
            "SELECT w.id, w.product_id, w.created_at, w.updated_at, {}
             FROM wishlists w JOIN users u ON u.id = w.user_id
             WHERE w.user_id = ?1
             ORDER BY w.id",
            USER_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DbError, NewProduct};

    #[test]
    fn test_toggle_twice_leaves_nothing() {
        let db = ShopDatabase::in_memory().unwrap();
        let product = db
            .catalog()
            .create_product(&NewProduct {
                name: "Mug".to_string(),
                price: 1000,
                ..Default::default()
            })
            .unwrap();
        match db.wishlists().toggle("ada@example.com", product.id).unwrap() {
            WishlistToggle::Added(entry) => {
                assert_eq!(entry.product_id, product.id);
                assert_eq!(entry.user.email, "ada@example.com");
            }
            WishlistToggle::Removed => panic!("expected an added entry"),
        }
        let user = db.users().by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(db.wishlists().for_user(user.id).unwrap().len(), 1);

        assert_eq!(
            db.wishlists().toggle("ada@example.com", product.id).unwrap(),
            WishlistToggle::Removed
        );
        assert!(db.wishlists().for_user(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_missing_product_leaves_no_user() {
        let db = ShopDatabase::in_memory().unwrap();
        assert!(matches!(
            db.wishlists().toggle("ghost@example.com", 42),
            Err(DbError::NotFound { .. })
        ));
        assert!(db.users().by_email("ghost@example.com").unwrap().is_none());
    }
}
