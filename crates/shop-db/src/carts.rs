//! # Carts
//!
//! Carts are keyed by a client-supplied code and created on first add.

use crate::catalog::{product_from_row, require_product, PRODUCT_COLS};
use crate::error::{DbError, DbResult};
use crate::{from_timestamp, now, ShopDatabase};
use rusqlite::{params, Connection, OptionalExtension};
use shop_core::{validate_cart_code, validate_quantity, Cart, CartItem, Currency};
use tracing::debug;

fn items_for_cart(conn: &Connection, cart_id: i64, currency: Currency) -> DbResult<Vec<CartItem>> {
    let sql = format!(
        "SELECT ci.id, ci.quantity, {} FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.cart_id = ?1
         ORDER BY ci.id",
        PRODUCT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![cart_id], |row| {
        Ok(CartItem {
            id: row.get(0)?,
            quantity: row.get(1)?,
            product: product_from_row(row, 2, currency)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Cart with its items, or `None` when no cart has this code
pub(crate) fn load_cart(
    conn: &Connection,
    cart_code: &str,
    currency: Currency,
) -> DbResult<Option<Cart>> {
    let header = conn
        .query_row(
            "SELECT id, cart_code, created_at, updated_at FROM carts WHERE cart_code = ?1",
            params![cart_code],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, cart_code, created_at, updated_at)) = header else {
        return Ok(None);
    };

    Ok(Some(Cart {
        id,
        cart_code,
        items: items_for_cart(conn, id, currency)?,
        created_at: from_timestamp(created_at),
        updated_at: from_timestamp(updated_at),
    }))
}

fn load_item(conn: &Connection, item_id: i64, currency: Currency) -> DbResult<CartItem> {
    let sql = format!(
        "SELECT ci.id, ci.quantity, {} FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.id = ?1",
        PRODUCT_COLS
    );
    conn.query_row(&sql, params![item_id], |row| {
        Ok(CartItem {
            id: row.get(0)?,
            quantity: row.get(1)?,
            product: product_from_row(row, 2, currency)?,
        })
    })
    .optional()?
    .ok_or_else(|| DbError::not_found("cart item", item_id))
}

pub struct CartRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> CartRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    /// Add a product to the cart with this code, creating the cart if
    /// needed. Adding a product already in the cart resets its quantity to 1.
    pub fn add_item(&self, cart_code: &str, product_id: i64) -> DbResult<Cart> {
        let cart_code = cart_code.trim();
        validate_cart_code(cart_code).map_err(|e| DbError::Invalid(e.to_string()))?;

        let currency = self.db.currency();
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        require_product(&tx, product_id, currency)?;

        let ts = now();
        tx.execute(
            "INSERT INTO carts (cart_code, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(cart_code) DO UPDATE SET updated_at = excluded.updated_at",
            params![cart_code, ts],
        )?;
        let cart_id: i64 = tx.query_row(
            "SELECT id FROM carts WHERE cart_code = ?1",
            params![cart_code],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?1, ?2, 1)
             ON CONFLICT(cart_id, product_id) DO UPDATE SET quantity = 1",
            params![cart_id, product_id],
        )?;

        let cart = load_cart(&tx, cart_code, currency)?
            .ok_or_else(|| DbError::not_found("cart", cart_code))?;
        tx.commit()?;

        debug!("Added product {} to cart {}", product_id, cart_code);
        Ok(cart)
    }

    pub fn find(&self, cart_code: &str) -> DbResult<Option<Cart>> {
        let conn = self.db.conn()?;
        load_cart(&conn, cart_code, self.db.currency())
    }

    pub fn get(&self, cart_code: &str) -> DbResult<Cart> {
        self.find(cart_code)?
            .ok_or_else(|| DbError::not_found("cart", cart_code))
    }

    /// Number of units in the cart
    pub fn total_quantity(&self, cart_code: &str) -> DbResult<u32> {
        let conn = self.db.conn()?;
        let cart_id: i64 = conn
            .query_row(
                "SELECT id FROM carts WHERE cart_code = ?1",
                params![cart_code],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DbError::not_found("cart", cart_code))?;

        Ok(conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE cart_id = ?1",
            params![cart_id],
            |row| row.get(0),
        )?)
    }

    /// Set a line's quantity, which must lie in `1..=MAX_ITEM_QUANTITY`
    pub fn update_quantity(&self, item_id: i64, quantity: u32) -> DbResult<CartItem> {
        validate_quantity(quantity).map_err(|e| DbError::Invalid(e.to_string()))?;

        let conn = self.db.conn()?;
        let updated = conn.execute(
            "UPDATE cart_items SET quantity = ?1 WHERE id = ?2",
            params![quantity, item_id],
        )?;
        if updated == 0 {
            return Err(DbError::not_found("cart item", item_id));
        }

        conn.execute(
            "UPDATE carts SET updated_at = ?1
             WHERE id = (SELECT cart_id FROM cart_items WHERE id = ?2)",
            params![now(), item_id],
        )?;

        load_item(&conn, item_id, self.db.currency())
    }

    pub fn remove_item(&self, item_id: i64) -> DbResult<()> {
        let conn = self.db.conn()?;
        let deleted = conn.execute("DELETE FROM cart_items WHERE id = ?1", params![item_id])?;
        if deleted == 0 {
            return Err(DbError::not_found("cart item", item_id));
        }
        Ok(())
    }
}
