//! # Orders
//!
//! Orders are created once per checkout session, from the cart that the
//! session was opened for, and never mutated afterwards.

use crate::carts::load_cart;
use crate::catalog::find_product;
use crate::error::{DbError, DbResult};
use crate::{from_timestamp, now, ShopDatabase};
use rusqlite::{params, Connection, OptionalExtension};
use shop_core::{
    CartSnapshot, Currency, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, Price,
};
use tracing::{info, warn};

/// Result of converting a cart into an order
#[derive(Debug, Clone, PartialEq)]
pub enum Fulfillment {
    /// Order and items inserted, cart deleted
    Created(Order),
    /// An order for this checkout session already exists
    AlreadyExists,
    /// No cart with the given code
    CartMissing,
}

fn session_exists(conn: &Connection, session_id: &str) -> DbResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE stripe_checkout_id = ?1)",
        params![session_id],
        |row| row.get(0),
    )?)
}

fn load_order(conn: &Connection, session_id: &str) -> DbResult<Option<Order>> {
    let row = conn
        .query_row(
            "SELECT id, stripe_checkout_id, amount, currency, customer_email, status, created_at
             FROM orders WHERE stripe_checkout_id = ?1",
            params![session_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, stripe_checkout_id, amount, currency, customer_email, status, created_at)) = row
    else {
        return Ok(None);
    };

    let currency = Currency::from_code(&currency)
        .ok_or_else(|| DbError::Invalid(format!("unknown order currency: {}", currency)))?;
    let status = OrderStatus::parse(&status)
        .ok_or_else(|| DbError::Invalid(format!("unknown order status: {}", status)))?;

    let mut stmt = conn.prepare(
        "SELECT id, product_id, product_name, quantity, unit_amount
         FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;
    let items = stmt
        .query_map(params![id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                product_id: row.get(1)?,
                product_name: row.get(2)?,
                quantity: row.get(3)?,
                unit_price: Price::from_cents(row.get(4)?, currency),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Order {
        id,
        stripe_checkout_id,
        amount: Price::from_cents(amount, currency),
        customer_email,
        status,
        items,
        created_at: from_timestamp(created_at),
    }))
}

pub struct OrderRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> OrderRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    pub fn exists(&self, session_id: &str) -> DbResult<bool> {
        let conn = self.db.conn()?;
        session_exists(&conn, session_id)
    }

    pub fn find_by_session(&self, session_id: &str) -> DbResult<Option<Order>> {
        let conn = self.db.conn()?;
        load_order(&conn, session_id)
    }

    pub fn by_session(&self, session_id: &str) -> DbResult<Order> {
        self.find_by_session(session_id)?
            .ok_or_else(|| DbError::not_found("order", session_id))
    }

    pub fn count(&self) -> DbResult<i64> {
        let conn = self.db.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?)
    }

    /// Convert the cart into an order in one transaction.
    ///
    /// Items come from `snapshot` when it has entries, otherwise from the
    /// cart as it is now. The cart is deleted on success. A concurrent
    /// insert for the same session is reported as `AlreadyExists`.
    pub fn fulfill(
        &self,
        order: &NewOrder,
        cart_code: &str,
        snapshot: Option<&CartSnapshot>,
    ) -> DbResult<Fulfillment> {
        let catalog_currency = self.db.currency();
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        if session_exists(&tx, &order.stripe_checkout_id)? {
            return Ok(Fulfillment::AlreadyExists);
        }

        let Some(cart) = load_cart(&tx, cart_code, catalog_currency)? else {
            return Ok(Fulfillment::CartMissing);
        };

        let mut items: Vec<(NewOrderItem, String)> = Vec::new();
        match snapshot.filter(|s| !s.is_empty()) {
            Some(snapshot) => {
                for entry in &snapshot.entries {
                    match find_product(&tx, entry.product_id, catalog_currency)? {
                        Some(product) => items.push((
                            NewOrderItem {
                                product_id: entry.product_id,
                                quantity: entry.quantity,
                                unit_amount: entry.unit_amount,
                            },
                            product.name,
                        )),
                        None => warn!(
                            "Product {} in checkout {} no longer exists, skipping line",
                            entry.product_id, order.stripe_checkout_id
                        ),
                    }
                }
            }
            None => {
                for item in &cart.items {
                    items.push((
                        NewOrderItem {
                            product_id: item.product.id,
                            quantity: item.quantity,
                            unit_amount: item.product.price.amount,
                        },
                        item.product.name.clone(),
                    ));
                }
            }
        }

        let inserted = tx.execute(
            "INSERT INTO orders (stripe_checkout_id, amount, currency, customer_email, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.stripe_checkout_id,
                order.amount.amount,
                order.amount.currency.as_str(),
                order.customer_email,
                order.status.as_str(),
                now()
            ],
        );
        match inserted.map_err(DbError::from) {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => return Ok(Fulfillment::AlreadyExists),
            Err(e) => return Err(e),
        }
        let order_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (item, name) in &items {
                stmt.execute(params![order_id, item.product_id, name, item.quantity, item.unit_amount])?;
            }
        }

        tx.execute("DELETE FROM carts WHERE id = ?1", params![cart.id])?;

        let created = load_order(&tx, &order.stripe_checkout_id)?
            .ok_or_else(|| DbError::not_found("order", &order.stripe_checkout_id))?;
        tx.commit()?;

        info!(
            "Order {} created for checkout {}: {} items, amount={}",
            created.id,
            created.stripe_checkout_id,
            created.items.len(),
            created.amount.display()
        );
        Ok(Fulfillment::Created(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewProduct;

    fn setup() -> (ShopDatabase, i64, i64) {
        let db = ShopDatabase::in_memory().unwrap();
        let mug = db
            .catalog()
            .create_product(&NewProduct {
                name: "Mug".to_string(),
                price: 1000,
                ..Default::default()
            })
            .unwrap();
        let sticker = db
            .catalog()
            .create_product(&NewProduct {
                name: "Sticker".to_string(),
                price: 500,
                ..Default::default()
            })
            .unwrap();

        let cart = db.carts().add_item("ABC123", mug.id).unwrap();
        db.carts().update_quantity(cart.items[0].id, 2).unwrap();
        db.carts().add_item("ABC123", sticker.id).unwrap();

        (db, mug.id, sticker.id)
    }

    fn new_order(session_id: &str, amount: i64) -> NewOrder {
        NewOrder {
            stripe_checkout_id: session_id.to_string(),
            amount: Price::from_cents(amount, Currency::USD),
            customer_email: "buyer@example.com".to_string(),
            status: OrderStatus::Paid,
        }
    }

    #[test]
    fn test_fulfill_from_live_cart() {
        let (db, _, _) = setup();

        let outcome = db.orders().fulfill(&new_order("cs_1", 2500), "ABC123", None).unwrap();
        let Fulfillment::Created(order) = outcome else {
            panic!("expected an order, got {:?}", outcome);
        };

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.amount.as_decimal(), 25.0);
        assert_eq!(order.items.len(), 2);
        assert!(order.is_reconciled());
        assert!(db.carts().find("ABC123").unwrap().is_none());

        let stored = db.orders().by_session("cs_1").unwrap();
        assert_eq!(stored, order);
    }

    #[test]
    fn test_fulfill_twice_is_idempotent() {
        let (db, mug, _) = setup();

        db.orders().fulfill(&new_order("cs_1", 2500), "ABC123", None).unwrap();

        // A new cart under the same code must not be consumed by a replay
        db.carts().add_item("ABC123", mug).unwrap();
        let outcome = db.orders().fulfill(&new_order("cs_1", 2500), "ABC123", None).unwrap();

        assert_eq!(outcome, Fulfillment::AlreadyExists);
        assert_eq!(db.orders().count().unwrap(), 1);
        assert!(db.carts().find("ABC123").unwrap().is_some());
    }

    #[test]
    fn test_fulfill_missing_cart() {
        let (db, _, _) = setup();
        let outcome = db.orders().fulfill(&new_order("cs_1", 2500), "NOPE", None).unwrap();
        assert_eq!(outcome, Fulfillment::CartMissing);
        assert_eq!(db.orders().count().unwrap(), 0);
    }

    #[test]
    fn test_fulfill_prefers_snapshot() {
        let (db, mug, sticker) = setup();

        // Checkout saw 2 mugs and 1 sticker at the old prices
        let snapshot = CartSnapshot::decode(&format!("{}:2:1000;{}:1:500", mug, sticker)).unwrap();

        // Cart drifts afterwards
        let cart = db.carts().get("ABC123").unwrap();
        db.carts().update_quantity(cart.items[0].id, 7).unwrap();
        db.carts().remove_item(cart.items[1].id).unwrap();

        let outcome = db
            .orders()
            .fulfill(&new_order("cs_1", 2500), "ABC123", Some(&snapshot))
            .unwrap();
        let Fulfillment::Created(order) = outcome else {
            panic!("expected an order");
        };

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[1].product_name, "Sticker");
        assert!(order.is_reconciled());
    }

    #[test]
    fn test_missing_order() {
        let (db, _, _) = setup();
        assert!(!db.orders().exists("cs_nope").unwrap());
        assert!(matches!(
            db.orders().by_session("cs_nope"),
            Err(DbError::NotFound { .. })
        ));
    }
}
