//! # Reviews
//!
//! One review per (user, product). Every mutation recomputes the product's
//! row in `product_ratings` inside the same transaction.

use crate::catalog::require_product;
use crate::error::{DbError, DbResult};
use crate::users::{self, user_from_row, USER_COLS};
use crate::{from_timestamp, now, ShopDatabase};
use rusqlite::{params, Connection, OptionalExtension, Row};
use shop_core::{validate_rating, ProductRating, Review};
use tracing::debug;

fn review_sql(filter: &str) -> String {
    format!(
        "SELECT r.id, r.product_id, r.rating, r.review, r.created_at, r.updated_at, {}
         FROM reviews r JOIN users u ON u.id = r.user_id
         WHERE {}",
        USER_COLS, filter
    )
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        product_id: row.get(1)?,
        rating: row.get(2)?,
        review: row.get(3)?,
        created_at: from_timestamp(row.get(4)?),
        updated_at: from_timestamp(row.get(5)?),
        user: user_from_row(row, 6)?,
    })
}

fn load_review(conn: &Connection, review_id: i64) -> DbResult<Review> {
    conn.query_row(&review_sql("r.id = ?1"), params![review_id], review_from_row)
        .optional()?
        .ok_or_else(|| DbError::not_found("review", review_id))
}

fn check_rating(rating: u8) -> DbResult<()> {
    validate_rating(rating).map_err(|e| DbError::Invalid(e.to_string()))
}

/// Upsert the product's average and count from its current reviews
pub(crate) fn recompute_rating(conn: &Connection, product_id: i64) -> DbResult<ProductRating> {
    let rating = conn.query_row(
        "SELECT COALESCE(AVG(rating), 0.0), COUNT(*) FROM reviews WHERE product_id = ?1",
        params![product_id],
        |row| {
            Ok(ProductRating {
                average_rating: row.get(0)?,
                total_reviews: row.get(1)?,
            })
        },
    )?;

    conn.execute(
        "INSERT INTO product_ratings (product_id, average_rating, total_reviews)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(product_id) DO UPDATE SET
             average_rating = excluded.average_rating,
             total_reviews = excluded.total_reviews",
        params![product_id, rating.average_rating, rating.total_reviews],
    )?;

    debug!(
        "Product {} rating: {:.2} over {} reviews",
        product_id, rating.average_rating, rating.total_reviews
    );
    Ok(rating)
}

fn insert_review(
    conn: &Connection,
    product_id: i64,
    user_id: i64,
    rating: u8,
    text: &str,
) -> DbResult<Review> {
    let ts = now();
    conn.execute(
        "INSERT INTO reviews (product_id, user_id, rating, review, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![product_id, user_id, rating, text, ts],
    )
    .map_err(DbError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            DbError::Conflict("You already wrote a review for this product!".to_string())
        } else {
            e
        }
    })?;

    let review = load_review(conn, conn.last_insert_rowid())?;
    recompute_rating(conn, product_id)?;
    Ok(review)
}

pub struct ReviewRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> ReviewRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    /// Review as the user with this email, creating the user in the same
    /// transaction. Nothing is written when the product does not exist.
    pub fn create(
        &self,
        product_id: i64,
        email: &str,
        rating: u8,
        text: &str,
    ) -> DbResult<Review> {
        check_rating(rating)?;

        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        require_product(&tx, product_id, self.db.currency())?;
        let user = users::get_or_create(&tx, email)?;

        let review = insert_review(&tx, product_id, user.id, rating, text)?;
        tx.commit()?;
        Ok(review)
    }

    pub fn update(&self, review_id: i64, rating: u8, text: &str) -> DbResult<Review> {
        check_rating(rating)?;

        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE reviews SET rating = ?1, review = ?2, updated_at = ?3 WHERE id = ?4",
            params![rating, text, now(), review_id],
        )?;
        if updated == 0 {
            return Err(DbError::not_found("review", review_id));
        }

        let review = load_review(&tx, review_id)?;
        recompute_rating(&tx, review.product_id)?;
        tx.commit()?;

        Ok(review)
    }

    pub fn delete(&self, review_id: i64) -> DbResult<()> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        let product_id: i64 = tx
            .query_row(
                "SELECT product_id FROM reviews WHERE id = ?1",
                params![review_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DbError::not_found("review", review_id))?;

        tx.execute("DELETE FROM reviews WHERE id = ?1", params![review_id])?;
        recompute_rating(&tx, product_id)?;
        tx.commit()?;

        Ok(())
    }

    pub fn get(&self, review_id: i64) -> DbResult<Review> {
        let conn = self.db.conn()?;
        load_review(&conn, review_id)
    }

    /// Newest first
    pub fn for_product(&self, product_id: i64) -> DbResult<Vec<Review>> {
        let conn = self.db.conn()?;
        let sql = format!("{} ORDER BY r.created_at DESC, r.id DESC", review_sql("r.product_id = ?1"));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product_id], review_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
