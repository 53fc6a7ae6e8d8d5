//! # Users
//!
//! Users exist only as owners of reviews and wishlist entries.

use crate::error::{DbError, DbResult};
use crate::{now, ShopDatabase};
use rusqlite::{params, Connection, OptionalExtension, Row};
use shop_core::User;

pub(crate) const USER_COLS: &str = "u.id, u.email, u.first_name, u.last_name, u.profile_picture_url";

/// Map the five [`USER_COLS`] starting at `offset`
pub(crate) fn user_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(offset)?,
        email: row.get(offset + 1)?,
        first_name: row.get(offset + 2)?,
        last_name: row.get(offset + 3)?,
        profile_picture_url: row.get(offset + 4)?,
    })
}

fn normalize_email(email: &str) -> DbResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DbError::Invalid("a valid email is required".to_string()));
    }
    Ok(email)
}

fn find_by_email(conn: &Connection, email: &str) -> DbResult<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.email = ?1", USER_COLS);
    Ok(conn
        .query_row(&sql, params![email], |row| user_from_row(row, 0))
        .optional()?)
}

pub(crate) fn get_or_create(conn: &Connection, email: &str) -> DbResult<User> {
    let email = normalize_email(email)?;
    conn.execute(
        "INSERT INTO users (email, created_at) VALUES (?1, ?2) ON CONFLICT(email) DO NOTHING",
        params![email, now()],
    )?;
    find_by_email(conn, &email)?.ok_or_else(|| DbError::not_found("user", email))
}

pub struct UserRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> UserRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    pub fn by_email(&self, email: &str) -> DbResult<Option<User>> {
        let email = normalize_email(email)?;
        let conn = self.db.conn()?;
        find_by_email(&conn, &email)
    }
}
