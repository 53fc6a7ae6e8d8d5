//! # Catalog
//!
//! Categories, products and their aggregated ratings.

use crate::error::{DbError, DbResult};
use crate::ShopDatabase;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shop_core::{slugify, CatalogSeed, Category, Currency, Price, Product, ProductRating};
use std::collections::HashMap;
use tracing::{debug, info};

pub(crate) const PRODUCT_COLS: &str =
    "p.id, p.name, p.slug, p.description, p.price, p.image, p.featured, p.category_id";

const CATEGORY_COLS: &str = "id, name, slug, image";

/// Map the eight [`PRODUCT_COLS`] starting at `offset`
pub(crate) fn product_from_row(
    row: &Row<'_>,
    offset: usize,
    currency: Currency,
) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        slug: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        price: Price::from_cents(row.get(offset + 4)?, currency),
        image: row.get(offset + 5)?,
        featured: row.get(offset + 6)?,
        category_id: row.get(offset + 7)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        image: row.get(3)?,
    })
}

/// Slug derived from `name`, suffixed `-1`, `-2`, ... until unused in `table`
fn unique_slug(conn: &Connection, table: &'static str, name: &str) -> DbResult<String> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = table.trim_end_matches('s').to_string();
    }

    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE slug = ?1)", table);
    let mut stmt = conn.prepare(&sql)?;

    let mut candidate = base.clone();
    let mut counter = 1;
    while stmt.query_row(params![candidate], |row| row.get::<_, bool>(0))? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }

    Ok(candidate)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Fields needed to insert a product; `price` is in the smallest currency unit
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image: Option<String>,
    pub featured: bool,
    pub category_id: Option<i64>,
}

fn insert_category(conn: &Connection, name: &str, image: Option<&str>) -> DbResult<Category> {
    let slug = unique_slug(conn, "categories", name)?;
    conn.execute(
        "INSERT INTO categories (name, slug, image) VALUES (?1, ?2, ?3)",
        params![name, slug, image],
    )?;

    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        slug,
        image: image.map(str::to_string),
    })
}

fn insert_product(conn: &Connection, input: &NewProduct, currency: Currency) -> DbResult<Product> {
    if input.name.trim().is_empty() {
        return Err(DbError::Invalid("product name is required".to_string()));
    }
    if input.price < 0 {
        return Err(DbError::Invalid("product price must not be negative".to_string()));
    }

    let slug = unique_slug(conn, "products", &input.name)?;
    conn.execute(
        "INSERT INTO products (name, slug, description, price, image, featured, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.name,
            slug,
            input.description,
            input.price,
            input.image,
            input.featured,
            input.category_id
        ],
    )?;

    Ok(Product {
        id: conn.last_insert_rowid(),
        name: input.name.clone(),
        slug,
        description: input.description.clone(),
        price: Price::from_cents(input.price, currency),
        image: input.image.clone(),
        featured: input.featured,
        category_id: input.category_id,
    })
}

pub(crate) fn find_product(
    conn: &Connection,
    product_id: i64,
    currency: Currency,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products p WHERE p.id = ?1", PRODUCT_COLS);
    Ok(conn
        .query_row(&sql, params![product_id], |row| product_from_row(row, 0, currency))
        .optional()?)
}

pub(crate) fn require_product(
    conn: &Connection,
    product_id: i64,
    currency: Currency,
) -> DbResult<Product> {
    find_product(conn, product_id, currency)?
        .ok_or_else(|| DbError::not_found("product", product_id))
}

fn query_products<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    currency: Currency,
) -> DbResult<Vec<Product>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| product_from_row(row, 0, currency))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn rating_for(conn: &Connection, product_id: i64) -> DbResult<ProductRating> {
    let rating = conn
        .query_row(
            "SELECT average_rating, total_reviews FROM product_ratings WHERE product_id = ?1",
            params![product_id],
            |row| {
                Ok(ProductRating {
                    average_rating: row.get(0)?,
                    total_reviews: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(rating.unwrap_or_default())
}

pub struct CatalogRepository<'a> {
    db: &'a ShopDatabase,
}

impl<'a> CatalogRepository<'a> {
    pub(crate) fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    pub fn create_category(&self, name: &str, image: Option<&str>) -> DbResult<Category> {
        if name.trim().is_empty() {
            return Err(DbError::Invalid("category name is required".to_string()));
        }
        let conn = self.db.conn()?;
        insert_category(&conn, name, image)
    }

    pub fn list_categories(&self) -> DbResult<Vec<Category>> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// A category and the products filed under it
    pub fn category_by_slug(&self, slug: &str) -> DbResult<(Category, Vec<Product>)> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {} FROM categories WHERE slug = ?1", CATEGORY_COLS);
        let category = conn
            .query_row(&sql, params![slug], category_from_row)
            .optional()?
            .ok_or_else(|| DbError::not_found("category", slug))?;

        let sql = format!(
            "SELECT {} FROM products p WHERE p.category_id = ?1 ORDER BY p.name",
            PRODUCT_COLS
        );
        let products = query_products(&conn, &sql, params![category.id], self.db.currency())?;

        Ok((category, products))
    }

    pub fn create_product(&self, input: &NewProduct) -> DbResult<Product> {
        let conn = self.db.conn()?;
        let product = insert_product(&conn, input, self.db.currency())?;
        debug!("Created product {} ({})", product.slug, product.id);
        Ok(product)
    }

    pub fn product(&self, product_id: i64) -> DbResult<Product> {
        let conn = self.db.conn()?;
        require_product(&conn, product_id, self.db.currency())
    }

    /// Product by slug, with its rating
    pub fn product_by_slug(&self, slug: &str) -> DbResult<(Product, ProductRating)> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {} FROM products p WHERE p.slug = ?1", PRODUCT_COLS);
        let product = conn
            .query_row(&sql, params![slug], |row| {
                product_from_row(row, 0, self.db.currency())
            })
            .optional()?
            .ok_or_else(|| DbError::not_found("product", slug))?;

        let rating = rating_for(&conn, product.id)?;
        Ok((product, rating))
    }

    pub fn featured_products(&self) -> DbResult<Vec<Product>> {
        let conn = self.db.conn()?;
        let sql = format!(
            "SELECT {} FROM products p WHERE p.featured = 1 ORDER BY p.id",
            PRODUCT_COLS
        );
        query_products(&conn, &sql, [], self.db.currency())
    }

    /// Up to `limit` other products from the same category
    pub fn similar_products(&self, product: &Product, limit: u32) -> DbResult<Vec<Product>> {
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };

        let conn = self.db.conn()?;
        let sql = format!(
            "SELECT {} FROM products p
             WHERE p.category_id = ?1 AND p.id != ?2
             ORDER BY p.id LIMIT ?3",
            PRODUCT_COLS
        );
        query_products(
            &conn,
            &sql,
            params![category_id, product.id, limit],
            self.db.currency(),
        )
    }

    /// Case-insensitive substring match on product name, description or
    /// category name
    pub fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DbError::Invalid("No query provided".to_string()));
        }

        let conn = self.db.conn()?;
        let sql = format!(
            "SELECT {} FROM products p
             LEFT JOIN categories c ON c.id = p.category_id
             WHERE p.name LIKE ?1 ESCAPE '\\'
                OR p.description LIKE ?1 ESCAPE '\\'
                OR c.name LIKE ?1 ESCAPE '\\'
             ORDER BY p.name",
            PRODUCT_COLS
        );
        query_products(&conn, &sql, params![like_pattern(query)], self.db.currency())
    }

    pub fn rating(&self, product_id: i64) -> DbResult<ProductRating> {
        let conn = self.db.conn()?;
        rating_for(&conn, product_id)
    }

    pub fn count_products(&self) -> DbResult<i64> {
        let conn = self.db.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?)
    }

    /// Insert a seed catalog in one transaction. Returns the number of
    /// products created.
    pub fn seed(&self, seed: &CatalogSeed) -> DbResult<usize> {
        let currency = self.db.currency();
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        let mut category_ids = HashMap::new();
        for category in &seed.categories {
            let created = insert_category(&tx, &category.name, category.image.as_deref())?;
            category_ids.insert(category.name.clone(), created.id);
        }

        for product in &seed.products {
            let category_id = match &product.category {
                Some(name) => Some(
                    *category_ids
                        .get(name)
                        .ok_or_else(|| DbError::not_found("category", name))?,
                ),
                None => None,
            };

            insert_product(
                &tx,
                &NewProduct {
                    name: product.name.clone(),
                    description: product.description.clone(),
                    price: currency.to_smallest_unit(product.price),
                    image: product.image.clone(),
                    featured: product.featured,
                    category_id,
                },
                currency,
            )?;
        }

        tx.commit()?;
        info!(
            "Seeded catalog: {} categories, {} products",
            seed.categories.len(),
            seed.products.len()
        );
        Ok(seed.products.len())
    }
}
