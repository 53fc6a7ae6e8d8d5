//! # Cart Types
//!
//! Client-scoped carts and the compact snapshot of a cart that travels
//! with a checkout session through the payment provider's metadata.

use crate::error::{ShopError, ShopResult};
use crate::product::{Currency, Price, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a client-supplied cart code
pub const MAX_CART_CODE_LEN: usize = 11;

/// Stripe rejects metadata values longer than this
pub const MAX_METADATA_VALUE_LEN: usize = 500;

/// Largest quantity a single cart line may hold
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Validate a client-supplied cart code
pub fn validate_cart_code(code: &str) -> ShopResult<()> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ShopError::Validation("cart_code is required".to_string()));
    }
    if code.len() > MAX_CART_CODE_LEN {
        return Err(ShopError::Validation(format!(
            "cart_code must be at most {} characters",
            MAX_CART_CODE_LEN
        )));
    }
    Ok(())
}

/// Check that a line quantity is within `1..=MAX_ITEM_QUANTITY`
pub fn validate_quantity(quantity: u32) -> ShopResult<()> {
    if (1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(ShopError::Validation(format!(
            "quantity must be between 1 and {}",
            MAX_ITEM_QUANTITY
        )))
    }
}

/// A line in a cart, with its product resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price of this line (unit price × quantity)
    pub fn sub_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A cart and its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub cart_code: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line sub-totals
    pub fn total(&self, currency: Currency) -> Price {
        let amount = self.items.iter().map(|item| item.sub_total().amount).sum();
        Price::from_cents(amount, currency)
    }

    /// Number of units across all lines
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Capture the cart's current contents
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            entries: self
                .items
                .iter()
                .map(|item| SnapshotEntry {
                    product_id: item.product.id,
                    quantity: item.quantity,
                    unit_amount: item.product.price.amount,
                })
                .collect(),
        }
    }
}

/// One line of a [`CartSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub product_id: i64,
    pub quantity: u32,
    /// Unit price in the smallest currency unit at checkout time
    pub unit_amount: i64,
}

/// Cart contents frozen at checkout time.
///
/// Encoded as `product_id:quantity:unit_amount` entries joined by `;`, so it
/// fits in a single provider metadata value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl CartSnapshot {
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}:{}:{}", e.product_id, e.quantity, e.unit_amount))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Encoded form, or `None` when it would exceed the metadata value limit
    pub fn encode_for_metadata(&self) -> Option<String> {
        let encoded = self.encode();
        (!encoded.is_empty() && encoded.len() <= MAX_METADATA_VALUE_LEN).then_some(encoded)
    }

    pub fn decode(raw: &str) -> ShopResult<Self> {
        let mut entries = Vec::new();

        for part in raw.split(';').filter(|p| !p.is_empty()) {
            let fields: Vec<&str> = part.split(':').collect();
            if fields.len() != 3 {
                return Err(ShopError::Validation(format!(
                    "malformed cart snapshot entry: {}",
                    part
                )));
            }

            let parse_err = || ShopError::Validation(format!("malformed cart snapshot entry: {}", part));
            let product_id = fields[0].parse().map_err(|_| parse_err())?;
            let quantity: u32 = fields[1].parse().map_err(|_| parse_err())?;
            let unit_amount: i64 = fields[2].parse().map_err(|_| parse_err())?;

            if validate_quantity(quantity).is_err() || unit_amount < 0 {
                return Err(parse_err());
            }

            entries.push(SnapshotEntry {
                product_id,
                quantity,
                unit_amount,
            });
        }

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, price: f64) -> Product {
        Product {
            id,
            name: name.to_string(),
            slug: crate::product::slugify(name),
            description: String::new(),
            price: Price::new(price, Currency::USD),
            image: None,
            featured: false,
            category_id: None,
        }
    }

    fn cart() -> Cart {
        Cart {
            id: 1,
            cart_code: "ABC123".to_string(),
            items: vec![
                CartItem {
                    id: 1,
                    product: product(1, "Mug", 10.0),
                    quantity: 2,
                },
                CartItem {
                    id: 2,
                    product: product(2, "Sticker", 5.0),
                    quantity: 1,
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = cart();
        assert_eq!(cart.total(Currency::USD).amount, 2500);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.items[0].sub_total().amount, 2000);
    }

    #[test]
    fn test_snapshot_encoding() {
        let snapshot = cart().snapshot();
        assert_eq!(snapshot.encode(), "1:2:1000;2:1:500");

        let decoded = CartSnapshot::decode("1:2:1000;2:1:500").unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(CartSnapshot::decode("1:2").is_err());
        assert!(CartSnapshot::decode("a:1:100").is_err());
        assert!(CartSnapshot::decode("1:0:100").is_err());
        assert!(CartSnapshot::decode("1:3000000000:100").is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
        assert!(validate_quantity(3_000_000_000).is_err());
    }

    #[test]
    fn test_snapshot_too_large_for_metadata() {
        let snapshot = CartSnapshot {
            entries: (0..100)
                .map(|i| SnapshotEntry {
                    product_id: 100_000 + i,
                    quantity: 1,
                    unit_amount: 999_999,
                })
                .collect(),
        };
        assert!(snapshot.encode_for_metadata().is_none());
        assert!(CartSnapshot::default().encode_for_metadata().is_none());
    }

    #[test]
    fn test_cart_code_validation() {
        assert!(validate_cart_code("ABC123").is_ok());
        assert!(validate_cart_code("   ").is_err());
        assert!(validate_cart_code("ABCDEFGHIJKL").is_err());
    }
}
