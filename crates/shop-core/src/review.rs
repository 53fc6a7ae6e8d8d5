//! # Reviews & Wishlists
//!
//! Customer-facing records attached to products. Users exist only as owners
//! of these records; authentication lives elsewhere.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest accepted review rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted review rating
pub const MAX_RATING: u8 = 5;

/// Check that a rating is on the 1..=5 scale
pub fn validate_rating(rating: u8) -> ShopResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ShopError::Validation(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )))
    }
}

/// Label for a rating value, as shown next to review stars
pub fn rating_label(rating: u8) -> &'static str {
    match rating {
        1 => "Poor",
        2 => "Fair",
        3 => "Good",
        4 => "Very Good",
        5 => "Excellent",
        _ => "Unrated",
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(skip_serializing)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user: User,
    pub rating: u8,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: i64,
    pub user: User,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of toggling a product on a wishlist
#[derive(Debug, Clone, PartialEq)]
pub enum WishlistToggle {
    Added(WishlistEntry),
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_rating_labels() {
        assert_eq!(rating_label(4), "Very Good");
        assert_eq!(rating_label(9), "Unrated");
    }
}
