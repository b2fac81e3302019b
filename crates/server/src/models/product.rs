//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use catalog_core::{Price, ProductId};

/// A catalog product (domain type).
///
/// Serializes to the API representation with camelCase field names; absent
/// optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Validated fields for a product about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated replacement fields for an existing product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Apply an update in place.
    pub fn apply(&mut self, changes: ProductChanges) {
        self.name = changes.name;
        self.description = changes.description;
        self.price = changes.price;
        self.image_url = changes.image_url;
        self.is_active = changes.is_active;
        self.updated_at = Some(changes.updated_at);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_serializes_camel_case_and_skips_missing() {
        let product = Product {
            id: ProductId::new(7),
            name: "Laptop".to_owned(),
            description: None,
            price: Price::new(Decimal::new(129_999, 2)).unwrap(),
            image_url: Some("https://example.com/laptop.jpg".to_owned()),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            updated_at: None,
            is_active: true,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["price"], 1299.99);
        assert_eq!(json["imageUrl"], "https://example.com/laptop.jpg");
        assert_eq!(json["isActive"], true);
        assert!(json.get("description").is_none());
        assert!(json.get("updatedAt").is_none());
    }
}
