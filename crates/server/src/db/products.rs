//! Product storage.
//!
//! Products are never removed; deletion clears `is_active`. Name uniqueness
//! among active products is checked by the service layer, not by a constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use catalog_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductChanges};

/// Storage for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All active products, ordered by id.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;

    /// An active product by id.
    async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// An active product whose trimmed name equals `name` ignoring case,
    /// skipping `exclude`.
    async fn find_active_by_name(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product and return it with its assigned id.
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Overwrite a product's mutable fields.
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, RepositoryError>;

    /// Mark a product inactive. Returns `false` if no product has this id.
    async fn deactivate(&self, id: ProductId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, created_at, updated_at, is_active";

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL`-backed [`ProductRepository`].
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn find_active_by_name(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active
              AND lower(btrim(name)) = lower(btrim($1))
              AND ($2::INT IS NULL OR id <> $2)
            ORDER BY id
            LIMIT 1
            "
        ))
        .bind(name)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, image_url, created_at, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await?;

        Product::try_from(row)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, image_url = $5,
                is_active = $6, updated_at = $7
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(&changes.image_url)
        .bind(changes.is_active)
        .bind(changes.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    async fn deactivate(&self, id: ProductId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET is_active = FALSE, updated_at = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
