//! Product catalog service.
//!
//! Validates incoming product fields, enforces name uniqueness among active
//! products and delegates storage to a [`ProductRepository`].

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use catalog_core::{Price, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{NewProduct, Product, ProductChanges};

/// Maximum product name length, in characters, after trimming.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// One or more fields are invalid; each entry is a client-facing message.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Another active product already uses this name.
    #[error("A product with the name '{0}' already exists.")]
    DuplicateName(String),

    /// No active product with this id.
    #[error("Entity 'Product' with key '{0}' was not found.")]
    NotFound(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Product fields as submitted by a client, before validation.
///
/// Every field is optional at this stage so that missing fields are reported
/// as validation messages rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    /// Only honoured on update; defaults to `true`.
    pub is_active: Option<bool>,
}

/// Fields that passed validation.
#[derive(Debug)]
struct ValidProduct {
    name: String,
    description: Option<String>,
    price: Price,
    image_url: Option<String>,
    is_active: bool,
}

impl ProductInput {
    fn validate(self) -> Result<ValidProduct, ProductError> {
        let mut problems = Vec::new();

        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            problems.push("Name is required".to_owned());
        } else if name.chars().count() > MAX_NAME_LENGTH {
            problems.push(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters"
            ));
        }

        let description = non_empty(self.description);
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            problems.push(format!(
                "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            ));
        }

        let price = match self.price {
            None => {
                problems.push("Price is required".to_owned());
                None
            }
            Some(amount) => match Price::new(amount) {
                Ok(price) => Some(price),
                Err(e) => {
                    let mut msg = e.to_string();
                    if let Some(first) = msg.get_mut(0..1) {
                        first.make_ascii_uppercase();
                    }
                    problems.push(msg);
                    None
                }
            },
        };

        match price {
            Some(price) if problems.is_empty() => Ok(ValidProduct {
                name: name.to_owned(),
                description,
                price,
                image_url: non_empty(self.image_url),
                is_active: self.is_active.unwrap_or(true),
            }),
            _ => Err(ProductError::Validation(problems)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Product catalog service.
pub struct ProductService<'a> {
    products: &'a dyn ProductRepository,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub const fn new(products: &'a dyn ProductRepository) -> Self {
        Self { products }
    }

    /// All active products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.list_active().await?)
    }

    /// One active product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product is absent or inactive.
    pub async fn get(&self, id: ProductId) -> Result<Product, ProductError> {
        self.products
            .get_active(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Create an active product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` for invalid fields.
    /// Returns `ProductError::DuplicateName` if an active product has the same name.
    pub async fn create(&self, input: ProductInput) -> Result<Product, ProductError> {
        let valid = input.validate()?;
        self.ensure_name_free(&valid.name, None).await?;

        let product = self
            .products
            .insert(NewProduct {
                name: valid.name,
                description: valid.description,
                price: valid.price,
                image_url: valid.image_url,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Overwrite an active product's fields.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` for invalid fields, before any lookup.
    /// Returns `ProductError::NotFound` if the product is absent or inactive.
    /// Returns `ProductError::DuplicateName` if another active product has the name.
    pub async fn update(&self, id: ProductId, input: ProductInput) -> Result<Product, ProductError> {
        let valid = input.validate()?;

        if self.products.get_active(id).await?.is_none() {
            return Err(ProductError::NotFound(id));
        }

        self.ensure_name_free(&valid.name, Some(id)).await?;

        let product = self
            .products
            .update(
                id,
                ProductChanges {
                    name: valid.name,
                    description: valid.description,
                    price: valid.price,
                    image_url: valid.image_url,
                    is_active: valid.is_active,
                    updated_at: Utc::now(),
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ProductError::NotFound(id),
                other => ProductError::Repository(other),
            })?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Soft-delete a product. Deleting an already inactive product succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if no product has this id.
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        if !self.products.deactivate(id, Utc::now()).await? {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    async fn ensure_name_free(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<(), ProductError> {
        if self
            .products
            .find_active_by_name(name, exclude)
            .await?
            .is_some()
        {
            return Err(ProductError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }
}
