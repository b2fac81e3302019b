//! In-process stores.
//!
//! Behave like the `PostgreSQL` implementations (case-insensitive email
//! uniqueness, serial ids, soft deletes) so handlers and services can be
//! exercised without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use catalog_core::{Email, ProductId, Role, UserId};

use super::{CredentialStore, ProductRepository, RepositoryError};
use crate::models::{Identity, NewProduct, Product, ProductChanges};

/// [`CredentialStore`] held in memory.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Vec<Identity>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        let key = email.normalized();
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email.normalized() == key).cloned())
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Identity, RepositoryError> {
        let key = email.normalized();
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email.normalized() == key) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let next_id = i32::try_from(users.len() + 1)
            .map_err(|_| RepositoryError::DataCorruption("user id overflow".to_owned()))?;

        let identity = Identity {
            id: UserId::new(next_id),
            email: email.clone(),
            password_hash: password_hash.to_owned(),
            roles: roles.to_vec(),
        };
        users.push(identity.clone());
        Ok(identity)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut user.password_hash);
        Ok(())
    }
}

/// [`ProductRepository`] held in memory.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.is_active).cloned().collect())
    }

    async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id).filter(|p| p.is_active).cloned())
    }

    async fn find_active_by_name(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|p| p.is_active && Some(p.id) != exclude && same_name(&p.name, name))
            .cloned())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;

        let next_id = products.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let product = Product {
            id: ProductId::new(next_id),
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: None,
            is_active: true,
        };
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.apply(changes);
        Ok(product.clone())
    }

    async fn deactivate(&self, id: ProductId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).is_some_and(|product| {
            product.is_active = false;
            product.updated_at = Some(at);
            true
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use catalog_core::Price;
    use rust_decimal::Decimal;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: None,
            price: Price::new(Decimal::new(1000, 2)).unwrap(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_email_differing_only_in_case() {
        let store = InMemoryCredentialStore::new();
        let email = Email::parse("jane@example.com").unwrap();
        store.create(&email, "hash", &[Role::User]).await.unwrap();

        let upper = Email::parse("JANE@example.com").unwrap();
        let err = store.create(&upper, "hash", &[Role::User]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let found = store.find_by_email(&upper).await.unwrap().unwrap();
        assert_eq!(found.email.as_str(), "jane@example.com");
    }

    #[tokio::test]
    async fn test_update_password_hash_unknown_user() {
        let store = InMemoryCredentialStore::new();
        let err = store
            .update_password_hash(UserId::new(9), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_deactivate_hides_product_from_active_queries() {
        let repo = InMemoryProductRepository::new();
        let first = repo.insert(new_product("Widget")).await.unwrap();
        let second = repo.insert(new_product("Gadget")).await.unwrap();
        assert_eq!(second.id.as_i32(), first.id.as_i32() + 1);

        assert!(repo.deactivate(first.id, Utc::now()).await.unwrap());
        assert!(repo.get_active(first.id).await.unwrap().is_none());
        // Still stored, so a second deactivation finds it
        assert!(repo.deactivate(first.id, Utc::now()).await.unwrap());

        let listed = repo.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);

        assert!(!repo.deactivate(ProductId::new(99), Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_active_by_name_ignores_case_and_excluded_id() {
        let repo = InMemoryProductRepository::new();
        let widget = repo.insert(new_product("Widget")).await.unwrap();

        assert!(repo.find_active_by_name(" widget ", None).await.unwrap().is_some());
        assert!(
            repo.find_active_by_name("WIDGET", Some(widget.id))
                .await
                .unwrap()
                .is_none()
        );
    }
}
