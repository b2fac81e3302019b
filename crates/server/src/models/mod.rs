//! Domain models for the catalog server.
//!
//! These are validated domain objects, separate from database row types and
//! from the JSON shapes in [`crate::routes`].

pub mod product;
pub mod user;

pub use product::{NewProduct, Product, ProductChanges};
pub use user::{CurrentUser, Identity};
