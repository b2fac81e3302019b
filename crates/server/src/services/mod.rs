//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password change
//! - `products` - Product validation and catalog operations
//! - `tokens` - Bearer token issuing and validation

pub mod auth;
pub mod products;
pub mod tokens;

pub use auth::{AuthError, AuthService, create_account};
pub use products::{ProductError, ProductInput, ProductService};
pub use tokens::{Claims, IssuedToken, TokenError, TokenService};
