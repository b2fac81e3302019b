//! Product route handlers.
//!
//! Reads are public; mutations require a bearer token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use catalog_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, Product};
use crate::services::{ProductInput, ProductService};
use crate::state::AppState;

/// Caller label for public reads.
fn caller_label(caller: Option<&CurrentUser>) -> &str {
    caller.map_or("anonymous", |user| user.email.as_str())
}

/// List active products.
#[tracing::instrument(skip_all, fields(caller = caller_label(caller.as_ref())))]
pub async fn list(
    OptionalAuth(caller): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.products()).list().await?;
    Ok(Json(products))
}

/// Get one active product.
#[tracing::instrument(skip_all, fields(caller = caller_label(caller.as_ref())))]
pub async fn get(
    OptionalAuth(caller): OptionalAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let product = ProductService::new(state.products()).get(id).await?;
    Ok(Json(product))
}

/// Create a product. Responds `201 Created` with a `Location` header.
#[tracing::instrument(skip_all, fields(user = %user.email))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response> {
    let Json(input) = body?;
    let product = ProductService::new(state.products()).create(input).await?;

    let location = HeaderValue::from_str(&format!("/api/products/{}", product.id))
        .map_err(|e| AppError::Internal(format!("invalid location header: {e}")))?;

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(product)).into_response())
}

/// Replace a product's fields.
#[tracing::instrument(skip_all, fields(user = %user.email))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let product = ProductService::new(state.products())
        .update(id, input)
        .await?;
    Ok(Json(product))
}

/// Soft-delete a product.
#[tracing::instrument(skip_all, fields(user = %user.email))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    ProductService::new(state.products()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
