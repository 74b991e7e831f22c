// storefront/src/services/catalog.rs

//! Product catalog operations.

use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::Store;

pub async fn list_products(store: &dyn Store) -> AppResult<Vec<Product>> {
  Ok(store.list_products().await?)
}

pub async fn find_products(store: &dyn Store, ids: &[i64]) -> AppResult<Vec<Product>> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  Ok(store.find_products(ids).await?)
}

#[instrument(name = "catalog::create_product", skip(store, input), err(Display))]
pub async fn create_product(store: &dyn Store, input: ProductPatch) -> AppResult<Product> {
  let new_product = NewProduct::try_from(input)?;
  let product = store.insert_product(&new_product).await?;
  info!(product_id = product.id, "Product created.");
  Ok(product)
}

/// Applies `patch` to the stored product and saves the merged record.
#[instrument(name = "catalog::update_product", skip(store, patch), err(Display))]
pub async fn update_product(store: &dyn Store, product_id: i64, patch: ProductPatch) -> AppResult<Product> {
  let patch = patch.normalized()?;
  if patch.is_empty() {
    return Err(AppError::Validation("No fields provided for update".to_string()));
  }
  let mut product = store
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  product.apply_patch(patch);

  let saved = store
    .save_product(&product)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  info!(product_id, "Product updated.");
  Ok(saved)
}

#[instrument(name = "catalog::delete_product", skip(store), err(Display))]
pub async fn delete_product(store: &dyn Store, product_id: i64) -> AppResult<()> {
  if !store.delete_product(product_id).await? {
    return Err(AppError::NotFound("Product not found".to_string()));
  }
  info!(product_id, "Product deleted.");
  Ok(())
}
