use async_trait::async_trait;
use thiserror::Error;

use catalog_core::domain::product::{NewProduct, Product, ProductId};
use catalog_core::errors::ApplicationError;

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("product {0} does not exist")]
    NotFound(ProductId),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => {
                ApplicationError::NotFound(format!("Product with id {id} not found"))
            }
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

/// Storage contract shared by the in-memory and SQLite product stores.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All stored products, in insertion order for memory and id order for SQLite.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Stores the product under the next identity and returns it with that identity.
    async fn add(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Removes the product if present. Missing ids are not an error.
    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// Replaces every field of an existing product.
    ///
    /// Fails with [`RepositoryError::NotFound`] when no product has `product.id`.
    async fn update(&self, product: Product) -> Result<Product, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use catalog_core::domain::product::ProductId;
    use catalog_core::errors::ApplicationError;

    use super::RepositoryError;

    #[test]
    fn not_found_maps_to_application_not_found() {
        let mapped = ApplicationError::from(RepositoryError::NotFound(ProductId(8)));

        assert_eq!(mapped, ApplicationError::NotFound("Product with id 8 not found".to_string()));
    }

    #[test]
    fn decode_failure_maps_to_persistence() {
        let mapped = ApplicationError::from(RepositoryError::Decode("bad price".to_string()));

        assert!(matches!(
            mapped,
            ApplicationError::Persistence(ref message) if message.contains("bad price")
        ));
    }
}
