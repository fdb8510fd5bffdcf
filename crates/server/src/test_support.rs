#![cfg(test)]

use catalog_core::domain::product::{NewProduct, Product, ProductId};
use catalog_db::{ProductRepository, RepositoryError};

/// Repository whose every call fails, for exercising the persistence error path.
pub struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Decode("storage offline".to_string())
}

#[async_trait::async_trait]
impl ProductRepository for UnavailableRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Err(offline())
    }

    async fn find(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Err(offline())
    }

    async fn add(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
        Err(offline())
    }

    async fn delete(&self, _id: ProductId) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn update(&self, _product: Product) -> Result<Product, RepositoryError> {
        Err(offline())
    }
}
