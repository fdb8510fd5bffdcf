use std::sync::Arc;

use catalog_core::domain::product::ProductId;
use catalog_core::dto::ProductDto;
use catalog_core::errors::ApplicationError;
use catalog_db::ProductRepository;
use tracing::{info, instrument};

/// Application service for products.
///
/// Works purely in transfer objects; stored records never leave this layer.
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ProductDto>, ApplicationError> {
        let products = self.repository.list().await?;
        Ok(products.into_iter().map(ProductDto::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<ProductDto, ApplicationError> {
        match self.repository.find(id).await? {
            Some(product) => Ok(ProductDto::from(product)),
            None => Err(ApplicationError::NotFound(format!("Product with id {id} not found"))),
        }
    }

    /// Stores a new product. Any identity on `dto` is ignored.
    #[instrument(skip(self, dto))]
    pub async fn create(&self, dto: ProductDto) -> Result<ProductDto, ApplicationError> {
        let stored = self.repository.add(dto.into_new_product()).await?;
        info!(
            event_name = "catalog.product.created",
            product_id = %stored.id,
            "product created"
        );
        Ok(ProductDto::from(stored))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ApplicationError> {
        if self.repository.find(id).await?.is_none() {
            return Err(ApplicationError::NotFound(format!(
                "cannot delete product with id {id} - product does not exist"
            )));
        }

        self.repository.delete(id).await?;
        info!(event_name = "catalog.product.deleted", product_id = %id, "product deleted");
        Ok(())
    }

    /// Replaces every field of product `id`; the identity in `dto` is overridden.
    #[instrument(skip(self, dto), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        dto: ProductDto,
    ) -> Result<ProductDto, ApplicationError> {
        let updated = self.repository.update(dto.into_product(id)).await?;
        info!(event_name = "catalog.product.updated", product_id = %id, "product updated");
        Ok(ProductDto::from(updated))
    }
}
