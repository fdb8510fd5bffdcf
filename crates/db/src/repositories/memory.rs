use tokio::sync::RwLock;

use catalog_core::domain::product::{NewProduct, Product, ProductId};

use super::{ProductRepository, RepositoryError};

/// Process-local product store.
///
/// The collection and the identity counter live behind one lock so that
/// concurrent creates never observe or hand out the same identity.
#[derive(Default)]
pub struct InMemoryProductRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    products: Vec<Product>,
    last_id: i64,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.clone())
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|product| product.id == id).cloned())
    }

    async fn add(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let product = product.with_id(ProductId(state.last_id));
        state.products.push(product.clone());
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.products.retain(|product| product.id != id);
        Ok(())
    }

    async fn update(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.products.iter().any(|existing| existing.id == product.id) {
            return Err(RepositoryError::NotFound(product.id));
        }

        // replacement goes to the back, like a fresh insert
        state.products.retain(|existing| existing.id != product.id);
        state.products.push(product.clone());
        Ok(product)
    }
}
