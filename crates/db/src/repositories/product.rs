use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use catalog_core::domain::product::{NewProduct, Product, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = Decimal::from_str(&price_str).map_err(|e| {
        RepositoryError::Decode(format!("invalid price `{price_str}` for product {id}: {e}"))
    })?;

    Ok(Product { id: ProductId(id), name, quantity, price, notes })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, quantity, price, notes FROM product ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, quantity, price, notes FROM product WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn add(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO product (name, quantity, price, notes) VALUES (?, ?, ?, ?)")
                .bind(&product.name)
                .bind(product.quantity)
                .bind(product.price.to_string())
                .bind(&product.notes)
                .execute(&self.pool)
                .await?;

        Ok(product.with_id(ProductId(result.last_insert_rowid())))
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, product: Product) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE product
             SET name = ?, quantity = ?, price = ?, notes = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price.to_string())
        .bind(&product.notes)
        .bind(product.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(product.id));
        }

        Ok(product)
    }
}
