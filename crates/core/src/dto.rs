//! Transfer object exchanged between the service layer and its callers.
//!
//! Conversions are written out field by field so that adding a field to either
//! side is a compile error until every mapping handles it.

use rust_decimal::Decimal;

use crate::domain::product::{NewProduct, Product, ProductId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductDto {
    pub id: Option<ProductId>,
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub notes: Option<String>,
}

impl ProductDto {
    /// Drops any identity carried by the transfer object.
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            quantity: self.quantity,
            price: self.price,
            notes: self.notes,
        }
    }

    /// Builds a stored record, ignoring whatever identity the transfer object held.
    pub fn into_product(self, id: ProductId) -> Product {
        self.into_new_product().with_id(id)
    }
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name,
            quantity: product.quantity,
            price: product.price,
            notes: product.notes,
        }
    }
}
