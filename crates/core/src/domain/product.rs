use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Repository-assigned identity. Never reused once issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product that has not been stored yet and therefore has no identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub notes: Option<String>,
}

impl NewProduct {
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            quantity: self.quantity,
            price: self.price,
            notes: self.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{NewProduct, ProductId};

    #[test]
    fn with_id_keeps_every_descriptive_field() {
        let draft = NewProduct {
            name: "Keyboard".to_string(),
            quantity: 4,
            price: Decimal::new(19_990, 2),
            notes: Some("mechanical".to_string()),
        };

        let product = draft.clone().with_id(ProductId(7));

        assert_eq!(product.id, ProductId(7));
        assert_eq!(product.name, draft.name);
        assert_eq!(product.quantity, draft.quantity);
        assert_eq!(product.price, draft.price);
        assert_eq!(product.notes, draft.notes);
    }

    #[test]
    fn product_id_displays_raw_number() {
        assert_eq!(ProductId(42).to_string(), "42");
    }
}
