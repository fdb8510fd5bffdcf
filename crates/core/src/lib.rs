pub mod config;
pub mod domain;
pub mod dto;
pub mod errors;

pub use domain::product::{NewProduct, Product, ProductId};
pub use dto::ProductDto;
pub use errors::{ApplicationError, InterfaceError};
