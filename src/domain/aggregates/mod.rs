//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{NewProduct, Product, ProductCard, ProductPatch, DEFAULT_PRODUCT_IMAGE};
pub use order::{Customer, Order, OrderError, OrderItem};
pub use cart::{Cart, CartLineItem, PLACEHOLDER_TITLE};
