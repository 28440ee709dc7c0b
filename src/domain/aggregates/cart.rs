//! Cart Aggregate
//!
//! A cart is the ordered list of line items held in one visitor session. Position in
//! the list is the addressing scheme for removal, so insertion order is preserved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::{Product, DEFAULT_PRODUCT_IMAGE};
use crate::domain::value_objects::{Money, Quantity};

/// Title used when a product has neither brand nor model.
pub const PLACEHOLDER_TITLE: &str = "Продукт";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Reference only; the product may since have been deleted.
    pub product_id: String,
    pub quantity: u32,
    /// Brand + model captured at add time.
    pub title: String,
    /// Unit price captured at add time; never refreshed.
    pub price: Decimal,
    pub img: String,
}

impl CartLineItem {
    pub fn unit_price(&self) -> Money { Money::eur(self.price) }
    pub fn line_total(&self) -> Money { self.unit_price().multiply(self.quantity.max(1)) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }
    pub fn from_items(items: Vec<CartLineItem>) -> Self { Self { items } }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn into_items(self) -> Vec<CartLineItem> { self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }

    /// Sum of quantities, not distinct lines.
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Merges into the existing line for the same product, or appends a new one
    /// capturing the product's current title, price and image.
    pub fn add_product(&mut self, product: &Product, quantity: Quantity) {
        let product_id = product.id.to_string();
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.saturating_add(quantity.value());
            return;
        }
        self.items.push(CartLineItem {
            product_id,
            quantity: quantity.value(),
            title: product.brand_model().unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            price: product.price,
            img: if product.img.is_empty() { DEFAULT_PRODUCT_IMAGE.to_string() } else { product.img.clone() },
        });
    }

    /// Removes the line at `index`. Out-of-range indices are ignored; returns whether
    /// anything was removed.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.items.len() { return false; }
        self.items.remove(index);
        true
    }

    pub fn clear(&mut self) { self.items.clear(); }
}
