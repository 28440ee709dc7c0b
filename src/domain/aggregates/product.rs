//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{format_bgn, format_eur, Availability, Category, Money, ProductClass};

/// Image shown when a product has none of its own.
pub const DEFAULT_PRODUCT_IMAGE: &str = "kmta-400x267.jpg.webp";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category: Category,
    pub price: Decimal,
    pub current_offer: String,
    pub description: String,
    /// Power rating in BTU ("moshtnost").
    pub power: Decimal,
    pub class: Option<ProductClass>,
    pub img: String,
    pub brand: String,
    pub model: String,
    pub availability: Option<Availability>,
    pub energy_class: String,
    pub wifi: bool,
    pub room_size: Option<Decimal>,
    pub recommended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(input: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), category: input.category, price: input.price.max(Decimal::ZERO),
            current_offer: input.current_offer, description: input.description, power: input.power.max(Decimal::ZERO),
            class: input.class, img: input.img.unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
            brand: input.brand, model: input.model, availability: input.availability,
            energy_class: input.energy_class, wifi: input.wifi, room_size: input.room_size,
            recommended: input.recommended, created_at: now, updated_at: now,
        }
    }

    pub fn price(&self) -> Money { Money::eur(self.price) }

    /// `brand model`, or `None` when both are blank.
    pub fn brand_model(&self) -> Option<String> {
        let joined = [self.brand.as_str(), self.model.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }

    /// Listing title: brand + model, else description, else a spec summary.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.brand_model() { return title; }
        if !self.description.is_empty() { return self.description.clone(); }
        let mut parts = Vec::new();
        if !self.power.is_zero() { parts.push(format!("{} BTU", self.power.normalize())); }
        if let Some(class) = self.class { parts.push(format!("Клас {}", class.as_str())); }
        if parts.is_empty() { "—".to_string() } else { parts.join(" ") }
    }

    pub fn card(&self) -> ProductCard {
        let ribbons = if self.current_offer.is_empty() {
            vec![]
        } else {
            vec![Ribbon { style: "red".into(), label: self.current_offer.clone() }]
        };
        ProductCard {
            id: self.id,
            ribbons,
            img: if self.img.is_empty() { DEFAULT_PRODUCT_IMAGE.to_string() } else { self.img.clone() },
            brand: self.brand.clone(),
            model: self.model.clone(),
            title: self.display_title(),
            price: format_eur(Some(self.price)),
            price_lv: format_bgn(Some(self.price().to_bgn().amount())),
            category: self.category,
        }
    }

    /// Applies a partial update; fields left as `None` keep their stored value.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(v) = patch.category { self.category = v; }
        if let Some(v) = patch.price { self.price = v.max(Decimal::ZERO); }
        if let Some(v) = patch.current_offer { self.current_offer = v; }
        if let Some(v) = patch.description { self.description = v; }
        if let Some(v) = patch.power { self.power = v.max(Decimal::ZERO); }
        if let Some(v) = patch.class { self.class = v; }
        if let Some(v) = patch.img { self.img = v; }
        if let Some(v) = patch.brand { self.brand = v; }
        if let Some(v) = patch.model { self.model = v; }
        if let Some(v) = patch.availability { self.availability = v; }
        if let Some(v) = patch.energy_class { self.energy_class = v; }
        if let Some(v) = patch.wifi { self.wifi = v; }
        if let Some(v) = patch.room_size { self.room_size = v; }
        if let Some(v) = patch.recommended { self.recommended = v; }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a product.
#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub category: Category,
    pub price: Decimal,
    pub current_offer: String,
    pub description: String,
    pub power: Decimal,
    pub class: Option<ProductClass>,
    pub img: Option<String>,
    pub brand: String,
    pub model: String,
    pub availability: Option<Availability>,
    pub energy_class: String,
    pub wifi: bool,
    pub room_size: Option<Decimal>,
    pub recommended: bool,
}

/// Typed partial update. Nullable fields use `Some(None)` to clear.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub category: Option<Category>,
    pub price: Option<Decimal>,
    pub current_offer: Option<String>,
    pub description: Option<String>,
    pub power: Option<Decimal>,
    pub class: Option<Option<ProductClass>>,
    pub img: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub availability: Option<Option<Availability>>,
    pub energy_class: Option<String>,
    pub wifi: Option<bool>,
    pub room_size: Option<Option<Decimal>>,
    pub recommended: Option<bool>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: Uuid,
    pub ribbons: Vec<Ribbon>,
    pub img: String,
    pub brand: String,
    pub model: String,
    pub title: String,
    pub price: String,
    pub price_lv: String,
    pub category: Category,
}

#[derive(Clone, Debug, Serialize)]
pub struct Ribbon { pub style: String, pub label: String }

#[cfg(test)]
mod tests {
    use super::*;

    fn midea() -> Product {
        Product::create(NewProduct {
            brand: "Midea".into(), model: "MA2-24NXD0-I".into(), price: Decimal::new(1102, 0),
            ..Default::default()
        })
    }

    #[test]
    fn test_product_create_defaults() {
        let p = midea();
        assert_eq!(p.img, DEFAULT_PRODUCT_IMAGE);
        assert_eq!(p.category, Category::Inverter);
        assert_eq!(p.display_title(), "Midea MA2-24NXD0-I");
    }

    #[test]
    fn test_negative_numbers_are_clamped() {
        let p = Product::create(NewProduct { price: Decimal::new(-5, 0), power: Decimal::new(-1, 0), ..Default::default() });
        assert_eq!(p.price, Decimal::ZERO);
        assert_eq!(p.power, Decimal::ZERO);
    }

    #[test]
    fn test_title_fallbacks() {
        let mut p = Product::create(NewProduct { power: Decimal::new(12000, 0), class: Some(ProductClass::Visok), ..Default::default() });
        assert_eq!(p.display_title(), "12000 BTU Клас visok");
        p.description = "Тих и икономичен".into();
        assert_eq!(p.display_title(), "Тих и икономичен");
        let blank = Product::create(NewProduct::default());
        assert_eq!(blank.display_title(), "—");
    }

    #[test]
    fn test_card() {
        let mut p = midea();
        p.current_offer = "-10%".into();
        let card = p.card();
        assert_eq!(card.price, "1.102,00 €");
        assert_eq!(card.price_lv, "2155,32 лв.");
        assert_eq!(card.ribbons.len(), 1);
        assert_eq!(card.ribbons[0].style, "red");
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut p = midea();
        p.room_size = Some(Decimal::new(25, 0));
        p.apply(ProductPatch { brand: Some("Gree".into()), room_size: Some(None), ..Default::default() });
        assert_eq!(p.brand, "Gree");
        assert_eq!(p.model, "MA2-24NXD0-I");
        assert_eq!(p.room_size, None);
        assert_eq!(p.price, Decimal::new(1102, 0));
    }
}
