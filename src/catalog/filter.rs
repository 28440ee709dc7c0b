//! Filter builder: raw catalog query parameters → typed product predicate.
//!
//! Every rule is optional and independent. A value that does not parse or is not one
//! of the known tags drops that constraint; building a filter never fails.

use rust_decimal::Decimal;
use crate::catalog::params::{parse_number, QueryParams};
use crate::catalog::Scope;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Availability, Category, ProductClass};

/// Characters stripped from both ends of a brand before comparing. The Postgres
/// filter strips the same set with `btrim(brand, E' \t\r\n')`.
pub const BRAND_PADDING: &[char] = &[' ', '\t', '\r', '\n'];

pub fn trim_brand(raw: &str) -> &str {
    raw.trim_matches(BRAND_PADDING)
}

/// Inclusive price bounds; either side may be open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    pub fn is_open(&self) -> bool { self.min.is_none() && self.max.is_none() }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min.map_or(true, |m| price >= m) && self.max.map_or(true, |m| price <= m)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub availability: Option<Availability>,
    pub class: Option<ProductClass>,
    /// Trimmed, non-empty brand names, OR-combined. Matched case-insensitively and
    /// whole-string against the trimmed stored brand.
    pub brands: Vec<String>,
    /// Power ratings, OR-combined (set membership).
    pub power: Vec<Decimal>,
    pub price: PriceRange,
    pub energy_class: Option<String>,
    /// Only ever constrains to `true`.
    pub wifi_only: bool,
    pub room_size: Option<Decimal>,
}

impl ProductFilter {
    /// Filter that matches everything within `scope`.
    pub fn for_scope(scope: Scope) -> Self {
        Self { category: scope.category(), ..Default::default() }
    }

    pub fn build(scope: Scope, params: &QueryParams) -> Self {
        let mut filter = Self::for_scope(scope);

        filter.availability = params.single("availability").and_then(|v| v.parse().ok());
        filter.class = params.single("class").and_then(|v| v.parse().ok());

        filter.brands = params
            .all("brand")
            .into_iter()
            .map(trim_brand)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();

        filter.power = params.all("moshtnost").into_iter().filter_map(parse_number).collect();

        filter.price = PriceRange {
            min: params.single("minPrice").and_then(parse_number),
            max: params.single("maxPrice").and_then(parse_number),
        };

        filter.energy_class = params
            .single("energyClass")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        filter.wifi_only = matches!(params.single("wifi"), Some("1" | "true"));
        filter.room_size = params.single("roomSize").and_then(parse_number);

        filter
    }

    /// Normalized brand keys used for matching.
    pub fn brand_keys(&self) -> Vec<String> {
        self.brands.iter().map(|b| b.to_lowercase()).collect()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.category.is_some_and(|c| c != product.category) { return false; }
        if self.availability.is_some() && self.availability != product.availability { return false; }
        if self.class.is_some() && self.class != product.class { return false; }
        if !self.brands.is_empty() {
            let stored = trim_brand(&product.brand).to_lowercase();
            if !self.brand_keys().iter().any(|b| *b == stored) { return false; }
        }
        if !self.power.is_empty() && !self.power.contains(&product.power) { return false; }
        if !self.price.contains(product.price) { return false; }
        if self.energy_class.as_ref().is_some_and(|e| *e != product.energy_class) { return false; }
        if self.wifi_only && !product.wifi { return false; }
        if let Some(size) = self.room_size {
            if product.room_size != Some(size) { return false; }
        }
        true
    }
}
