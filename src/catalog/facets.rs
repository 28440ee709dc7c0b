//! Filter option aggregation.
//!
//! Options are computed per scope from the values that actually occur, ignoring
//! every applied filter except the category, so no option ever leads to an empty
//! listing and narrowing one facet never hides another.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use crate::catalog::filter::trim_brand;
use crate::catalog::Scope;
use crate::domain::value_objects::{Availability, ProductClass};
use crate::storage::{ProductRepository, StorageResult};

/// Price range offered when the scope holds no products.
pub const FALLBACK_PRICE_MIN: i64 = 0;
pub const FALLBACK_PRICE_MAX: i64 = 10_000;

/// Distinct raw values as read from storage for one scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFacets {
    pub availability: Vec<Availability>,
    pub classes: Vec<ProductClass>,
    /// Non-empty stored brands, untrimmed.
    pub brands: Vec<String>,
    /// Power ratings greater than zero.
    pub power: Vec<Decimal>,
    pub energy_classes: Vec<String>,
    pub room_sizes: Vec<Decimal>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub availability: Vec<Availability>,
    pub class: Vec<ProductClass>,
    pub brand: Vec<String>,
    pub moshtnost: Vec<Decimal>,
    pub energy_class: Vec<String>,
    pub room_size: Vec<Decimal>,
    pub price_min: Decimal,
    pub price_max: Decimal,
}

impl Default for FilterOptions {
    /// No options and the fallback price range.
    fn default() -> Self {
        Self {
            availability: vec![], class: vec![], brand: vec![], moshtnost: vec![],
            energy_class: vec![], room_size: vec![],
            price_min: Decimal::from(FALLBACK_PRICE_MIN), price_max: Decimal::from(FALLBACK_PRICE_MAX),
        }
    }
}

impl FilterOptions {
    /// Reads the facet values for `scope` and normalizes them.
    pub async fn aggregate(products: &dyn ProductRepository, scope: Scope) -> StorageResult<Self> {
        Ok(Self::from_raw(products.facet_values(scope).await?))
    }

    pub fn from_raw(raw: RawFacets) -> Self {
        Self {
            availability: sorted(raw.availability),
            class: sorted(raw.classes),
            brand: normalize_brands(&raw.brands),
            moshtnost: sorted(raw.power.into_iter().filter(|p| *p > Decimal::ZERO)),
            energy_class: sorted(raw.energy_classes.into_iter().filter(|e| !e.is_empty())),
            room_size: sorted(raw.room_sizes),
            price_min: raw.price_min.map_or(Decimal::from(FALLBACK_PRICE_MIN), |p| p.floor()),
            price_max: raw.price_max.map_or(Decimal::from(FALLBACK_PRICE_MAX), |p| p.ceil()),
        }
    }
}

/// Trim, drop empties, dedupe (case-sensitive after trim), sort.
pub fn normalize_brands(brands: &[String]) -> Vec<String> {
    sorted(brands.iter().map(|b| trim_brand(b)).filter(|b| !b.is_empty()).map(str::to_string))
}

fn sorted<T: Ord>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
