//! Catalog browsing: filtered, paginated listings plus the home and product pages.

pub mod facets;
pub mod filter;
pub mod pagination;
pub mod params;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use crate::domain::aggregates::{Product, ProductCard};
use crate::domain::value_objects::{Availability, Category, ProductClass};
use crate::storage::{Liveness, ProductRepository};
use crate::{Result, StorefrontError};

pub use facets::{FilterOptions, RawFacets};
pub use filter::{PriceRange, ProductFilter};
pub use pagination::{Pagination, PAGE_SIZE};
pub use params::QueryParams;

const RECOMMENDED_LIMIT: u64 = 12;
const MORE_PRODUCTS_LIMIT: u64 = 8;
const MODEL_DISPLAY_LIMIT: usize = 80;
const MODEL_DISPLAY_KEEP: usize = 77;

/// The category context a listing and its facets are computed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Category(Category),
}

impl Scope {
    pub fn category(&self) -> Option<Category> {
        match self { Scope::All => None, Scope::Category(c) => Some(*c) }
    }

    pub fn path(&self) -> &'static str {
        match self { Scope::All => "/produkti", Scope::Category(c) => c.path() }
    }

    pub fn title(&self) -> &'static str {
        match self { Scope::All => "Всички продукти", Scope::Category(c) => c.title() }
    }
}

// =============================================================================
// View models
// =============================================================================

/// Echo of the filter inputs exactly as the visitor sent them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub availability: String,
    pub class: String,
    pub brand: Vec<String>,
    pub moshtnost: Vec<String>,
    pub min_price: String,
    pub max_price: String,
    pub energy_class: String,
    pub wifi: String,
    pub room_size: String,
}

impl AppliedFilters {
    pub fn echo(params: &QueryParams) -> Self {
        let text = |key: &str| params.first(key).unwrap_or_default().to_string();
        Self {
            availability: text("availability"),
            class: text("class"),
            brand: params.all("brand").into_iter().filter(|b| !b.is_empty()).map(str::to_string).collect(),
            moshtnost: params.all("moshtnost").into_iter().filter(|m| !m.is_empty()).map(str::to_string).collect(),
            min_price: text("minPrice"),
            max_price: text("maxPrice"),
            energy_class: text("energyClass"),
            wifi: text("wifi"),
            room_size: text("roomSize"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<ProductCard>,
    pub catalog_title: String,
    pub breadcrumb_current: String,
    pub filter_options: FilterOptions,
    pub applied_filters: AppliedFilters,
    pub pagination: Pagination,
    pub class_labels: BTreeMap<&'static str, &'static str>,
    pub availability_labels: BTreeMap<&'static str, &'static str>,
    /// Storage was unreachable; everything above is the empty rendering.
    pub offline: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub products: Vec<ProductCard>,
    pub offline: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub brand: String,
    pub model: String,
    pub model_display: String,
    pub description: String,
    pub moshtnost: Option<rust_decimal::Decimal>,
    pub class: Option<ProductClass>,
    pub category: Category,
    pub availability: Option<Availability>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub product: ProductCard,
    pub product_details: ProductDetails,
    /// Other products for the recommendations strip.
    pub products: Vec<ProductCard>,
    pub product_category_path: &'static str,
}

pub fn class_labels() -> BTreeMap<&'static str, &'static str> {
    [ProductClass::Visok, ProductClass::Mezhdinen, ProductClass::Nachalen]
        .into_iter()
        .map(|c| (c.as_str(), c.label()))
        .collect()
}

pub fn availability_labels() -> BTreeMap<&'static str, &'static str> {
    [Availability::InStock, Availability::ByOrder].into_iter().map(|a| (a.as_str(), a.label())).collect()
}

/// Past `limit` characters, keeps the first `keep` and appends an ellipsis.
pub(crate) fn truncate_display(s: &str, limit: usize, keep: usize) -> String {
    if s.chars().count() <= limit { return s.to_string(); }
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    liveness: Arc<dyn Liveness>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>, liveness: Arc<dyn Liveness>) -> Self {
        Self { products, liveness }
    }

    /// Listing for one scope. Count, page and facets are read concurrently; an
    /// unreachable store yields the offline rendering instead of an error.
    pub async fn list(&self, scope: Scope, params: &QueryParams) -> Result<CatalogPage> {
        if !self.liveness.is_available() {
            tracing::warn!(scope = scope.path(), "catalog requested while storage is offline");
            return Ok(Self::offline_page(scope));
        }

        let filter = ProductFilter::build(scope, params);
        let page = Pagination::requested_page(params);
        let repo = self.products.as_ref();
        let (total_count, docs, filter_options) = tokio::try_join!(
            repo.count(&filter),
            repo.find_page(&filter, Pagination::skip(page), Pagination::limit()),
            FilterOptions::aggregate(repo, scope),
        )?;
        tracing::debug!(scope = scope.path(), total_count, page, "catalog listing");

        Ok(CatalogPage {
            products: docs.iter().map(Product::card).collect(),
            catalog_title: scope.title().to_string(),
            breadcrumb_current: scope.title().to_string(),
            filter_options,
            applied_filters: AppliedFilters::echo(params),
            pagination: Pagination::new(total_count, page, scope.path(), params),
            class_labels: class_labels(),
            availability_labels: availability_labels(),
            offline: false,
        })
    }

    fn offline_page(scope: Scope) -> CatalogPage {
        CatalogPage {
            products: vec![],
            catalog_title: scope.title().to_string(),
            breadcrumb_current: scope.title().to_string(),
            filter_options: FilterOptions::default(),
            applied_filters: AppliedFilters::default(),
            pagination: Pagination::empty(scope.path()),
            class_labels: BTreeMap::new(),
            availability_labels: BTreeMap::new(),
            offline: true,
        }
    }

    /// Recommended products, newest first.
    pub async fn home(&self) -> Result<HomePage> {
        if !self.liveness.is_available() {
            return Ok(HomePage { products: vec![], offline: true });
        }
        let docs = self.products.recommended(RECOMMENDED_LIMIT).await?;
        Ok(HomePage { products: docs.iter().map(Product::card).collect(), offline: false })
    }

    pub async fn product_page(&self, raw_id: &str) -> Result<ProductPage> {
        if !self.liveness.is_available() {
            return Err(StorefrontError::StorageUnavailable);
        }
        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| StorefrontError::ProductNotFound)?;
        let product = self.products.find_by_id(id).await?.ok_or(StorefrontError::ProductNotFound)?;
        let more = self.products.others(id, MORE_PRODUCTS_LIMIT).await?;

        let model = product.model.trim().to_string();
        let details = ProductDetails {
            brand: product.brand.clone(),
            model_display: truncate_display(&model, MODEL_DISPLAY_LIMIT, MODEL_DISPLAY_KEEP),
            model,
            description: product.description.trim().to_string(),
            moshtnost: (!product.power.is_zero()).then_some(product.power),
            class: product.class,
            category: product.category,
            availability: product.availability,
        };
        Ok(ProductPage {
            product: product.card(),
            product_details: details,
            products: more.iter().map(Product::card).collect(),
            product_category_path: product.category.path(),
        })
    }
}
