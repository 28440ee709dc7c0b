//! Live display titles for cart lines.
//!
//! Titles follow the product as it is now; prices stay as captured when the line
//! was added.

use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;
use crate::catalog::truncate_display;
use crate::domain::aggregates::{CartLineItem, Product, PLACEHOLDER_TITLE};
use crate::storage::{Liveness, ProductRepository, StorageResult};

const MODEL_LIMIT: usize = 60;
const MODEL_KEEP: usize = 57;
const LABEL_LIMIT: usize = 80;
const LABEL_KEEP: usize = 79;

#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedLine {
    pub item: CartLineItem,
    pub model_label: String,
}

/// `brand model` for the cart drawer, trimmed and clamped, or the placeholder.
pub fn model_label(product: Option<&Product>) -> String {
    let Some(p) = product else { return PLACEHOLDER_TITLE.to_string() };
    let brand = p.brand.trim();
    let model = truncate_display(p.model.trim(), MODEL_LIMIT, MODEL_KEEP);
    let label = [brand, model.as_str()].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
    if label.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }
    truncate_display(&label, LABEL_LIMIT, LABEL_KEEP)
}

/// Re-reads every referenced product in one batched lookup. With storage offline
/// the titles captured at add time are shown instead.
pub async fn enrich(
    products: &dyn ProductRepository,
    liveness: &dyn Liveness,
    items: &[CartLineItem],
) -> StorageResult<Vec<EnrichedLine>> {
    if items.is_empty() {
        return Ok(vec![]);
    }
    if !liveness.is_available() {
        tracing::debug!(lines = items.len(), "storage offline, using cached cart titles");
        return Ok(items.iter().map(cached).collect());
    }

    let ids: Vec<Uuid> = items
        .iter()
        .filter_map(|i| Uuid::parse_str(i.product_id.trim()).ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let live: HashMap<String, Product> = if ids.is_empty() {
        HashMap::new()
    } else {
        products.find_by_ids(&ids).await?.into_iter().map(|p| (p.id.to_string(), p)).collect()
    };

    Ok(items
        .iter()
        .map(|item| {
            let label = model_label(live.get(item.product_id.trim()));
            let mut item = item.clone();
            item.title = label.clone();
            EnrichedLine { item, model_label: label }
        })
        .collect())
}

fn cached(item: &CartLineItem) -> EnrichedLine {
    let label = if item.title.is_empty() { PLACEHOLDER_TITLE.to_string() } else { item.title.clone() };
    EnrichedLine { item: item.clone(), model_label: label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Cart, NewProduct, ProductPatch};
    use crate::domain::value_objects::Quantity;
    use crate::storage::memory::{MemoryProductRepository, StaticLiveness};
    use rust_decimal::Decimal;

    fn product(brand: &str, model: &str) -> Product {
        Product::create(NewProduct { brand: brand.into(), model: model.into(), ..Default::default() })
    }

    #[test]
    fn test_model_label_trims_and_clamps() {
        assert_eq!(model_label(Some(&product("  Midea ", " MA2-24NXD0-I "))), "Midea MA2-24NXD0-I");
        assert_eq!(model_label(Some(&product("", ""))), PLACEHOLDER_TITLE);
        assert_eq!(model_label(None), PLACEHOLDER_TITLE);

        let long_model = model_label(Some(&product("LG", &"M".repeat(70))));
        assert_eq!(long_model, format!("LG {}…", "M".repeat(57)));

        let long_brand = model_label(Some(&product(&"B".repeat(50), &"M".repeat(50))));
        assert_eq!(long_brand.chars().count(), 80);
        assert!(long_brand.ends_with('…'));
    }

    #[tokio::test]
    async fn test_titles_follow_live_product_but_price_does_not() {
        let repo = MemoryProductRepository::default();
        let live = StaticLiveness::new(true);
        let p = repo.insert(NewProduct { brand: "Gree".into(), model: "Pular".into(), price: Decimal::new(500, 0), ..Default::default() }).await;
        let mut cart = Cart::new();
        cart.add_product(&p, Quantity::new(1));

        repo.update(p.id, ProductPatch { model: Some("Pular Pro".into()), price: Some(Decimal::new(900, 0)), ..Default::default() })
            .await
            .unwrap();
        let lines = enrich(&repo, &live, cart.items()).await.unwrap();
        assert_eq!(lines[0].model_label, "Gree Pular Pro");
        assert_eq!(lines[0].item.title, "Gree Pular Pro");
        assert_eq!(lines[0].item.price, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn test_deleted_and_foreign_ids_get_placeholder() {
        let repo = MemoryProductRepository::default();
        let live = StaticLiveness::new(true);
        let p = repo.insert(NewProduct { brand: "Daikin".into(), ..Default::default() }).await;
        let mut cart = Cart::new();
        cart.add_product(&p, Quantity::new(1));
        let mut items = cart.into_items();
        items.push(CartLineItem { product_id: "legacy-id".into(), quantity: 1, title: "Old".into(), price: Decimal::ONE, img: String::new() });
        repo.delete(p.id).await.unwrap();

        let lines = enrich(&repo, &live, &items).await.unwrap();
        assert!(lines.iter().all(|l| l.model_label == PLACEHOLDER_TITLE));
    }

    #[tokio::test]
    async fn test_offline_uses_cached_titles() {
        let repo = MemoryProductRepository::default();
        let live = StaticLiveness::new(false);
        let items = vec![CartLineItem { product_id: "x".into(), quantity: 2, title: "LG Artcool".into(), price: Decimal::TEN, img: String::new() }];
        let lines = enrich(&repo, &live, &items).await.unwrap();
        assert_eq!(lines[0].model_label, "LG Artcool");
    }
}
