//! Checkout: customer form handling and order placement.
//!
//! A rejected form is a normal outcome, not an error. The visitor gets the checkout
//! view back with what they typed, and the cart stays as it was.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use crate::cart::{CartStore, EnrichedLine, Totals};
use crate::domain::aggregates::{Cart, Customer, Order, OrderItem};
use crate::domain::value_objects::{format_bgn, format_eur, Money};
use crate::notify::EventPublisher;
use crate::session::SessionId;
use crate::storage::{Liveness, OrderRepository};
use crate::{Result, StorefrontError};

pub const VALIDATION_MESSAGE: &str = "Моля, попълнете име, телефон и адрес.";
const DEFAULT_COUNTRY: &str = "България";

/// Raw checkout form. Every field is optional text.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
}

fn text(v: &Option<String>) -> &str { v.as_deref().map(str::trim).unwrap_or_default() }

fn join_present(parts: &[&str], sep: &str) -> String {
    parts.iter().copied().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(sep)
}

impl CheckoutForm {
    /// First and last name, else the combined `fullName` field.
    pub fn composed_name(&self) -> String {
        let split = join_present(&[text(&self.first_name), text(&self.last_name)], " ");
        if split.is_empty() { text(&self.full_name).to_string() } else { split }
    }

    /// Street, city and postal code, else the combined `address` field.
    pub fn composed_address(&self) -> String {
        let split = join_present(&[text(&self.street), text(&self.city), text(&self.postal_code)], ", ");
        if split.is_empty() { text(&self.address).to_string() } else { split }
    }

    /// Free-text comment with the email appended.
    pub fn composed_comment(&self) -> String {
        let email = text(&self.email);
        let email = if email.is_empty() { String::new() } else { format!("Имейл: {email}") };
        join_present(&[text(&self.comment), email.as_str()], "; ")
    }

    pub fn customer(&self) -> Customer {
        Customer {
            full_name: self.composed_name(),
            phone: text(&self.phone).to_string(),
            address: self.composed_address(),
            comment: self.composed_comment(),
        }
    }

    /// Validated customer, or the names of the missing required fields.
    pub fn validate_customer(&self) -> std::result::Result<Customer, Vec<&'static str>> {
        let customer = self.customer();
        match customer.validate() {
            Ok(()) => Ok(customer),
            Err(errors) => {
                let fields = errors.field_errors();
                Err([("full_name", "fullName"), ("phone", "phone"), ("address", "address")]
                    .into_iter()
                    .filter(|(field, _)| fields.contains_key(field))
                    .map(|(_, name)| name)
                    .collect())
            }
        }
    }
}

/// Entered values sent back with a rejected form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEcho {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company: String,
    pub country: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub comment: String,
}

impl FormEcho {
    pub fn blank() -> Self { Self { country: DEFAULT_COUNTRY.to_string(), ..Default::default() } }

    pub fn from_form(form: &CheckoutForm) -> Self {
        let raw = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            first_name: raw(&form.first_name),
            last_name: raw(&form.last_name),
            full_name: raw(&form.full_name),
            company: raw(&form.company),
            country: form.country.clone().filter(|c| !c.is_empty()).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            street: raw(&form.street),
            city: raw(&form.city),
            postal_code: raw(&form.postal_code),
            address: raw(&form.address),
            phone: raw(&form.phone),
            email: raw(&form.email),
            comment: raw(&form.comment),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: u32,
    pub title: String,
    pub price: Decimal,
    pub img: String,
    pub price_formatted: String,
    pub line_total_eur: Decimal,
    pub line_total_bgn: Decimal,
    /// `<eur> (<bgn>)`.
    pub line_total_formatted: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub cart: Vec<CheckoutLine>,
    pub total_eur_formatted: String,
    pub total_bgn_formatted: String,
    pub total_eur: Decimal,
    pub total_bgn: Decimal,
    pub error: Option<String>,
    pub missing: Vec<&'static str>,
    pub form: FormEcho,
}

impl CheckoutView {
    pub fn build(lines: &[EnrichedLine], form: FormEcho) -> Self {
        let totals = Totals::compute(lines.iter().map(|l| (l.item.price, l.item.quantity)));
        let cart = lines
            .iter()
            .zip(&totals.lines)
            .map(|(line, total)| CheckoutLine {
                product_id: line.item.product_id.clone(),
                quantity: total.quantity,
                title: line.model_label.clone(),
                price: line.item.price,
                img: line.item.img.clone(),
                price_formatted: format_eur(Some(line.item.price)),
                line_total_eur: total.eur,
                line_total_bgn: total.bgn,
                line_total_formatted: format!("{} ({})", format_eur(Some(total.eur)), format_bgn(Some(total.bgn))),
            })
            .collect();
        Self {
            cart,
            total_eur_formatted: totals.total_eur_formatted(),
            total_bgn_formatted: totals.total_bgn_formatted(),
            total_eur: totals.total_eur,
            total_bgn: totals.total_bgn,
            error: None,
            missing: vec![],
            form,
        }
    }
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Nothing to check out; the caller shows the empty cart.
    EmptyCart,
    /// Required fields missing. Nothing was written.
    Rejected(Box<CheckoutView>),
    Placed(Order),
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderSuccess {
    pub order: Option<Order>,
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: CartStore,
    orders: Arc<dyn OrderRepository>,
    liveness: Arc<dyn Liveness>,
    events: EventPublisher,
}

impl CheckoutService {
    pub fn new(carts: CartStore, orders: Arc<dyn OrderRepository>, liveness: Arc<dyn Liveness>, events: EventPublisher) -> Self {
        Self { carts, orders, liveness, events }
    }

    /// Checkout page for the session's cart; `None` when the cart is empty.
    pub async fn view(&self, sid: &SessionId) -> Result<Option<CheckoutView>> {
        let cart = self.carts.read(sid).await?;
        if cart.is_empty() {
            return Ok(None);
        }
        let lines = self.carts.enrich(&cart).await?;
        Ok(Some(CheckoutView::build(&lines, FormEcho::blank())))
    }

    pub async fn place(&self, sid: &SessionId, form: &CheckoutForm) -> Result<CheckoutOutcome> {
        let cart = self.carts.read(sid).await?;
        if cart.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let customer = match form.validate_customer() {
            Ok(customer) => customer,
            Err(missing) => {
                tracing::info!(session_id = %sid, ?missing, "checkout rejected");
                let lines = self.carts.enrich(&cart).await?;
                let mut view = CheckoutView::build(&lines, FormEcho::from_form(form));
                view.error = Some(VALIDATION_MESSAGE.to_string());
                view.missing = missing;
                return Ok(CheckoutOutcome::Rejected(Box::new(view)));
            }
        };

        if !self.liveness.is_available() {
            return Err(StorefrontError::StorageUnavailable);
        }

        let mut order = snapshot(customer, &cart)?;
        self.orders.create(&order).await?;
        // The order stands even when the cart cannot be emptied.
        if let Err(e) = self.carts.clear(sid).await {
            tracing::warn!(session_id = %sid, order_id = %order.id, "cart not cleared after order: {e}");
        }
        tracing::info!(session_id = %sid, order_id = %order.id, count = order.items.len(), total = %order.total, "order placed");

        self.events.publish(order.take_events()).await;
        Ok(CheckoutOutcome::Placed(order))
    }

    /// Confirmation page data. Unknown, malformed or unreachable orders render as none.
    pub async fn order_success(&self, raw_id: Option<&str>) -> Result<OrderSuccess> {
        let Some(id) = raw_id.and_then(|id| Uuid::parse_str(id.trim()).ok()) else {
            return Ok(OrderSuccess { order: None });
        };
        if !self.liveness.is_available() {
            return Ok(OrderSuccess { order: None });
        }
        Ok(OrderSuccess { order: self.orders.find_by_id(id).await? })
    }
}

/// Order built from the cart as stored: captured titles, prices and quantities.
fn snapshot(customer: Customer, cart: &Cart) -> Result<Order> {
    let items: Vec<OrderItem> = cart.items().iter().map(OrderItem::from).collect();
    let totals = Totals::compute(items.iter().map(|i| (i.price, i.quantity)));
    Ok(Order::place(customer, items, Money::eur(totals.total_eur))?)
}
