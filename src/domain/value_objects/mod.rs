//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed EUR → BGN conversion rate.
pub const EUR_TO_BGN: Decimal = Decimal::from_parts(195_583, 0, 0, false, 5);

/// Rendered in place of an amount that is missing.
pub const MISSING_AMOUNT: &str = "—";

// =============================================================================
// Money
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Eur,
    Bgn,
}

/// Money value object. Base currency is EUR; BGN is always derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn eur(amount: Decimal) -> Self { Self { amount, currency: Currency::Eur } }
    pub fn zero() -> Self { Self::eur(Decimal::ZERO) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> Currency { self.currency }

    pub fn multiply(&self, qty: u32) -> Money {
        Money { amount: self.amount * Decimal::from(qty), currency: self.currency }
    }

    /// Converts at the fixed rate, rounded to cents. A BGN amount is returned as is.
    pub fn to_bgn(&self) -> Money {
        match self.currency {
            Currency::Bgn => *self,
            Currency::Eur => Money { amount: round_cents(self.amount * EUR_TO_BGN), currency: Currency::Bgn },
        }
    }

    pub fn formatted(&self) -> String {
        match self.currency {
            Currency::Eur => format_eur(Some(self.amount)),
            Currency::Bgn => format_bgn(Some(self.amount)),
        }
    }
}

impl Default for Money { fn default() -> Self { Self::zero() } }

/// Rounds to two decimals, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `1.234,56 €` (de-DE grouping).
pub fn format_eur(amount: Option<Decimal>) -> String {
    match amount {
        Some(a) => format!("{} €", group_amount(a, '.', 1)),
        None => MISSING_AMOUNT.to_string(),
    }
}

/// `1234,56 лв.` / `12 345,67 лв.` (bg-BG grouping, which starts at five integer digits).
pub fn format_bgn(amount: Option<Decimal>) -> String {
    match amount {
        Some(a) => format!("{} лв.", group_amount(a, '\u{a0}', 2)),
        None => MISSING_AMOUNT.to_string(),
    }
}

/// `<eur> / <bgn>` for one EUR amount.
pub fn format_dual(amount: Decimal) -> String {
    format!("{} / {}", format_eur(Some(amount)), format_bgn(Some(Money::eur(amount).to_bgn().amount())))
}

fn group_amount(amount: Decimal, group_sep: char, min_grouping_digits: usize) -> String {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut out = String::with_capacity(plain.len() + 4);
    if negative { out.push('-'); }
    if int_part.len() >= 3 + min_grouping_digits {
        let lead = int_part.len() % 3;
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (i + 3 - lead) % 3 == 0 { out.push(group_sep); }
            out.push(ch);
        }
    } else {
        out.push_str(int_part);
    }
    out.push(',');
    out.push_str(frac_part);
    out
}

// =============================================================================
// Quantity
// =============================================================================

/// Quantity value object, always ≥ 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value.max(1)) }
    pub fn value(&self) -> u32 { self.0 }

    /// Integer coercion of a form value; anything unparseable or below 1 becomes 1.
    /// A fractional value keeps its integer prefix (`"2.7"` → 2).
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(parse_int_prefix) {
            Some(n) if n >= 1 => Self(u32::try_from(n).unwrap_or(u32::MAX)),
            _ => Self(1),
        }
    }
}

/// Leading-integer parse of a form value: surrounding whitespace is ignored and
/// parsing stops at the first non-digit (`" 12abc"` → 12). `None` when no digits lead.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..digits_end].parse::<i64>().ok()
}

impl Default for Quantity { fn default() -> Self { Self(1) } }

// =============================================================================
// Fixed enums
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Inverter,
    Hyperinverter,
    Floor,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Inverter, Category::Hyperinverter, Category::Floor];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Inverter => "inverter", Self::Hyperinverter => "hyperinverter", Self::Floor => "floor" }
    }

    pub fn path(&self) -> &'static str {
        match self { Self::Inverter => "/inverter", Self::Hyperinverter => "/hyperinverter", Self::Floor => "/floor" }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Inverter => "Инверторни климатици",
            Self::Hyperinverter => "Хиперинверторни климатици",
            Self::Floor => "Подови климатици",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownTag;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inverter" => Ok(Self::Inverter),
            "hyperinverter" => Ok(Self::Hyperinverter),
            "floor" => Ok(Self::Floor),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    ByOrder,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self { Self::InStock => "in_stock", Self::ByOrder => "by_order" }
    }
    pub fn label(&self) -> &'static str {
        match self { Self::InStock => "В наличност", Self::ByOrder => "С поръчка" }
    }
}

impl FromStr for Availability {
    type Err = UnknownTag;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "by_order" => Ok(Self::ByOrder),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductClass {
    Visok,
    Mezhdinen,
    Nachalen,
}

impl ProductClass {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Visok => "visok", Self::Mezhdinen => "mezhdinen", Self::Nachalen => "nachalen" }
    }
    pub fn label(&self) -> &'static str {
        match self { Self::Visok => "Висок клас", Self::Mezhdinen => "Междинен клас", Self::Nachalen => "Начален клас" }
    }
}

impl FromStr for ProductClass {
    type Err = UnknownTag;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visok" => Ok(Self::Visok),
            "mezhdinen" => Ok(Self::Mezhdinen),
            "nachalen" => Ok(Self::Nachalen),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);
impl std::error::Error for UnknownTag {}
impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown tag `{}`", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(Some(dec("1102"))), "1.102,00 €");
        assert_eq!(format_eur(Some(dec("250.5"))), "250,50 €");
        assert_eq!(format_eur(Some(dec("1234567.891"))), "1.234.567,89 €");
        assert_eq!(format_eur(None), "—");
    }

    #[test]
    fn test_format_bgn_grouping_starts_at_five_digits() {
        assert_eq!(format_bgn(Some(dec("1234.56"))), "1234,56 лв.");
        assert_eq!(format_bgn(Some(dec("12345.67"))), "12\u{a0}345,67 лв.");
        assert_eq!(format_bgn(Some(Decimal::ZERO)), "0,00 лв.");
    }

    #[test]
    fn test_to_bgn_rounds_half_away_from_zero() {
        // 250.50 * 1.95583 = 489.935415
        assert_eq!(Money::eur(dec("250.50")).to_bgn().amount(), dec("489.94"));
        assert_eq!(round_cents(dec("0.125")), dec("0.13"));
    }

    #[test]
    fn test_money_currency() {
        let eur = Money::eur(Decimal::new(1102, 0));
        assert_eq!(eur.currency(), Currency::Eur);
        assert_eq!(eur.to_bgn().currency(), Currency::Bgn);
        assert_eq!(eur.to_bgn().to_bgn(), eur.to_bgn());
        assert_eq!(eur.multiply(2).formatted(), "2.204,00 €");
        assert_eq!(eur.multiply(2).to_bgn().formatted(), "4310,65 лв.");
    }

    #[test]
    fn test_quantity_parse() {
        assert_eq!(Quantity::parse(Some("3")).value(), 3);
        assert_eq!(Quantity::parse(Some(" 2.7 ")).value(), 2);
        assert_eq!(Quantity::parse(Some("0")).value(), 1);
        assert_eq!(Quantity::parse(Some("-4")).value(), 1);
        assert_eq!(Quantity::parse(Some("abc")).value(), 1);
        assert_eq!(Quantity::parse(None).value(), 1);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix(" 12abc"), Some(12));
        assert_eq!(parse_int_prefix("+3"), Some(3));
        assert_eq!(parse_int_prefix("-1"), Some(-1));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("x1"), None);
    }

    #[test]
    fn test_enum_tags() {
        assert_eq!("by_order".parse::<Availability>().unwrap(), Availability::ByOrder);
        assert!("sold_out".parse::<Availability>().is_err());
        assert_eq!("floor".parse::<Category>().unwrap().path(), "/floor");
        assert_eq!(ProductClass::Mezhdinen.label(), "Междинен клас");
    }
}
