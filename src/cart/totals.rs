//! Cart totals in EUR with derived BGN amounts.

use rust_decimal::Decimal;
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineTotal {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub eur: Decimal,
    /// Converted from this line's EUR total.
    pub bgn: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub lines: Vec<LineTotal>,
    pub total_eur: Decimal,
    /// Converted from `total_eur`, never summed from the lines.
    pub total_bgn: Decimal,
    /// Sum of quantities.
    pub count: u32,
}

impl Totals {
    /// Totals for `(unit price, quantity)` pairs. Quantities below 1 count as 1.
    pub fn compute(pairs: impl IntoIterator<Item = (Decimal, u32)>) -> Self {
        let lines: Vec<LineTotal> = pairs
            .into_iter()
            .map(|(unit_price, quantity)| {
                let quantity = quantity.max(1);
                let eur = Money::eur(unit_price).multiply(quantity);
                LineTotal { unit_price, quantity, eur: eur.amount(), bgn: eur.to_bgn().amount() }
            })
            .collect();
        let total_eur: Decimal = lines.iter().map(|l| l.eur).sum();
        Self {
            total_bgn: Money::eur(total_eur).to_bgn().amount(),
            count: lines.iter().map(|l| l.quantity).fold(0u32, u32::saturating_add),
            total_eur,
            lines,
        }
    }

    pub fn total_eur_formatted(&self) -> String { Money::eur(self.total_eur).formatted() }
    pub fn total_bgn_formatted(&self) -> String { Money::eur(self.total_eur).to_bgn().formatted() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grand_bgn_is_converted_from_grand_eur() {
        let totals = Totals::compute([(Decimal::new(10000, 2), 2), (Decimal::new(5050, 2), 1)]);
        assert_eq!(totals.total_eur, Decimal::new(25050, 2));
        assert_eq!(totals.total_bgn, Decimal::new(48994, 2));
        assert_eq!(totals.count, 3);
        assert_eq!(totals.total_eur_formatted(), "250,50 €");
        assert_eq!(totals.total_bgn_formatted(), "489,94 лв.");
    }

    #[test]
    fn test_no_compounding_rounding() {
        let totals = Totals::compute(std::iter::repeat((Decimal::new(3, 3), 1)).take(10));
        assert_eq!(totals.lines[0].bgn, Decimal::new(1, 2));
        assert_eq!(totals.lines.iter().map(|l| l.bgn).sum::<Decimal>(), Decimal::new(10, 2));
        assert_eq!(totals.total_bgn, Decimal::new(6, 2));
    }

    #[test]
    fn test_empty_cart() {
        let totals = Totals::compute(Vec::<(Decimal, u32)>::new());
        assert_eq!(totals.count, 0);
        assert_eq!(totals.total_eur_formatted(), "0,00 €");
        assert_eq!(totals.total_bgn_formatted(), "0,00 лв.");
    }
}
