//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit price from the catalog.
///
/// Serialized as a decimal string so snapshots round-trip exactly. Decoding
/// also accepts JSON numbers, which is what the catalog API sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer amount in the smallest currency unit.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display with the currency's symbol (e.g. `R$ 179.90`).
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol, including any separating space.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$ ",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(17990).amount(), Decimal::new(17990, 2));
        assert_eq!(Price::from_cents(-150).amount(), Decimal::new(-150, 2));
    }

    #[test]
    fn test_decodes_json_number_and_string() {
        let from_number: Price = serde_json::from_str("179.9").unwrap();
        let from_string: Price = serde_json::from_str("\"179.90\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_encodes_as_string() {
        let json = serde_json::to_string(&Price::from_cents(13990)).unwrap();
        assert_eq!(json, "\"139.90\"");
    }

    #[test]
    fn test_line_arithmetic() {
        let total: Price = [Price::from_cents(1000) * 3, Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(3250));
    }

    #[test]
    fn test_display() {
        let price = Price::from_cents(17990);
        assert_eq!(price.to_string(), "179.90");
        assert_eq!(price.display(CurrencyCode::BRL), "R$ 179.90");
        assert_eq!(price.display(CurrencyCode::USD), "$179.90");
    }
}
