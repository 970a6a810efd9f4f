use serde::{Deserialize, Serialize};

/// Monetary amount in integer minor units (cents).
///
/// All currency arithmetic in the system happens on whole cents so that
/// order totals never accumulate floating-point drift: a line item of
/// 2 × $29.99 is exactly 5998 cents, never 59.980000000000004.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units (e.g. 2999 == $29.99).
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Mul<u32> for Money {
    type Output = Money;

    fn mul(self, quantity: u32) -> Self::Output {
        Money(self.0 * i64::from(quantity))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_round_trips() {
        let m = Money::from_cents(2999);
        assert_eq!(m.cents(), 2999);
        assert!(!m.is_zero());
        assert!(!m.is_negative());
    }

    #[test]
    fn display_formats_as_dollars() {
        assert_eq!(Money::from_cents(2999).to_string(), "$29.99");
        assert_eq!(Money::from_cents(100).to_string(), "$1.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-2999).to_string(), "-$29.99");
    }

    #[test]
    fn arithmetic_is_exact() {
        // 2 x $29.99 + 1 x $49.99 == $109.97, to the cent
        let total: Money = [Money::from_cents(2999) * 2, Money::from_cents(4999) * 1]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 10997);
    }

    #[test]
    fn add_assign_accumulates() {
        let mut m = Money::from_cents(100);
        m += Money::from_cents(50);
        assert_eq!(m.cents(), 150);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
    }
}
