//! Quantity resolution: raw quantity plus a growth allowance.

use rust_decimal::Decimal;

/// Usable quantity after applying the growth factor, expressed in percent:
/// `q + q * growth / 100`.
pub fn final_quantity(quantity: Decimal, growth_factor: Decimal) -> Decimal {
    quantity + quantity * growth_factor / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn growth_is_additive_percent() {
        assert_eq!(final_quantity(dec!(100), dec!(10)), dec!(110));
    }

    #[test]
    fn zero_growth_passes_through() {
        assert_eq!(final_quantity(dec!(42.5), Decimal::ZERO), dec!(42.5));
    }

    #[test]
    fn negative_growth_shrinks() {
        // Quantity growth may be negative (a deduction); only contributor
        // growth percentages are validated.
        assert_eq!(final_quantity(dec!(200), dec!(-50)), dec!(100));
    }
}
