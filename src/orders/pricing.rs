//! Cart Pricing
//!
//! Logic for pricing a validated cart.
//! Uses rust_decimal for precise calculations, stores as f64.
//!
//! 规则：
//! - subtotal = Σ(unit_price × quantity)，单价取校验时的目录价
//! - 运费：subtotal ≥ 500 免运费，否则固定 50
//! - 税：subtotal × 18%，四舍五入到 2 位小数
//! - total = subtotal + shipping + tax (派生值，绝不独立存储后信任)

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Free shipping threshold
const FREE_SHIPPING_THRESHOLD: i64 = 500;

/// Flat shipping cost below the threshold
const FLAT_SHIPPING_COST: i64 = 50;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Fixed 18% tax rate
fn tax_rate() -> Decimal {
    Decimal::new(18, 2)
}

/// Priced cart totals
#[derive(Debug, Clone, Default)]
pub struct CartTotals {
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

/// Price a cart of `(unit_price, quantity)` lines
pub fn price_cart(lines: &[(f64, i64)]) -> CartTotals {
    let mut subtotal = Decimal::ZERO;
    for (unit_price, quantity) in lines {
        subtotal += to_decimal(*unit_price) * Decimal::from(*quantity);
    }

    let shipping = if subtotal >= Decimal::from(FREE_SHIPPING_THRESHOLD) {
        Decimal::ZERO
    } else {
        Decimal::from(FLAT_SHIPPING_COST)
    };

    let tax = (subtotal * tax_rate())
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);

    let total = subtotal + shipping + tax;

    CartTotals {
        subtotal: to_f64(subtotal),
        shipping_cost: to_f64(shipping),
        tax_amount: to_f64(tax),
        total_amount: to_f64(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_shipping_above_threshold() {
        let totals = price_cart(&[(250.0, 4)]);
        assert_eq!(totals.subtotal, 1000.0);
        assert_eq!(totals.shipping_cost, 0.0);
        assert_eq!(totals.tax_amount, 180.0);
        assert_eq!(totals.total_amount, 1180.0);
    }

    #[test]
    fn flat_shipping_below_threshold() {
        let totals = price_cart(&[(100.0, 3)]);
        assert_eq!(totals.subtotal, 300.0);
        assert_eq!(totals.shipping_cost, 50.0);
        assert_eq!(totals.tax_amount, 54.0);
        assert_eq!(totals.total_amount, 404.0);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let totals = price_cart(&[(500.0, 1)]);
        assert_eq!(totals.shipping_cost, 0.0);
        assert_eq!(totals.total_amount, 590.0);
    }

    #[test]
    fn tax_rounds_half_up_to_two_places() {
        // 33.33 * 0.18 = 5.9994 -> 6.00
        let totals = price_cart(&[(33.33, 1)]);
        assert_eq!(totals.tax_amount, 6.0);
        // 0.25 * 0.18 = 0.045 -> 0.05 (half-up)
        let totals = price_cart(&[(0.25, 1)]);
        assert_eq!(totals.tax_amount, 0.05);
    }

    #[test]
    fn multiple_lines_accumulate() {
        let totals = price_cart(&[(100.0, 2), (150.0, 2)]);
        assert_eq!(totals.subtotal, 500.0);
        assert_eq!(totals.shipping_cost, 0.0);
        assert_eq!(totals.tax_amount, 90.0);
        assert_eq!(totals.total_amount, 590.0);
    }

    #[test]
    fn empty_cart_prices_to_flat_shipping() {
        // Engine rejects empty carts before pricing; this pins the pure function
        let totals = price_cart(&[]);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.shipping_cost, 50.0);
    }

    #[test]
    fn total_is_always_the_sum_of_parts() {
        for lines in [
            vec![(19.99, 3)],
            vec![(0.01, 1)],
            vec![(123.45, 2), (6.78, 9)],
        ] {
            let t = price_cart(&lines);
            let expected = to_f64(
                to_decimal(t.subtotal) + to_decimal(t.shipping_cost) + to_decimal(t.tax_amount),
            );
            assert_eq!(t.total_amount, expected);
        }
    }
}
