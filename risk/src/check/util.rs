use rust_decimal::Decimal;

/// Absolute percentage difference between two decimal values, used by the
/// trailing entry/take-profit guards to test a retracement against
/// `entry_deviation / leverage`.
pub fn calculate_abs_percent_difference(
    value1: Decimal,
    value2: Decimal,
) -> Result<Decimal, &'static str> {
    if value2.is_zero() {
        return Err("Cannot calculate percentage difference with zero denominator");
    }

    let diff = (value1 - value2).abs();
    Ok(diff / value2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn computes_relative_difference() {
        assert_eq!(
            calculate_abs_percent_difference(dec!(110), dec!(100)).unwrap(),
            dec!(0.1)
        );
    }

    #[test]
    fn rejects_zero_denominator() {
        assert!(calculate_abs_percent_difference(dec!(1), dec!(0)).is_err());
    }
}
