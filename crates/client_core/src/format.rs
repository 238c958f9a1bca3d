use rust_decimal::Decimal;

use crate::comparison::{round_minor, MINOR_UNIT_DECIMALS};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// `symbol` + thousands-grouped amount with two decimals, e.g. `$1,234.50`.
pub fn format_money(symbol: &str, amount: Decimal) -> String {
    let mut rounded = round_minor(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded.set_sign_positive(true);
    rounded.rescale(MINOR_UNIT_DECIMALS);

    let text = rounded.to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn groups_thousands_and_pads_cents() {
        assert_eq!(format_money("$", dec!(1234.5)), "$1,234.50");
        assert_eq!(format_money("$", dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money("€", dec!(999)), "€999.00");
        assert_eq!(format_money("$", dec!(0)), "$0.00");
    }

    #[test]
    fn rounds_half_cents_away_from_zero_and_keeps_sign() {
        assert_eq!(format_money("$", dec!(0.005)), "$0.01");
        assert_eq!(format_money("£", dec!(-12000.125)), "-£12,000.13");
        assert_eq!(format_money("$", dec!(-0.001)), "$0.00");
    }
}
