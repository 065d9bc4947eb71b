//! Typed parsers for raw dataset fields.
//!
//! Currency coercion and date parsing happen here, once, at load time.

use crate::error::MoneyError;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Day-first formats, two-digit years first so `05/01/19` is 2019 and not year 19.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%y", "%d.%m.%Y", "%Y-%m-%d",
];

/// Largest accepted amount magnitude (one quadrillion).
///
/// Sums and percentages over any number of records stay well inside the
/// range of `Decimal` below this bound.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Parse a currency-formatted amount such as `$1,234.50`.
///
/// Currency symbols, thousands separators, stray `%` signs and whitespace
/// are stripped. Accounting-style parentheses mark a negative amount.
/// Amounts beyond [`MAX_AMOUNT`] in magnitude are rejected.
pub fn parse_money(raw: &str) -> Result<Decimal, MoneyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::Empty);
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | '%') && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&cleaned).map_err(|_| MoneyError::Invalid(trimmed.to_string()))?;
    if value.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(MoneyError::OutOfRange(trimmed.to_string()));
    }
    Ok(if negative { -value } else { value })
}

/// Parse a date written day-first, falling back to ISO `yyyy-mm-dd`.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Parse a unit count. Whole-valued decimals like `7.0` are accepted.
pub fn parse_quantity(raw: &str) -> Result<u32, String> {
    let value = Decimal::from_str(raw.trim()).map_err(|_| "not a number".to_string())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err("quantity cannot be negative".to_string());
    }
    if !value.fract().is_zero() {
        return Err("quantity must be a whole number".to_string());
    }
    value
        .to_u32()
        .ok_or_else(|| "quantity out of range".to_string())
}

/// Parse a customer rating on the 0–10 scale.
pub fn parse_rating(raw: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(raw.trim()).map_err(|_| "not a number".to_string())?;
    if value < Decimal::ZERO || value > Decimal::TEN {
        return Err("rating must be between 0 and 10".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money_strips_symbols() {
        assert_eq!(parse_money("$1,234.50").unwrap(), Decimal::new(123450, 2));
        assert_eq!(parse_money(" 99 ").unwrap(), Decimal::new(99, 0));
        assert_eq!(parse_money("12.5%").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_money("-$20.00").unwrap(), Decimal::new(-2000, 2));
        assert_eq!(parse_money("($3.25)").unwrap(), Decimal::new(-325, 2));
    }

    #[test]
    fn test_parse_money_failures() {
        assert_eq!(parse_money("   "), Err(MoneyError::Empty));
        assert_eq!(
            parse_money("twelve"),
            Err(MoneyError::Invalid("twelve".to_string()))
        );
        assert!(parse_money("$").is_err());
        assert!(parse_money("1.2.3").is_err());
    }

    #[test]
    fn test_parse_money_rejects_huge_amounts() {
        assert_eq!(
            parse_money("1000000000000000").unwrap(),
            Decimal::from(MAX_AMOUNT)
        );
        assert_eq!(
            parse_money("50000000000000000000000000000"),
            Err(MoneyError::OutOfRange("50000000000000000000000000000".to_string()))
        );
        assert!(matches!(
            parse_money("(1,000,000,000,000,000.01)"),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_day_first_date() {
        let jan_fifth = NaiveDate::from_ymd_opt(2019, 1, 5).unwrap();
        assert_eq!(parse_day_first_date("05/01/19"), Some(jan_fifth));
        assert_eq!(parse_day_first_date("05/01/2019"), Some(jan_fifth));
        assert_eq!(parse_day_first_date("5-1-2019"), Some(jan_fifth));
        assert_eq!(parse_day_first_date("2019-01-05"), Some(jan_fifth));
        assert_eq!(
            parse_day_first_date("13/02/2020"),
            NaiveDate::from_ymd_opt(2020, 2, 13)
        );
    }

    #[test]
    fn test_parse_day_first_date_rejects_garbage() {
        assert_eq!(parse_day_first_date(""), None);
        assert_eq!(parse_day_first_date("not a date"), None);
        assert_eq!(parse_day_first_date("31/02/2020"), None);
        assert_eq!(parse_day_first_date("02/13/2020"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("7"), Ok(7));
        assert_eq!(parse_quantity("7.0"), Ok(7));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("1.5").is_err());
        assert!(parse_quantity("many").is_err());
    }

    #[test]
    fn test_parse_rating_bounds() {
        assert_eq!(parse_rating("9.1"), Ok(Decimal::new(91, 1)));
        assert_eq!(parse_rating("10"), Ok(Decimal::TEN));
        assert!(parse_rating("10.5").is_err());
        assert!(parse_rating("-1").is_err());
    }
}
