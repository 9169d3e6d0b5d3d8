//! Money amounts are stored and transferred as an integer number of cents.
//!
//! JSON clients send amounts as integer cents, while HTML forms send the
//! decimal currency amount the user typed (e.g. "12.34").

use std::fmt;

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};

use crate::Error;

/// An amount of money in cents.
pub type Cents = i64;

/// Parse a decimal currency amount such as "1,234.5" or "$12.30" into cents.
///
/// At most two decimal places are accepted.
///
/// # Errors
/// Returns [Error::InvalidInput] if `text` is not a number with at most two
/// decimal places or does not fit in [Cents].
pub fn parse_currency(text: &str) -> Result<Cents, Error> {
    let invalid = || Error::InvalidInput(format!("\"{text}\" is not a valid amount"));

    let trimmed = text.trim();
    let (is_negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((&unsigned, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    if fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    let cents = whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or_else(invalid)?;

    Ok(if is_negative { -cents } else { cents })
}

/// Format cents as a plain decimal amount for pre-filling form inputs, e.g. "12.30".
pub fn cents_to_decimal_string(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Convert cents to currency units for charts.
pub fn cents_to_f64(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

struct CentsVisitor;

impl Visitor<'_> for CentsVisitor {
    type Value = Cents;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer number of cents or a decimal currency amount")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Cents, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Cents, E> {
        i64::try_from(value).map_err(|_| E::custom("amount is too large"))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Cents, E> {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Ok(value as i64)
        } else {
            Err(E::custom("amounts must be a whole number of cents"))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Cents, E> {
        parse_currency(value).map_err(E::custom)
    }
}

/// Deserialize an amount from integer cents or a decimal currency string.
pub fn deserialize_cents<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CentsVisitor)
}

/// Like [deserialize_cents] for optional fields; pair with `#[serde(default)]`.
pub fn deserialize_optional_cents<'de, D>(deserializer: D) -> Result<Option<Cents>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Amount(#[serde(deserialize_with = "deserialize_cents")] Cents);

    Option::<Amount>::deserialize(deserializer).map(|amount| amount.map(|Amount(cents)| cents))
}

#[cfg(test)]
mod parse_currency_tests {
    use crate::Error;

    use super::{cents_to_decimal_string, parse_currency};

    #[test]
    fn parses_whole_and_decimal_amounts() {
        assert_eq!(parse_currency("12"), Ok(1200));
        assert_eq!(parse_currency("12.3"), Ok(1230));
        assert_eq!(parse_currency("12.34"), Ok(1234));
        assert_eq!(parse_currency(".5"), Ok(50));
        assert_eq!(parse_currency("$1,234.56"), Ok(123456));
        assert_eq!(parse_currency("-4.20"), Ok(-420));
    }

    #[test]
    fn rejects_fractions_of_cents() {
        assert!(matches!(
            parse_currency("1.234"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        for text in ["", "abc", "1.2.3", "$", "12e3", "."] {
            assert!(
                matches!(parse_currency(text), Err(Error::InvalidInput(_))),
                "want error for {text:?}"
            );
        }
    }

    #[test]
    fn formats_for_inputs() {
        assert_eq!(cents_to_decimal_string(1230), "12.30");
        assert_eq!(cents_to_decimal_string(5), "0.05");
        assert_eq!(cents_to_decimal_string(-150), "-1.50");
    }
}
