//! Validation helpers shared by procedure inputs.
//!
//! Text lengths are counted in grapheme clusters so that, for example, an
//! emoji counts as a single character.

use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, money::Cents};

/// Trim `value` and check that its length is within `min..=max`.
///
/// # Errors
/// Returns [Error::InvalidInput] naming `field` if the length is out of range.
pub fn text(field: &str, value: &str, min: usize, max: usize) -> Result<String, Error> {
    let value = value.trim();
    let length = value.graphemes(true).count();

    if length == 0 && min > 0 {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }

    if length < min {
        return Err(Error::InvalidInput(format!(
            "{field} must be at least {min} characters"
        )));
    }

    if length > max {
        return Err(Error::InvalidInput(format!(
            "{field} must be at most {max} characters"
        )));
    }

    Ok(value.to_owned())
}

/// Like [text] for optional fields. Blank strings become `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => text(field, value, 0, max).map(Some),
    }
}

/// Check that a money amount is greater than zero.
pub fn positive_amount(field: &str, amount: Cents) -> Result<Cents, Error> {
    if amount > 0 {
        Ok(amount)
    } else {
        Err(Error::InvalidInput(format!("{field} must be greater than zero")))
    }
}

/// Check that a money amount is not negative.
pub fn non_negative_amount(field: &str, amount: Cents) -> Result<Cents, Error> {
    if amount >= 0 {
        Ok(amount)
    } else {
        Err(Error::InvalidInput(format!("{field} cannot be negative")))
    }
}

/// Check that `day` is a valid day of the month (1 to 31).
pub fn day_of_month(field: &str, day: u8) -> Result<u8, Error> {
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(Error::InvalidInput(format!(
            "{field} must be between 1 and 31"
        )))
    }
}

/// Check that the inclusive range `start..=end` is not empty.
pub fn date_range(start: Date, end: Date) -> Result<(), Error> {
    if start <= end {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "The start date {start} must not be after the end date {end}"
        )))
    }
}

#[cfg(test)]
mod validate_tests {
    use time::macros::date;

    use crate::Error;

    use super::{date_range, day_of_month, optional_text, positive_amount, text};

    #[test]
    fn text_is_trimmed() {
        assert_eq!(text("Name", "  Rent  ", 1, 10), Ok("Rent".to_owned()));
    }

    #[test]
    fn text_rejects_empty() {
        assert_eq!(
            text("Name", "   ", 1, 10),
            Err(Error::InvalidInput("Name is required".to_owned()))
        );
    }

    #[test]
    fn text_enforces_bounds() {
        assert_eq!(
            text("Name", "a", 2, 10),
            Err(Error::InvalidInput(
                "Name must be at least 2 characters".to_owned()
            ))
        );
        assert_eq!(
            text("Color", "#123456789", 1, 5),
            Err(Error::InvalidInput(
                "Color must be at most 5 characters".to_owned()
            ))
        );
    }

    #[test]
    fn text_counts_graphemes() {
        assert_eq!(text("Icon", "👍🏽", 1, 1), Ok("👍🏽".to_owned()));
    }

    #[test]
    fn optional_text_treats_blank_as_none() {
        assert_eq!(optional_text("Icon", Some("  "), 5), Ok(None));
        assert_eq!(optional_text("Icon", None, 5), Ok(None));
        assert_eq!(optional_text("Icon", Some("Car"), 5), Ok(Some("Car".to_owned())));
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(positive_amount("Amount", 0).is_err());
        assert!(positive_amount("Amount", -1).is_err());
        assert_eq!(positive_amount("Amount", 1), Ok(1));
    }

    #[test]
    fn days_of_month() {
        assert!(day_of_month("Due day", 0).is_err());
        assert!(day_of_month("Due day", 32).is_err());
        assert_eq!(day_of_month("Due day", 31), Ok(31));
    }

    #[test]
    fn date_ranges() {
        assert!(date_range(date!(2025 - 01 - 01), date!(2025 - 01 - 01)).is_ok());
        assert!(date_range(date!(2025 - 01 - 02), date!(2025 - 01 - 01)).is_err());
    }
}
