//! Month arithmetic for date ranges and recurring payments.

use time::{Date, Month};

/// The number of days in `month` of `year`.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// The first and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let start = date.replace_day(1).unwrap_or(date);
    let end = date
        .replace_day(last_day_of_month(date.year(), date.month()))
        .unwrap_or(date);

    (start, end)
}

/// Move `date` forward by `months`, clamping the day to the end of the
/// target month, e.g. 31 January plus one month is 28 or 29 February.
///
/// Returns `None` if the result is out of the supported range of [Date].
pub fn add_months(date: Date, months: u32) -> Option<Date> {
    let month_index = date.month() as i64 - 1 + months as i64;
    let year = i32::try_from(date.year() as i64 + month_index.div_euclid(12)).ok()?;
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}
