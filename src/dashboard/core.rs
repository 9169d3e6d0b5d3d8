//! Totals over an account's paid transactions.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    account::AccountId,
    calendar::month_bounds,
    category::CategoryId,
    db::text_enum,
    money::Cents,
    transaction::{TransactionStatus, TransactionType},
};

/// The name and colour used for expenses without a category.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";
pub const UNCATEGORIZED_COLOR: &str = "#888888";

/// Income and expenses over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub income: Cents,
    pub expense: Cents,
    /// Income minus expenses.
    pub balance: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExpense {
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    pub category_color: String,
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    pub income: Cents,
    pub expense: Cents,
}

pub fn summary(
    account_id: AccountId,
    start_date: Date,
    end_date: Date,
    connection: &Connection,
) -> Result<Summary, Error> {
    let (income, expense): (Cents, Cents) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = ?4 THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN type = ?5 THEN amount ELSE 0 END), 0)
        FROM \"transaction\"
        WHERE account_id = ?1
            AND status = ?6
            AND transaction_date BETWEEN ?2 AND ?3",
        params![
            account_id,
            start_date,
            end_date,
            TransactionType::Income,
            TransactionType::Expense,
            TransactionStatus::Paid,
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(Summary {
        income,
        expense,
        balance: income - expense,
    })
}

/// Paid expenses grouped by category, largest total first.
pub fn expenses_by_category(
    account_id: AccountId,
    start_date: Date,
    end_date: Date,
    connection: &Connection,
) -> Result<Vec<CategoryExpense>, Error> {
    connection
        .prepare(
            "SELECT t.category_id, category.name, category.color, SUM(t.amount) AS total
            FROM \"transaction\" AS t
            LEFT JOIN category ON t.category_id = category.id
            WHERE t.account_id = ?1
                AND t.type = ?4
                AND t.status = ?5
                AND t.transaction_date BETWEEN ?2 AND ?3
            GROUP BY t.category_id
            ORDER BY total DESC, t.category_id ASC",
        )?
        .query_map(
            params![
                account_id,
                start_date,
                end_date,
                TransactionType::Expense,
                TransactionStatus::Paid,
            ],
            |row| {
                let name: Option<String> = row.get(1)?;
                let color: Option<String> = row.get(2)?;

                Ok(CategoryExpense {
                    category_id: row.get(0)?,
                    category_name: name.unwrap_or_else(|| UNCATEGORIZED_NAME.to_owned()),
                    category_color: color.unwrap_or_else(|| UNCATEGORIZED_COLOR.to_owned()),
                    total: row.get(3)?,
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// Paid income and expenses per calendar month, oldest month first.
pub fn monthly_totals(
    account_id: AccountId,
    start_date: Date,
    end_date: Date,
    connection: &Connection,
) -> Result<Vec<MonthlyTotal>, Error> {
    connection
        .prepare(
            "SELECT
                substr(transaction_date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN type = ?4 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = ?5 THEN amount ELSE 0 END), 0)
            FROM \"transaction\"
            WHERE account_id = ?1
                AND status = ?6
                AND transaction_date BETWEEN ?2 AND ?3
            GROUP BY month
            ORDER BY month ASC",
        )?
        .query_map(
            params![
                account_id,
                start_date,
                end_date,
                TransactionType::Income,
                TransactionType::Expense,
                TransactionStatus::Paid,
            ],
            |row| {
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    income: row.get(1)?,
                    expense: row.get(2)?,
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// The date ranges the dashboard and reports pages offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Period {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[default]
    #[serde(rename = "current_month")]
    CurrentMonth,
    #[serde(rename = "custom")]
    Custom,
}

text_enum!(Period {
    Today => "today",
    Last7Days => "last_7_days",
    CurrentMonth => "current_month",
    Custom => "custom",
});

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Today,
        Period::Last7Days,
        Period::CurrentMonth,
        Period::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Last7Days => "Last 7 days",
            Period::CurrentMonth => "This month",
            Period::Custom => "Custom",
        }
    }

    /// The inclusive date range the period covers as of `today`.
    ///
    /// A custom period without both bounds, or with the bounds the wrong way
    /// around, covers the current month.
    pub fn date_range(
        &self,
        today: Date,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> (Date, Date) {
        match self {
            Period::Today => (today, today),
            Period::Last7Days => (
                today.checked_sub(Duration::days(7)).unwrap_or(today),
                today,
            ),
            Period::CurrentMonth => month_bounds(today),
            Period::Custom => match (start_date, end_date) {
                (Some(start), Some(end)) if start <= end => (start, end),
                _ => month_bounds(today),
            },
        }
    }
}


#[cfg(test)]
mod period_tests {
    use time::macros::date;

    use super::Period;

    #[test]
    fn presets() {
        let today = date!(2025 - 02 - 14);

        assert_eq!(Period::Today.date_range(today, None, None), (today, today));
        assert_eq!(
            Period::Last7Days.date_range(today, None, None),
            (date!(2025 - 02 - 07), today)
        );
        assert_eq!(
            Period::CurrentMonth.date_range(today, None, None),
            (date!(2025 - 02 - 01), date!(2025 - 02 - 28))
        );
        assert_eq!(Period::default(), Period::CurrentMonth);
    }

    #[test]
    fn custom_falls_back_to_current_month() {
        let today = date!(2025 - 02 - 14);
        let start = date!(2025 - 01 - 01);
        let end = date!(2025 - 01 - 31);

        assert_eq!(Period::Custom.date_range(today, Some(start), Some(end)), (start, end));
        assert_eq!(
            Period::Custom.date_range(today, Some(start), None),
            (date!(2025 - 02 - 01), date!(2025 - 02 - 28))
        );
        assert_eq!(
            Period::Custom.date_range(today, Some(end), Some(start)),
            (date!(2025 - 02 - 01), date!(2025 - 02 - 28))
        );
    }
}
