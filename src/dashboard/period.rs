//! The period picker shared by the dashboard and reports pages.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    account::AccountId,
    dashboard::core::{Period, Summary},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        format_currency,
    },
};

/// The query parameters of the dashboard and reports pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl PeriodQuery {
    pub fn date_range(&self, today: Date) -> (Date, Date) {
        self.period.date_range(today, self.start_date, self.end_date)
    }

    /// The period fields to carry over when switching accounts.
    pub fn hidden_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("period", self.period.as_str().to_owned())];

        if let Some(start_date) = self.start_date {
            fields.push(("start_date", start_date.to_string()));
        }
        if let Some(end_date) = self.end_date {
            fields.push(("end_date", end_date.to_string()));
        }

        fields
    }
}

/// A form that reloads `page_url` with the chosen period.
pub fn period_form(
    page_url: &str,
    account_id: AccountId,
    query: &PeriodQuery,
    (start_date, end_date): (Date, Date),
) -> Markup {
    html! {
        form
            id="period-form"
            method="get"
            action=(page_url)
            class="w-full flex flex-wrap items-end gap-4"
        {
            input type="hidden" name="account_id" value=(account_id);

            div
            {
                label for="period-select" class=(FORM_LABEL_STYLE) { "Period" }

                select id="period-select" name="period" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for period in Period::ALL {
                        option value=(period.as_str()) selected[period == query.period]
                        {
                            (period.label())
                        }
                    }
                }
            }

            div
            {
                label for="start-date-input" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="start-date-input"
                    name="start_date"
                    value=(start_date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end-date-input" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="end-date-input"
                    name="end_date"
                    value=(end_date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Apply" }
        }
    }
}

fn summary_card(title: &str, amount: String, color: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class={ "text-2xl font-bold " (color) } { (amount) }
        }
    }
}

/// Income, expenses and balance side by side.
pub fn summary_cards(summary: &Summary) -> Markup {
    let balance_color = if summary.balance < 0 {
        "text-red-600"
    } else {
        "text-green-600"
    };

    html! {
        section id="summary" class="w-full grid gap-4 md:grid-cols-3"
        {
            (summary_card("Balance", format_currency(summary.balance), balance_color))
            (summary_card("Income", format_currency(summary.income), "text-green-600"))
            (summary_card("Expenses", format_currency(summary.expense), "text-red-600"))
        }
    }
}
