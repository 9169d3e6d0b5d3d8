//! The landing page: a summary of the selected account over a period.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    PageError,
    account::{AccountId, AccountSelection, account_page_header, no_accounts_page, select_account},
    dashboard::{
        charts::{DashboardChart, chart_container, charts_script, expenses_by_category_chart},
        core::{CategoryExpense, Summary, expenses_by_category, summary},
        endpoints::DashboardState,
        period::{PeriodQuery, period_form, summary_cards},
    },
    db::lock_connection,
    endpoints::{self, with_account},
    html::{
        CARD_STYLE, ECHARTS_SCRIPT_URL, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, color_swatch,
        format_currency,
    },
    money::Cents,
    navigation::NavBar,
    rpc::Params,
    scheduled_payment::{ScheduledPayment, list_upcoming_payments},
    timezone::local_today,
    user::UserId,
};

/// How many upcoming payments the dashboard lists.
const UPCOMING_PAYMENTS_LIMIT: usize = 5;

fn share_percent(part: Cents, total: Cents) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Expenses per category with each category's share of the total.
pub(super) fn category_table(expenses: &[CategoryExpense]) -> Markup {
    let total: i64 = expenses.iter().map(|expense| expense.total).sum();

    html! {
        @if expenses.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No expenses in this period." }
        } @else {
            div class="overflow-x-auto"
            {
                table id="category-table" class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Total" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Share" }
                        }
                    }

                    tbody
                    {
                        @for expense in expenses {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (color_swatch(Some(&expense.category_color)))
                                    (expense.category_name)
                                }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(expense.total)) }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format!("{:.1}%", share_percent(expense.total, total))) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn upcoming_payments_view(payments: &[ScheduledPayment], account_id: AccountId) -> Markup {
    html! {
        section id="upcoming-payments" class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h2 class="text-lg font-semibold" { "Upcoming payments" }
                a href=(with_account(endpoints::SCHEDULE_VIEW, account_id)) class=(LINK_STYLE)
                {
                    "View schedule"
                }
            }

            @if payments.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "Nothing due." }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for payment in payments {
                        li class="flex justify-between py-2"
                        {
                            span
                            {
                                time datetime=(payment.due_date) { (payment.due_date) }
                                " "
                                (payment.description)
                            }
                            span { (format_currency(payment.amount)) }
                        }
                    }
                }
            }
        }
    }
}

struct DashboardData {
    summary: Summary,
    expenses: Vec<CategoryExpense>,
    upcoming_payments: Vec<ScheduledPayment>,
}

fn dashboard_view(
    selection: &AccountSelection,
    query: &PeriodQuery,
    range: (Date, Date),
    data: &DashboardData,
) -> Markup {
    let account_id = selection.selected.id;
    let chart: DashboardChart = expenses_by_category_chart(&data.expenses);

    let content = html! {
        (NavBar::new(endpoints::DASHBOARD_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header(
                "Dashboard",
                selection,
                endpoints::DASHBOARD_VIEW,
                &query.hidden_fields(),
            ))

            (period_form(endpoints::DASHBOARD_VIEW, account_id, query, range))

            (summary_cards(&data.summary))

            section class="w-full grid gap-6 xl:grid-cols-2"
            {
                div class=(CARD_STYLE)
                {
                    @if !data.expenses.is_empty() {
                        (chart_container(&chart))
                    }
                    (category_table(&data.expenses))
                }

                (upcoming_payments_view(&data.upcoming_payments, account_id))
            }
        }
    };

    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(&[chart]),
    ];

    base("Dashboard", &head_elements, &content)
}

pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<PeriodQuery>,
) -> Result<Response, PageError> {
    let today = local_today(&state.local_timezone)?;
    let (start_date, end_date) = query.date_range(today);
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Dashboard", endpoints::DASHBOARD_VIEW).into_response());
    };
    let account_id = selection.selected.id;

    let data = DashboardData {
        summary: summary(account_id, start_date, end_date, &connection)?,
        expenses: expenses_by_category(account_id, start_date, end_date, &connection)?,
        upcoming_payments: list_upcoming_payments(
            account_id,
            today,
            UPCOMING_PAYMENTS_LIMIT,
            &connection,
        )?,
    };

    Ok(dashboard_view(&selection, &query, (start_date, end_date), &data).into_response())
}
