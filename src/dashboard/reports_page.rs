//! Monthly income and expense totals over a period.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    PageError,
    account::{AccountSelection, account_page_header, no_accounts_page, select_account},
    dashboard::{
        charts::{chart_container, charts_script, expenses_by_category_chart, monthly_totals_chart},
        core::{
            CategoryExpense, MonthlyTotal, Summary, expenses_by_category, monthly_totals, summary,
        },
        dashboard_page::category_table,
        endpoints::DashboardState,
        period::{PeriodQuery, period_form, summary_cards},
    },
    db::lock_connection,
    endpoints,
    html::{
        CARD_STYLE, ECHARTS_SCRIPT_URL, HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency,
    },
    navigation::NavBar,
    rpc::Params,
    timezone::local_today,
    user::UserId,
};

fn monthly_table(totals: &[MonthlyTotal]) -> Markup {
    html! {
        @if totals.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No paid transactions in this period." }
        } @else {
            div class="overflow-x-auto"
            {
                table id="monthly-table" class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Income" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Expenses" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Net" }
                        }
                    }

                    tbody
                    {
                        @for total in totals {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (total.month) }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(total.income)) }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(total.expense)) }
                                td class={ (TABLE_CELL_STYLE) " text-right" }
                                {
                                    (format_currency(total.income - total.expense))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

struct ReportData {
    summary: Summary,
    monthly_totals: Vec<MonthlyTotal>,
    expenses: Vec<CategoryExpense>,
}

fn reports_view(
    selection: &AccountSelection,
    query: &PeriodQuery,
    range: (Date, Date),
    data: &ReportData,
) -> Markup {
    let monthly_chart = monthly_totals_chart(&data.monthly_totals);
    let category_chart = expenses_by_category_chart(&data.expenses);

    let content = html! {
        (NavBar::new(endpoints::REPORTS_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header(
                "Reports",
                selection,
                endpoints::REPORTS_VIEW,
                &query.hidden_fields(),
            ))

            (period_form(endpoints::REPORTS_VIEW, selection.selected.id, query, range))

            (summary_cards(&data.summary))

            section class=(CARD_STYLE)
            {
                @if !data.monthly_totals.is_empty() {
                    (chart_container(&monthly_chart))
                }
                (monthly_table(&data.monthly_totals))
            }

            section class=(CARD_STYLE)
            {
                @if !data.expenses.is_empty() {
                    (chart_container(&category_chart))
                }
                (category_table(&data.expenses))
            }
        }
    };

    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(&[monthly_chart, category_chart]),
    ];

    base("Reports", &head_elements, &content)
}

pub async fn get_reports_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<PeriodQuery>,
) -> Result<Response, PageError> {
    let (start_date, end_date) = query.date_range(local_today(&state.local_timezone)?);
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Reports", endpoints::REPORTS_VIEW).into_response());
    };
    let account_id = selection.selected.id;

    let data = ReportData {
        summary: summary(account_id, start_date, end_date, &connection)?,
        monthly_totals: monthly_totals(account_id, start_date, end_date, &connection)?,
        expenses: expenses_by_category(account_id, start_date, end_date, &connection)?,
    };

    Ok(reports_view(&selection, &query, (start_date, end_date), &data).into_response())
}
