//! The page listing an account's transactions, with forms for recording,
//! editing and attaching receipts to them.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error, PageError,
    account::{AccountId, AccountSelection, account_page_header, no_accounts_page, select_account},
    attachment::{Attachment, list_attachments},
    category::{Category, CategoryId, list_categories},
    credit_card::{CreditCard, list_credit_cards},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, amount_input, base, checkbox_input,
        color_swatch, delete_button, dollar_input_styles, format_currency, labelled_input,
        select_input, submit_button,
    },
    navigation::NavBar,
    rpc::Params,
    timezone::local_today,
    transaction::{
        core::{
            ExpenseType, TransactionFilter, TransactionStatus, TransactionType,
            TransactionWithRelations, list_transactions,
        },
        endpoints::TransactionState,
    },
    user::UserId,
};

/// The query string of the transactions page: the account and the filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsPageQuery {
    pub account_id: Option<AccountId>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category_id: Option<CategoryId>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl TransactionsPageQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            category_id: self.category_id,
            transaction_type: self.transaction_type,
            status: self.status,
            payment_method: None,
        }
    }

    /// The filter as hidden fields so that switching accounts keeps it.
    fn hidden_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();

        if let Some(start_date) = self.start_date {
            fields.push(("start_date", start_date.to_string()));
        }
        if let Some(end_date) = self.end_date {
            fields.push(("end_date", end_date.to_string()));
        }
        if let Some(transaction_type) = self.transaction_type {
            fields.push(("type", transaction_type.as_str().to_owned()));
        }
        if let Some(status) = self.status {
            fields.push(("status", status.as_str().to_owned()));
        }

        fields
    }
}

fn category_options(categories: &[Category]) -> Vec<(String, String)> {
    categories
        .iter()
        .map(|category| {
            let label = match &category.icon {
                Some(icon) => format!("{icon} {} ({})", category.name, category.kind.label()),
                None => format!("{} ({})", category.name, category.kind.label()),
            };
            (category.id.to_string(), label)
        })
        .collect()
}

fn credit_card_options(credit_cards: &[CreditCard]) -> Vec<(String, String)> {
    credit_cards
        .iter()
        .map(|card| {
            (
                card.id.to_string(),
                format!("{} •••• {}", card.name, card.last_four_digits),
            )
        })
        .collect()
}

fn type_options() -> Vec<(String, String)> {
    [TransactionType::Expense, TransactionType::Income]
        .iter()
        .map(|transaction_type| {
            (
                transaction_type.as_str().to_owned(),
                transaction_type.label().to_owned(),
            )
        })
        .collect()
}

fn status_options() -> Vec<(String, String)> {
    [TransactionStatus::Paid, TransactionStatus::Pending]
        .iter()
        .map(|status| (status.as_str().to_owned(), status.label().to_owned()))
        .collect()
}

fn expense_type_options() -> Vec<(String, String)> {
    [ExpenseType::Fixed, ExpenseType::Variable]
        .iter()
        .map(|expense_type| {
            (
                expense_type.as_str().to_owned(),
                expense_type.label().to_owned(),
            )
        })
        .collect()
}

/// Everything the transaction forms offer to choose from.
struct FormOptions {
    categories: Vec<(String, String)>,
    credit_cards: Vec<(String, String)>,
}

fn filter_form(
    account_id: AccountId,
    query: &TransactionsPageQuery,
    options: &FormOptions,
) -> Markup {
    let start_date = query.start_date.map(|date| date.to_string());
    let end_date = query.end_date.map(|date| date.to_string());
    let category_id = query.category_id.map(|id| id.to_string());

    html! {
        form
            id="filter-form"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="w-full grid gap-4 sm:grid-cols-2 lg:grid-cols-6 items-end"
        {
            input type="hidden" name="account_id" value=(account_id);

            (labelled_input("From", "start_date", "date", start_date.as_deref(), false))
            (labelled_input("To", "end_date", "date", end_date.as_deref(), false))
            (select_input("Category", "category_id", &options.categories, category_id.as_deref(), false))
            (select_input("Type", "type", &type_options(), query.transaction_type.map(|t| t.as_str()), false))
            (select_input("Status", "status", &status_options(), query.status.map(|s| s.as_str()), false))

            div class="flex gap-4 items-center"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
                a
                    href={ (endpoints::TRANSACTIONS_VIEW) "?account_id=" (account_id) }
                    class=(LINK_STYLE)
                {
                    "Clear"
                }
            }
        }
    }
}

fn create_transaction_form(account_id: AccountId, today: Date, options: &FormOptions) -> Markup {
    html! {
        form
            id="create-transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            input type="hidden" name="accountId" value=(account_id);

            (labelled_input("Description", "description", "text", None, true))
            (amount_input("Amount", "amount", None, true))
            (select_input("Type", "type", &type_options(), Some(TransactionType::Expense.as_str()), true))
            (labelled_input("Date", "transactionDate", "date", Some(&today.to_string()), true))
            (select_input("Category", "categoryId", &options.categories, None, true))
            (select_input("Credit card", "creditCardId", &options.credit_cards, None, false))
            (labelled_input("Payment method", "paymentMethod", "text", None, false))
            (select_input("Status", "status", &status_options(), Some(TransactionStatus::Paid.as_str()), true))
            (select_input("Expense type", "expenseType", &expense_type_options(), None, false))
            (checkbox_input("Recurring", "isRecurring", false))
            (submit_button("Add transaction"))
        }
    }
}

fn edit_transaction_form(row: &TransactionWithRelations, options: &FormOptions) -> Markup {
    let transaction = &row.transaction;
    let transaction_url = format_endpoint(endpoints::TRANSACTION_API, transaction.id);
    let category_id = transaction.category_id.map(|id| id.to_string());
    let credit_card_id = transaction.credit_card_id.map(|id| id.to_string());

    html! {
        form
            id={ "edit-transaction-" (transaction.id) }
            hx-put=(transaction_url)
            hx-target-error="#alert-container"
            class="grid gap-4 sm:grid-cols-2"
        {
            (labelled_input("Description", "description", "text", Some(&transaction.description), true))
            (amount_input("Amount", "amount", Some(transaction.amount), true))
            (select_input("Type", "type", &type_options(), Some(transaction.transaction_type.as_str()), true))
            (labelled_input("Date", "transactionDate", "date", Some(&transaction.transaction_date.to_string()), true))
            (select_input("Category", "categoryId", &options.categories, category_id.as_deref(), false))
            (select_input("Credit card", "creditCardId", &options.credit_cards, credit_card_id.as_deref(), false))
            (labelled_input("Payment method", "paymentMethod", "text", transaction.payment_method.as_deref(), false))
            (select_input("Status", "status", &status_options(), Some(transaction.status.as_str()), true))
            (select_input("Expense type", "expenseType", &expense_type_options(), transaction.expense_type.map(|t| t.as_str()), false))

            div class="flex items-end"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save changes" }
            }
        }
    }
}

fn attachments_section(row: &TransactionWithRelations, attachments: &[Attachment]) -> Markup {
    let transaction_id = row.transaction.id;

    html! {
        div class="mt-4 space-y-2"
        {
            h3 class="font-semibold" { "Attachments" }

            @if attachments.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No attachments." }
            } @else {
                ul class="space-y-1"
                {
                    @for attachment in attachments {
                        @let attachment_url = format_endpoint(endpoints::ATTACHMENT_API, attachment.id);

                        li class="flex gap-4 items-center"
                        {
                            a href=(attachment_url) class=(LINK_STYLE) { (attachment.file_name) }
                            span class="text-xs text-gray-500" { (attachment.file_size / 1024) " KB" }
                            (delete_button(
                                &attachment_url,
                                &format!("Delete the attachment '{}'?", attachment.file_name),
                            ))
                        }
                    }
                }
            }

            form
                id={ "upload-attachment-" (transaction_id) }
                hx-post=(format_endpoint(endpoints::TRANSACTION_ATTACHMENTS_API, transaction_id))
                hx-encoding="multipart/form-data"
                hx-target-error="#alert-container"
                class="flex flex-wrap gap-2 items-center"
            {
                label for={ "file-" (transaction_id) } class=(FORM_LABEL_STYLE) { "Attach a file" }
                input type="file" name="file" id={ "file-" (transaction_id) } required;
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Upload" }
            }
        }
    }
}

fn transaction_row(
    row: &TransactionWithRelations,
    attachments: &[Attachment],
    options: &FormOptions,
) -> Markup {
    let transaction = &row.transaction;
    let (sign, amount_style) = match transaction.transaction_type {
        TransactionType::Income => ("+", "text-green-600 dark:text-green-400"),
        TransactionType::Expense => ("-", "text-red-600 dark:text-red-400"),
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.transaction_date) { (transaction.transaction_date) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.description)
                @if transaction.is_recurring {
                    " "
                    span class=(BADGE_STYLE) { "Recurring" }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @match &row.category_name {
                    Some(name) => {
                        (color_swatch(row.category_color.as_deref()))
                        (name)
                    }
                    None => {
                        span class="text-gray-500" { "Uncategorized" }
                    }
                }
            }
            td class=(TABLE_CELL_STYLE) { (row.credit_card_name.as_deref().unwrap_or("")) }
            td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (transaction.status.label()) } }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style) }
            {
                (sign) (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4 items-start"
                {
                    details
                    {
                        summary class={ (LINK_STYLE) " cursor-pointer" } { "Edit" }

                        div class="mt-4 p-4 min-w-80 rounded-lg bg-gray-50 dark:bg-gray-900"
                        {
                            (edit_transaction_form(row, options))
                            (attachments_section(row, attachments))
                        }
                    }

                    (delete_button(
                        &format_endpoint(endpoints::TRANSACTION_API, transaction.id),
                        &format!(
                            "Delete the transaction '{}'? Its attachments will be deleted too.",
                            transaction.description
                        ),
                    ))
                }
            }
        }
    }
}

fn transactions_table(
    rows: &[(TransactionWithRelations, Vec<Attachment>)],
    options: &FormOptions,
) -> Markup {
    html! {
        @if rows.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No transactions found." }
        } @else {
            div class="w-full overflow-x-auto"
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Card" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for (row, attachments) in rows {
                            (transaction_row(row, attachments, options))
                        }
                    }
                }
            }
        }
    }
}

fn transactions_view(
    selection: &AccountSelection,
    query: &TransactionsPageQuery,
    rows: &[(TransactionWithRelations, Vec<Attachment>)],
    options: &FormOptions,
    today: Date,
) -> Markup {
    let account_id = selection.selected.id;

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header(
                "Transactions",
                selection,
                endpoints::TRANSACTIONS_VIEW,
                &query.hidden_fields(),
            ))

            section class=(CARD_STYLE)
            {
                (filter_form(account_id, query, options))
            }

            section class=(CARD_STYLE)
            {
                (transactions_table(rows, options))
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New transaction" }
                (create_transaction_form(account_id, today, options))
            }
        }
    };

    base("Transactions", &[dollar_input_styles()], &content)
}

fn load_rows(
    account_id: AccountId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<(TransactionWithRelations, Vec<Attachment>)>, Error> {
    list_transactions(account_id, filter, connection)?
        .into_iter()
        .map(|row| {
            let attachments = list_attachments(row.transaction.id, connection)?;
            Ok((row, attachments))
        })
        .collect()
}

pub async fn get_transactions_page(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<TransactionsPageQuery>,
) -> Result<Response, PageError> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Transactions", endpoints::TRANSACTIONS_VIEW).into_response());
    };
    let account_id = selection.selected.id;

    let options = FormOptions {
        categories: category_options(&list_categories(account_id, &connection)?),
        credit_cards: credit_card_options(&list_credit_cards(account_id, &connection)?),
    };
    let rows = load_rows(account_id, &query.filter(), &connection)?;

    Ok(transactions_view(&selection, &query, &rows, &options, today).into_response())
}
