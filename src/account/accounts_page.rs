//! The page for creating, renaming and deleting accounts.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    PageError,
    account::{
        core::{Account, AccountType, list_accounts},
        endpoints::AccountState,
    },
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base, checkbox_input, delete_button, labelled_input, select_input, submit_button,
    },
    navigation::NavBar,
    user::UserId,
};

fn account_type_options() -> Vec<(String, String)> {
    AccountType::ALL
        .iter()
        .map(|account_type| (account_type.as_str().to_owned(), account_type.label().to_owned()))
        .collect()
}

fn create_account_form() -> Markup {
    html! {
        form
            id="create-account-form"
            hx-post=(endpoints::ACCOUNTS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            (labelled_input("Name", "name", "text", None, true))
            (select_input("Type", "type", &account_type_options(), Some(AccountType::Personal.as_str()), true))
            (checkbox_input("Add the default categories", "withDefaultCategories", true))
            (submit_button("Create account"))
        }
    }
}

fn account_row(account: &Account) -> Markup {
    let account_url = format_endpoint(endpoints::ACCOUNT_API, account.id);
    let form_id = format!("edit-account-{}", account.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                input
                    type="text"
                    name="name"
                    form=(form_id)
                    value=(account.name)
                    required
                    aria-label="Account name"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            td class=(TABLE_CELL_STYLE)
            {
                select name="type" form=(form_id) aria-label="Account type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account_type in AccountType::ALL {
                        option
                            value=(account_type.as_str())
                            selected[account_type == account.account_type]
                        {
                            (account_type.label())
                        }
                    }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(account.created_at.date()) { (account.created_at.date()) }
            }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4 items-center"
                {
                    form
                        id=(form_id)
                        hx-put=(account_url)
                        hx-target-error="#alert-container"
                    {
                        button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save" }
                    }

                    (delete_button(
                        &account_url,
                        &format!(
                            "Are you sure you want to delete the account '{}'? \
                            Everything in it will be deleted. This cannot be undone.",
                            account.name
                        ),
                    ))
                }
            }
        }
    }
}

fn accounts_view(accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Accounts" }

                div class="overflow-x-auto"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Created" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (account_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td colspan="4" class="px-6 py-4 text-center"
                                    {
                                        "No accounts yet. Create one below."
                                    }
                                }
                            }
                        }
                    }
                }
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New account" }
                (create_account_form())
            }
        }
    };

    base("Accounts", &[], &content)
}

/// Display the logged in user's accounts.
pub async fn get_accounts_page(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, PageError> {
    let connection = lock_connection(&state.db_connection)?;
    let accounts = list_accounts(user_id, &connection)?;

    Ok(accounts_view(&accounts).into_response())
}
