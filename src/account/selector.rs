//! Picking which account a page shows.
//!
//! Every area page takes an optional `account_id` query parameter and falls
//! back to the user's first account.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error,
    account::core::{Account, AccountId, list_accounts},
    endpoints,
    html::{
        CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        base,
    },
    navigation::NavBar,
    user::UserId,
};

/// The query parameter shared by the pages that show one account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountQuery {
    pub account_id: Option<AccountId>,
}

/// The user's accounts and the one currently shown.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSelection {
    pub accounts: Vec<Account>,
    pub selected: Account,
}

/// Choose the account to show.
///
/// Returns `None` if the user has no accounts yet.
///
/// # Errors
/// Returns [Error::Forbidden] if `requested` is not one of the user's accounts.
pub fn select_account(
    user_id: UserId,
    requested: Option<AccountId>,
    connection: &Connection,
) -> Result<Option<AccountSelection>, Error> {
    let accounts = list_accounts(user_id, connection)?;

    let selected = match requested {
        Some(account_id) => accounts
            .iter()
            .find(|account| account.id == account_id)
            .cloned()
            .ok_or(Error::Forbidden)?,
        None => match accounts.first() {
            Some(account) => account.clone(),
            None => return Ok(None),
        },
    };

    Ok(Some(AccountSelection { accounts, selected }))
}

/// A drop-down that reloads `page_url` with the chosen account.
///
/// `hidden_fields` are submitted along with the account, e.g. to keep the
/// selected period on the dashboard.
pub fn account_selector(
    selection: &AccountSelection,
    page_url: &str,
    hidden_fields: &[(&str, String)],
) -> Markup {
    html! {
        form method="get" action=(page_url) class="flex items-end gap-2"
        {
            @for (name, value) in hidden_fields {
                input type="hidden" name=(name) value=(value);
            }

            div
            {
                label for="account-select" class=(FORM_LABEL_STYLE) { "Account" }

                select
                    id="account-select"
                    name="account_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                    onchange="this.form.requestSubmit()"
                {
                    @for account in &selection.accounts {
                        option
                            value=(account.id)
                            selected[account.id == selection.selected.id]
                        {
                            (account.name)
                        }
                    }
                }
            }

            noscript
            {
                button type="submit" class=(LINK_STYLE) { "Show" }
            }
        }
    }
}

/// Shown instead of a page's content when the user has no accounts.
pub fn no_accounts_view() -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-gray-700 dark:text-gray-300"
            {
                "You don't have any accounts yet. "
                a href=(endpoints::ACCOUNTS_VIEW) class=(LINK_STYLE) { "Create an account" }
                " to start tracking your finances."
            }
        }
    }
}

/// The title of an account page next to the account drop-down.
pub fn account_page_header(
    title: &str,
    selection: &AccountSelection,
    page_url: &str,
    hidden_fields: &[(&str, String)],
) -> Markup {
    html! {
        header class="w-full flex flex-wrap justify-between items-end gap-4"
        {
            h1 class="text-xl font-bold" { (title) }

            (account_selector(selection, page_url, hidden_fields))
        }
    }
}

/// The whole page shown in place of an account page when the user has no accounts.
pub fn no_accounts_page(title: &str, page_url: &str) -> Markup {
    let content = html! {
        (NavBar::new(page_url).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="w-full text-xl font-bold" { (title) }

            (no_accounts_view())
        }
    };

    base(title, &[], &content)
}
