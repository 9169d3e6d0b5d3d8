//! The page for managing an account's credit cards.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error, PageError,
    account::{
        AccountId, AccountQuery, AccountSelection, account_page_header, no_accounts_page,
        select_account,
    },
    calendar::month_bounds,
    credit_card::{
        core::{CreditCard, list_credit_cards},
        endpoints::CreditCardState,
    },
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, amount_input, base, currency_rounded_with_tooltip, delete_button,
        dollar_input_styles, format_currency, labelled_input, submit_button,
    },
    money::Cents,
    navigation::NavBar,
    rpc::Params,
    timezone::local_today,
    transaction::list_credit_card_transactions,
    user::UserId,
};

/// A card and what has been charged to it this month.
struct CardSummary {
    card: CreditCard,
    month_total: Cents,
}

fn create_credit_card_form(account_id: AccountId) -> Markup {
    html! {
        form
            id="create-credit-card-form"
            hx-post=(endpoints::CREDIT_CARDS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            input type="hidden" name="accountId" value=(account_id);

            (labelled_input("Name", "name", "text", None, true))
            (labelled_input("Last four digits", "lastFourDigits", "text", None, true))
            (labelled_input("Brand", "brand", "text", Some("Visa"), true))
            (labelled_input("Color", "color", "color", Some("#1e40af"), true))
            (amount_input("Credit limit", "creditLimit", None, true))
            (labelled_input("Closing day", "closingDay", "number", None, true))
            (labelled_input("Due day", "dueDay", "number", None, true))
            (submit_button("Add credit card"))
        }
    }
}

fn edit_credit_card_form(card: &CreditCard) -> Markup {
    html! {
        form
            id={ "edit-credit-card-" (card.id) }
            hx-put=(format_endpoint(endpoints::CREDIT_CARD_API, card.id))
            hx-target-error="#alert-container"
            class="grid gap-4 sm:grid-cols-2 mt-4"
        {
            (labelled_input("Name", "name", "text", Some(&card.name), true))
            (labelled_input("Last four digits", "lastFourDigits", "text", Some(&card.last_four_digits), true))
            (labelled_input("Brand", "brand", "text", Some(&card.brand), true))
            (labelled_input("Color", "color", "color", Some(&card.color), true))
            (amount_input("Credit limit", "creditLimit", Some(card.credit_limit), true))
            (labelled_input("Closing day", "closingDay", "number", Some(&card.closing_day.to_string()), true))
            (labelled_input("Due day", "dueDay", "number", Some(&card.due_day.to_string()), true))

            div class="flex items-end"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save changes" }
            }
        }
    }
}

fn credit_card_item(summary: &CardSummary) -> Markup {
    let card = &summary.card;
    let available = card.credit_limit - summary.month_total;
    let used_percent = if card.credit_limit > 0 {
        (summary.month_total as f64 / card.credit_limit as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    html! {
        article class=(CARD_STYLE)
        {
            div
                class="rounded-lg p-4 text-white"
                style={ "background-color: " (card.color) ";" }
            {
                p class="text-sm opacity-80" { (card.brand) }
                p class="text-lg font-semibold" { (card.name) }
                p class="font-mono tracking-widest" { "•••• " (card.last_four_digits) }
            }

            dl class="grid grid-cols-2 gap-2 mt-4 text-sm"
            {
                dt { "Limit" }
                dd class="text-right" { (currency_rounded_with_tooltip(card.credit_limit)) }
                dt { "Charged this month" }
                dd class="text-right" { (format_currency(summary.month_total)) }
                dt { "Available" }
                dd class="text-right" { (format_currency(available)) }
                dt { "Closes / due" }
                dd class="text-right" { "Day " (card.closing_day) " / day " (card.due_day) }
            }

            div class="w-full h-2 mt-2 bg-gray-200 rounded-full dark:bg-gray-700"
            {
                div
                    class="h-2 bg-blue-600 rounded-full"
                    style={ "width: " (format!("{used_percent:.0}")) "%;" }
                {}
            }

            div class="flex gap-4 items-start mt-4"
            {
                details class="flex-1"
                {
                    summary class={ (LINK_STYLE) " cursor-pointer" } { "Edit" }
                    (edit_credit_card_form(card))
                }

                (delete_button(
                    &format_endpoint(endpoints::CREDIT_CARD_API, card.id),
                    &format!(
                        "Delete the card '{}'? Its transactions will be kept without a card.",
                        card.name
                    ),
                ))
            }
        }
    }
}

fn credit_cards_view(selection: &AccountSelection, cards: &[CardSummary]) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::CREDIT_CARDS_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header("Credit cards", selection, endpoints::CREDIT_CARDS_VIEW, &[]))

            @if cards.is_empty() {
                p class="w-full text-gray-500 dark:text-gray-400" { "No credit cards yet." }
            } @else {
                div class="w-full grid gap-6 md:grid-cols-2 lg:grid-cols-3"
                {
                    @for summary in cards {
                        (credit_card_item(summary))
                    }
                }
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New credit card" }
                (create_credit_card_form(selection.selected.id))
            }
        }
    };

    base("Credit cards", &[dollar_input_styles()], &content)
}

pub async fn get_credit_cards_page(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<AccountQuery>,
) -> Result<Response, PageError> {
    let (month_start, month_end) = month_bounds(local_today(&state.local_timezone)?);
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Credit cards", endpoints::CREDIT_CARDS_VIEW).into_response());
    };

    let cards = list_credit_cards(selection.selected.id, &connection)?
        .into_iter()
        .map(|card| {
            let month_total =
                list_credit_card_transactions(card.id, month_start, month_end, &connection)?
                    .iter()
                    .map(|transaction| transaction.amount)
                    .sum();
            Ok(CardSummary { card, month_total })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(credit_cards_view(&selection, &cards).into_response())
}
