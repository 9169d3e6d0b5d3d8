//! The page listing an account's scheduled payments.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    PageError,
    account::{
        AccountId, AccountQuery, AccountSelection, account_page_header, no_accounts_page,
        select_account,
    },
    category::{Category, CategoryId, list_categories},
    credit_card::list_credit_cards,
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        amount_input, base, checkbox_input, color_swatch, delete_button, dollar_input_styles,
        format_currency, labelled_input, select_input, submit_button,
    },
    navigation::NavBar,
    rpc::Params,
    scheduled_payment::{
        core::{RecurrenceFrequency, ScheduledPayment, list_scheduled_payments},
        endpoints::ScheduledPaymentState,
    },
    timezone::local_today,
    user::UserId,
};

fn frequency_options() -> Vec<(String, String)> {
    RecurrenceFrequency::ALL
        .iter()
        .map(|frequency| (frequency.as_str().to_owned(), frequency.label().to_owned()))
        .collect()
}

fn create_payment_form(
    account_id: AccountId,
    today: Date,
    categories: &[(String, String)],
    credit_cards: &[(String, String)],
) -> Markup {
    html! {
        form
            id="create-scheduled-payment-form"
            hx-post=(endpoints::SCHEDULED_PAYMENTS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            input type="hidden" name="accountId" value=(account_id);

            (labelled_input("Description", "description", "text", None, true))
            (amount_input("Amount", "amount", None, true))
            (labelled_input("Due date", "dueDate", "date", Some(&today.to_string()), true))
            (select_input("Category", "categoryId", categories, None, true))
            (select_input("Credit card", "creditCardId", credit_cards, None, false))
            (checkbox_input("Repeats", "isRecurring", false))
            (select_input(
                "Repeats every",
                "recurrenceFrequency",
                &frequency_options(),
                Some(RecurrenceFrequency::Monthly.as_str()),
                false,
            ))
            (checkbox_input("Priority", "isPriority", false))
            (submit_button("Schedule payment"))
        }
    }
}

fn edit_payment_form(payment: &ScheduledPayment) -> Markup {
    html! {
        form
            id={ "edit-scheduled-payment-" (payment.id) }
            hx-put=(format_endpoint(endpoints::SCHEDULED_PAYMENT_API, payment.id))
            hx-target-error="#alert-container"
            class="grid gap-4 mt-4"
        {
            (labelled_input("Description", "description", "text", Some(&payment.description), true))
            (amount_input("Amount", "amount", Some(payment.amount), true))
            (labelled_input("Due date", "dueDate", "date", Some(&payment.due_date.to_string()), true))

            div
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save changes" }
            }
        }
    }
}

fn payment_row(
    payment: &ScheduledPayment,
    categories: &HashMap<CategoryId, &Category>,
    today: Date,
) -> Markup {
    let is_overdue = !payment.is_paid && payment.due_date < today;
    let category = payment
        .category_id
        .and_then(|category_id| categories.get(&category_id));
    let due_style = if is_overdue {
        "text-red-600 font-semibold"
    } else {
        ""
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class={ (TABLE_CELL_STYLE) " " (due_style) }
            {
                time datetime=(payment.due_date) { (payment.due_date) }
                @if is_overdue {
                    " (overdue)"
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                (payment.description)
                @if let Some(frequency) = payment.recurrence_frequency {
                    " "
                    span class=(BADGE_STYLE) { (frequency.label()) }
                }
                @if payment.is_priority {
                    " "
                    span class=(BADGE_STYLE) { "Priority" }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = category {
                    (color_swatch(category.color.as_deref()))
                    (category.name)
                }
            }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(payment.amount)) }
            td class=(TABLE_CELL_STYLE)
            {
                @if payment.is_paid {
                    span class=(BADGE_STYLE) { "Paid" }
                } @else {
                    button
                        type="button"
                        hx-post=(format_endpoint(endpoints::SCHEDULED_PAYMENT_PAID_API, payment.id))
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Mark as paid"
                    }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4 items-start"
                {
                    form
                        hx-put=(format_endpoint(endpoints::SCHEDULED_PAYMENT_PRIORITY_API, payment.id))
                        hx-target-error="#alert-container"
                    {
                        @if !payment.is_priority {
                            input type="hidden" name="isPriority" value="true";
                        }
                        button type="submit" class=(LINK_STYLE)
                        {
                            @if payment.is_priority { "Unmark priority" } @else { "Mark priority" }
                        }
                    }

                    details
                    {
                        summary class={ (LINK_STYLE) " cursor-pointer" } { "Edit" }
                        (edit_payment_form(payment))
                    }

                    (delete_button(
                        &format_endpoint(endpoints::SCHEDULED_PAYMENT_API, payment.id),
                        &format!("Delete the scheduled payment '{}'?", payment.description),
                    ))
                }
            }
        }
    }
}

fn payments_table(
    title: &str,
    payments: &[&ScheduledPayment],
    categories: &HashMap<CategoryId, &Category>,
    today: Date,
) -> Markup {
    let total: i64 = payments.iter().map(|payment| payment.amount).sum();

    html! {
        section class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h2 class="text-lg font-semibold" { (title) }
                span class="text-sm text-gray-500 dark:text-gray-400" { "Total " (format_currency(total)) }
            }

            @if payments.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "Nothing here." }
            } @else {
                div class="overflow-x-auto"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for payment in payments {
                                (payment_row(payment, categories, today))
                            }
                        }
                    }
                }
            }
        }
    }
}

struct ScheduleData {
    payments: Vec<ScheduledPayment>,
    categories: Vec<Category>,
    credit_card_options: Vec<(String, String)>,
}

fn schedule_view(selection: &AccountSelection, data: &ScheduleData, today: Date) -> Markup {
    let categories_by_id: HashMap<CategoryId, &Category> = data
        .categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let category_options: Vec<(String, String)> = data
        .categories
        .iter()
        .map(|category| (category.id.to_string(), category.name.clone()))
        .collect();

    let (paid, unpaid): (Vec<&ScheduledPayment>, Vec<&ScheduledPayment>) =
        data.payments.iter().partition(|payment| payment.is_paid);

    let content = html! {
        (NavBar::new(endpoints::SCHEDULE_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header("Schedule", selection, endpoints::SCHEDULE_VIEW, &[]))

            (payments_table("Upcoming", &unpaid, &categories_by_id, today))
            (payments_table("Paid", &paid, &categories_by_id, today))

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New scheduled payment" }
                (create_payment_form(
                    selection.selected.id,
                    today,
                    &category_options,
                    &data.credit_card_options,
                ))
            }
        }
    };

    base("Schedule", &[dollar_input_styles()], &content)
}

pub async fn get_schedule_page(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<AccountQuery>,
) -> Result<Response, PageError> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Schedule", endpoints::SCHEDULE_VIEW).into_response());
    };
    let account_id = selection.selected.id;

    let data = ScheduleData {
        payments: list_scheduled_payments(account_id, &connection)?,
        categories: list_categories(account_id, &connection)?,
        credit_card_options: list_credit_cards(account_id, &connection)?
            .into_iter()
            .map(|card| (card.id.to_string(), card.name))
            .collect(),
    };

    Ok(schedule_view(&selection, &data, today).into_response())
}

#[cfg(test)]
mod schedule_page_tests {
    use axum::{
        Extension,
        extract::{FromRef, State},
    };
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        account::AccountQuery,
        endpoints::{self, format_endpoint},
        rpc::Params,
        scheduled_payment::{
            core::{NewScheduledPayment, create_scheduled_payment, mark_as_paid},
            endpoints::ScheduledPaymentState,
        },
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            insert_test_account, insert_test_user, parse_html_document, test_state,
        },
    };

    use super::get_schedule_page;

    #[tokio::test]
    async fn shows_payments_and_form() {
        let state = ScheduledPaymentState::from_ref(&test_state());
        let (user, unpaid) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "foo@bar.baz");
            let account = insert_test_account(&connection, user.id, "Personal");
            let new_payment = |description: &str| NewScheduledPayment {
                account_id: account.id,
                category_id: None,
                credit_card_id: None,
                description: description.to_owned(),
                amount: 5000,
                due_date: date!(2025 - 01 - 01),
                is_recurring: false,
                recurrence_frequency: None,
                is_priority: false,
            };
            let unpaid = create_scheduled_payment(new_payment("Internet"), &connection).unwrap();
            let paid = create_scheduled_payment(new_payment("Water"), &connection).unwrap();
            mark_as_paid(paid.id, &connection).unwrap();
            (user, unpaid)
        };

        let response =
            get_schedule_page(State(state), Extension(user.id), Params(AccountQuery::default()))
                .await
                .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Internet"), "got {text}");
        assert!(text.contains("(overdue)"), "got {text}");

        let paid_buttons: Vec<_> = document
            .select(&Selector::parse("button[hx-post]").unwrap())
            .collect();
        assert_eq!(paid_buttons.len(), 1);
        assert_eq!(
            paid_buttons[0].value().attr("hx-post"),
            Some(format_endpoint(endpoints::SCHEDULED_PAYMENT_PAID_API, unpaid.id).as_str())
        );

        let form = document
            .select(&Selector::parse("#create-scheduled-payment-form").unwrap())
            .next()
            .expect("No create form");
        assert_hx_endpoint(&form, endpoints::SCHEDULED_PAYMENTS_API, "hx-post");
        assert_form_input(&form, "dueDate", "date");
    }
}
