//! The page for managing an account's categories.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    PageError,
    account::{
        AccountQuery, AccountSelection, account_page_header, no_accounts_page, select_account,
    },
    category::{
        core::{Category, CategoryKind, list_categories},
        endpoints::CategoryState,
    },
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, color_swatch, delete_button, labelled_input, select_input,
        submit_button,
    },
    navigation::NavBar,
    rpc::Params,
    user::UserId,
};

fn create_category_form(account_id: i64) -> Markup {
    let kinds = [CategoryKind::Expense, CategoryKind::Income]
        .iter()
        .map(|kind| (kind.as_str().to_owned(), kind.label().to_owned()))
        .collect::<Vec<_>>();

    html! {
        form
            id="create-category-form"
            hx-post=(endpoints::CATEGORIES_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            input type="hidden" name="accountId" value=(account_id);

            (labelled_input("Name", "name", "text", None, true))
            (select_input("Type", "type", &kinds, Some(CategoryKind::Expense.as_str()), true))
            (labelled_input("Icon", "icon", "text", None, false))
            (labelled_input("Color", "color", "color", Some("#6b7280"), false))
            (submit_button("Add category"))
        }
    }
}

fn category_item(category: &Category) -> Markup {
    let category_url = format_endpoint(endpoints::CATEGORY_API, category.id);
    let form_id = format!("edit-category-{}", category.id);

    html! {
        li class="flex flex-wrap items-center gap-2 py-2 border-b border-gray-200 dark:border-gray-700"
        {
            (color_swatch(category.color.as_deref()))

            form
                id=(form_id)
                hx-put=(category_url)
                hx-target-error="#alert-container"
                class="flex flex-wrap flex-1 items-center gap-2"
            {
                input
                    type="text"
                    name="icon"
                    value=[category.icon.as_deref()]
                    aria-label="Icon"
                    class={ (FORM_TEXT_INPUT_STYLE) " max-w-16" };

                input
                    type="text"
                    name="name"
                    value=(category.name)
                    required
                    aria-label="Name"
                    class={ (FORM_TEXT_INPUT_STYLE) " flex-1" };

                input
                    type="color"
                    name="color"
                    value=(category.color.as_deref().unwrap_or("#888888"))
                    aria-label="Color";

                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save" }
            }

            (delete_button(
                &category_url,
                &format!(
                    "Delete the category '{}'? Transactions in it will become uncategorized.",
                    category.name
                ),
            ))
        }
    }
}

fn category_list(title: &str, categories: &[&Category]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold mb-2" { (title) }

            @if categories.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No categories yet." }
            } @else {
                ul
                {
                    @for category in categories {
                        (category_item(category))
                    }
                }
            }
        }
    }
}

fn categories_view(selection: &AccountSelection, categories: &[Category]) -> Markup {
    let of_kind = |kind: CategoryKind| -> Vec<&Category> {
        categories
            .iter()
            .filter(|category| category.kind == kind)
            .collect()
    };

    let content = html! {
        (NavBar::new(endpoints::CATEGORIES_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header("Categories", selection, endpoints::CATEGORIES_VIEW, &[]))

            div class="w-full grid gap-6 lg:grid-cols-2"
            {
                (category_list("Expenses", &of_kind(CategoryKind::Expense)))
                (category_list("Income", &of_kind(CategoryKind::Income)))
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New category" }
                (create_category_form(selection.selected.id))
            }
        }
    };

    base("Categories", &[], &content)
}

pub async fn get_categories_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<AccountQuery>,
) -> Result<Response, PageError> {
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Categories", endpoints::CATEGORIES_VIEW).into_response());
    };

    let categories = list_categories(selection.selected.id, &connection)?;

    Ok(categories_view(&selection, &categories).into_response())
}
