//! The page for tracking an account's goals.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    PageError,
    account::{
        AccountId, AccountQuery, AccountSelection, account_page_header, no_accounts_page,
        select_account,
    },
    category::{Category, CategoryId, list_categories},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    goal::{
        core::{Goal, GoalStatus, GoalType, list_goals},
        endpoints::GoalState,
    },
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, amount_input, base, color_swatch, delete_button,
        dollar_input_styles, format_currency, labelled_input, select_input, submit_button,
    },
    navigation::NavBar,
    rpc::Params,
    user::UserId,
};

fn type_options() -> Vec<(String, String)> {
    GoalType::ALL
        .iter()
        .map(|goal_type| (goal_type.as_str().to_owned(), goal_type.label().to_owned()))
        .collect()
}

fn status_options() -> Vec<(String, String)> {
    GoalStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_owned(), status.label().to_owned()))
        .collect()
}

fn create_goal_form(account_id: AccountId, categories: &[(String, String)]) -> Markup {
    html! {
        form
            id="create-goal-form"
            hx-post=(endpoints::GOALS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            input type="hidden" name="accountId" value=(account_id);

            (labelled_input("Name", "name", "text", None, true))
            (select_input("Type", "type", &type_options(), Some(GoalType::Savings.as_str()), true))
            (amount_input("Target amount", "targetAmount", None, true))
            (labelled_input("Deadline", "deadline", "date", None, false))
            (select_input("Category", "categoryId", categories, None, false))
            (submit_button("Add goal"))
        }
    }
}

fn edit_goal_form(goal: &Goal) -> Markup {
    let deadline = goal.deadline.map(|deadline| deadline.to_string());

    html! {
        form
            id={ "edit-goal-" (goal.id) }
            hx-put=(format_endpoint(endpoints::GOAL_API, goal.id))
            hx-target-error="#alert-container"
            class="grid gap-4 sm:grid-cols-2 mt-4"
        {
            (labelled_input("Name", "name", "text", Some(&goal.name), true))
            (amount_input("Target amount", "targetAmount", Some(goal.target_amount), true))
            (amount_input("Current amount", "currentAmount", Some(goal.current_amount), true))
            (labelled_input("Deadline", "deadline", "date", deadline.as_deref(), false))
            (select_input("Status", "status", &status_options(), Some(goal.status.as_str()), true))

            div class="flex items-end"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save changes" }
            }
        }
    }
}

fn goal_item(goal: &Goal, category: Option<&Category>) -> Markup {
    let progress = goal.progress_percent();
    let bar_color = match goal.status {
        GoalStatus::Active => "bg-blue-600",
        GoalStatus::Completed => "bg-green-600",
        GoalStatus::Cancelled => "bg-gray-400",
    };

    html! {
        article class=(CARD_STYLE)
        {
            div class="flex justify-between items-start gap-2"
            {
                h2 class="text-lg font-semibold" { (goal.name) }
                span class=(BADGE_STYLE) { (goal.status.label()) }
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (goal.goal_type.label())
                @if let Some(category) = category {
                    " · "
                    (color_swatch(category.color.as_deref()))
                    (category.name)
                }
            }

            p class="mt-2"
            {
                (format_currency(goal.current_amount))
                " of "
                (format_currency(goal.target_amount))
                span class="text-sm text-gray-500 dark:text-gray-400" { " (" (format!("{progress:.0}")) "%)" }
            }

            div class="w-full h-2 mt-2 bg-gray-200 rounded-full dark:bg-gray-700"
            {
                div
                    class={ "h-2 rounded-full " (bar_color) }
                    style={ "width: " (format!("{progress:.0}")) "%;" }
                {}
            }

            @if let Some(deadline) = goal.deadline {
                p class="mt-2 text-sm"
                {
                    "Deadline: "
                    time datetime=(deadline) { (deadline) }
                }
            }

            div class="flex gap-4 items-start mt-4"
            {
                details class="flex-1"
                {
                    summary class={ (LINK_STYLE) " cursor-pointer" } { "Edit" }
                    (edit_goal_form(goal))
                }

                (delete_button(
                    &format_endpoint(endpoints::GOAL_API, goal.id),
                    &format!("Delete the goal '{}'?", goal.name),
                ))
            }
        }
    }
}

fn goals_view(selection: &AccountSelection, goals: &[Goal], categories: &[Category]) -> Markup {
    let categories_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let category_options: Vec<(String, String)> = categories
        .iter()
        .map(|category| (category.id.to_string(), category.name.clone()))
        .collect();

    let content = html! {
        (NavBar::new(endpoints::GOALS_VIEW).with_account(selection.selected.id).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            (account_page_header("Goals", selection, endpoints::GOALS_VIEW, &[]))

            @if goals.is_empty() {
                p class="w-full text-gray-500 dark:text-gray-400" { "No goals yet." }
            } @else {
                div class="w-full grid gap-6 md:grid-cols-2 lg:grid-cols-3"
                {
                    @for goal in goals {
                        (goal_item(
                            goal,
                            goal.category_id
                                .and_then(|category_id| categories_by_id.get(&category_id))
                                .copied(),
                        ))
                    }
                }
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "New goal" }
                (create_goal_form(selection.selected.id, &category_options))
            }
        }
    };

    base("Goals", &[dollar_input_styles()], &content)
}

pub async fn get_goals_page(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserId>,
    Params(query): Params<AccountQuery>,
) -> Result<Response, PageError> {
    let connection = lock_connection(&state.db_connection)?;

    let Some(selection) = select_account(user_id, query.account_id, &connection)? else {
        return Ok(no_accounts_page("Goals", endpoints::GOALS_VIEW).into_response());
    };

    let goals = list_goals(selection.selected.id, &connection)?;
    let categories = list_categories(selection.selected.id, &connection)?;

    Ok(goals_view(&selection, &goals, &categories).into_response())
}
