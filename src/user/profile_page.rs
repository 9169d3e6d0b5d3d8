//! The page for the logged in user's profile, the other users and recent activity.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::format_description::well_known::Rfc3339;

use crate::{
    PageError,
    activity_log::{ActivityLog, list_recent_activity},
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE,
        FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, base, delete_button, labelled_input, submit_button,
    },
    navigation::NavBar,
    user::{
        core::{Role, User, UserId, get_user_by_id, list_users},
        endpoints::UserState,
    },
};

/// How many activity log entries the profile page shows.
const PROFILE_ACTIVITY_LIMIT: usize = 10;

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Admin => "Administrator",
    }
}

fn profile_form(user: &User) -> Markup {
    html! {
        form
            id="profile-form"
            hx-put=(endpoints::PROFILE_API)
            hx-target-error="#alert-container"
            class=(FORM_CONTAINER_STYLE)
        {
            (labelled_input("Name", "name", "text", Some(&user.name), true))

            div
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Email" }
                p { (user.email) }
            }

            div
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Role" }
                p { (role_label(user.role)) }
            }

            div
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save changes" }
            }
        }
    }
}

fn invite_user_form() -> Markup {
    html! {
        form
            id="invite-user-form"
            hx-post=(endpoints::USERS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(FORM_CONTAINER_STYLE)
        {
            (labelled_input("Name", "name", "text", None, true))
            (labelled_input("Email", "email", "email", None, true))
            (labelled_input("WhatsApp number", "whatsapp", "tel", None, true))
            (submit_button("Invite user"))
        }
    }
}

fn users_table(users: &[User], current_user: &User) -> Markup {
    html! {
        div class="overflow-x-auto"
        {
            table id="users-table" class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for user in users {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                (user.name)
                                @if user.id == current_user.id {
                                    " "
                                    span class=(BADGE_STYLE) { "You" }
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { (user.email) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if user.password_hash.is_some() { "Active" } @else { "Invited" }
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if user.id != current_user.id {
                                    (delete_button(
                                        &format_endpoint(endpoints::USER_API, user.id.as_i64()),
                                        &format!("Remove {} and all of their data?", user.name),
                                    ))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn activity_list(activity: &[ActivityLog]) -> Markup {
    html! {
        @if activity.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No recent activity." }
        } @else {
            ul id="recent-activity" class="divide-y divide-gray-200 dark:divide-gray-700"
            {
                @for entry in activity {
                    @let timestamp = entry.created_at.format(&Rfc3339).unwrap_or_default();

                    li class="py-2"
                    {
                        span class=(BADGE_STYLE) { (entry.action) }
                        @if let Some(details) = &entry.details {
                            " " (details)
                        }
                        " "
                        time class="text-sm text-gray-500 dark:text-gray-400" datetime=(timestamp)
                        {
                            (entry.created_at.date())
                        }
                    }
                }
            }
        }
    }
}

/// `users` is only given to administrators, who can manage other users.
fn profile_view(user: &User, users: Option<&[User]>, activity: &[ActivityLog]) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="w-full text-xl font-bold" { "Profile" }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "Your details" }
                (profile_form(user))
            }

            @if let Some(users) = users {
                section class=(CARD_STYLE)
                {
                    h2 class="text-lg font-semibold mb-4" { "Users" }
                    (users_table(users, user))

                    h3 class="text-base font-semibold mt-6 mb-4" { "Invite a user" }
                    (invite_user_form())
                }
            }

            section class=(CARD_STYLE)
            {
                h2 class="text-lg font-semibold mb-4" { "Recent activity" }
                (activity_list(activity))
            }

            section class={ (CARD_STYLE) " border border-red-300" }
            {
                h2 class="text-lg font-semibold text-red-600 mb-2" { "Delete account" }
                p class="mb-4 text-sm"
                {
                    "Permanently delete your user along with all of your accounts, \
                    transactions and attachments."
                }

                button
                    id="delete-account-button"
                    type="button"
                    hx-delete=(endpoints::DELETE_ACCOUNT_API)
                    hx-confirm="Delete your account and all of your data? This cannot be undone."
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete my account"
                }
            }
        }
    };

    base("Profile", &[], &content)
}

pub async fn get_profile_page(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, PageError> {
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)?;
    let users = match user.role {
        Role::Admin => Some(list_users(&connection)?),
        Role::User => None,
    };
    let activity = list_recent_activity(user_id, PROFILE_ACTIVITY_LIMIT, &connection)?;

    Ok(profile_view(&user, users.as_deref(), &activity).into_response())
}

#[cfg(test)]
mod profile_page_tests {
    use axum::{
        Extension,
        extract::{FromRef, State},
    };
    use scraper::Selector;

    use crate::{
        activity_log::record_activity,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            insert_test_admin, insert_test_user, parse_html_document, test_state,
        },
        user::endpoints::UserState,
    };

    use super::get_profile_page;

    #[tokio::test]
    async fn shows_profile_users_and_activity() {
        let state = UserState::from_ref(&test_state());
        let (user, other_user) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_admin(&connection, "foo@bar.baz");
            let other_user = insert_test_user(&connection, "bar@baz.qux");
            record_activity(
                user.id,
                "CREATE_TRANSACTION",
                Some("Created transaction: Rent"),
                &connection,
            )
            .unwrap();
            (user, other_user)
        };

        let response = get_profile_page(State(state), Extension(user.id)).await.unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let profile_form = document
            .select(&Selector::parse("#profile-form").unwrap())
            .next()
            .expect("No profile form");
        assert_hx_endpoint(&profile_form, endpoints::PROFILE_API, "hx-put");
        assert_form_input(&profile_form, "name", "text");

        let invite_form = document
            .select(&Selector::parse("#invite-user-form").unwrap())
            .next()
            .expect("No invite form");
        assert_hx_endpoint(&invite_form, endpoints::USERS_API, "hx-post");
        assert_form_input(&invite_form, "email", "email");
        assert_form_input(&invite_form, "whatsapp", "tel");

        // Only the other user can be removed.
        let delete_urls: Vec<_> = document
            .select(&Selector::parse("#users-table button[hx-delete]").unwrap())
            .filter_map(|button| button.value().attr("hx-delete"))
            .collect();
        assert_eq!(
            delete_urls,
            vec![format_endpoint(endpoints::USER_API, other_user.id.as_i64())]
        );

        let activity = document
            .select(&Selector::parse("#recent-activity").unwrap())
            .next()
            .expect("No activity list")
            .text()
            .collect::<String>();
        assert!(activity.contains("Created transaction: Rent"), "got {activity}");
    }

    #[tokio::test]
    async fn regular_users_do_not_see_user_management() {
        let state = UserState::from_ref(&test_state());
        let user = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_admin(&connection, "admin@example.com");
            insert_test_user(&connection, "foo@bar.baz")
        };

        let response = get_profile_page(State(state), Extension(user.id)).await.unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        for selector in ["#users-table", "#invite-user-form"] {
            assert!(
                document.select(&Selector::parse(selector).unwrap()).next().is_none(),
                "{selector} should be hidden from regular users"
            );
        }
        assert!(
            document
                .select(&Selector::parse("#profile-form").unwrap())
                .next()
                .is_some(),
            "No profile form"
        );
    }
}
