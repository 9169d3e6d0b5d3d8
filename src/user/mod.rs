//! Users, their profiles and user management.

mod core;
mod endpoints;
mod profile_page;

pub use core::{
    Email, NewUser, Role, User, UserId, count_users, create_user, create_user_table, delete_user,
    get_user_by_email, get_user_by_id, set_password_hash, touch_last_signed_in, update_user_name,
};
pub use endpoints::{delete_user_endpoint, invite_user_endpoint, list_users_endpoint};
pub use profile_page::get_profile_page;

#[cfg(test)]
pub use core::list_users;
#[cfg(test)]
pub use endpoints::UserState;
