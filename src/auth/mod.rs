//! Registration, logging in and out, and the session checks for protected routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod redirect;
mod register;
mod token;

pub use log_in::{get_log_in_page, log_in_endpoint};
pub use log_out::{get_log_out, log_out_endpoint};
pub use middleware::{auth_guard, auth_guard_api};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{delete_account_endpoint, me_endpoint, update_profile_endpoint};
pub use register::{get_register_page, register_endpoint};
pub use token::SessionConfig;

#[cfg(test)]
pub use cookie::COOKIE_SESSION;
#[cfg(test)]
pub use profile::ProfileState;
