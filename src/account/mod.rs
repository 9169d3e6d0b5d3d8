//! Accounts group a user's finances into separate ledgers, e.g. personal and business.

mod accounts_page;
mod core;
mod endpoints;
mod selector;

pub use accounts_page::get_accounts_page;
pub use core::{
    AccountId, AccountType, NewAccount, create_account, create_account_table,
    get_account_for_user,
};
pub use endpoints::{
    create_account_endpoint, delete_account_endpoint, list_accounts_endpoint,
    update_account_endpoint,
};
pub use selector::{
    AccountQuery, AccountSelection, account_page_header, no_accounts_page, select_account,
};

#[cfg(test)]
pub use core::{Account, list_accounts};
#[cfg(test)]
pub use endpoints::AccountState;
