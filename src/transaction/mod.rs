//! Income and expenses recorded against an account.

mod core;
mod endpoints;
mod transactions_page;

pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionStatus, TransactionType,
    check_references, create_transaction, create_transaction_table, get_transaction,
    get_transaction_for_user, list_credit_card_transactions,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
pub use transactions_page::get_transactions_page;

#[cfg(test)]
pub use endpoints::TransactionState;
