//! Credit cards that expenses can be charged to.

mod core;
mod credit_cards_page;
mod endpoints;

pub use core::{CreditCard, CreditCardId, create_credit_card_table, list_credit_cards};
pub use credit_cards_page::get_credit_cards_page;
pub use endpoints::{
    create_credit_card_endpoint, credit_card_expenses_endpoint, delete_credit_card_endpoint,
    list_credit_cards_endpoint, update_credit_card_endpoint,
};

#[cfg(test)]
pub use core::{NewCreditCard, create_credit_card};
#[cfg(test)]
pub use endpoints::CreditCardState;
