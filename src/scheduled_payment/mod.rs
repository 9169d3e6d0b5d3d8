//! Payments due on a date, such as bills, that can repeat.

mod core;
mod endpoints;
mod schedule_page;

pub use core::{ScheduledPayment, create_scheduled_payment_table, list_upcoming_payments};
pub use endpoints::{
    create_scheduled_payment_endpoint, delete_scheduled_payment_endpoint,
    list_scheduled_payments_endpoint, mark_as_paid_endpoint, set_priority_endpoint,
    update_scheduled_payment_endpoint,
};
pub use schedule_page::get_schedule_page;

#[cfg(test)]
pub use endpoints::ScheduledPaymentState;
