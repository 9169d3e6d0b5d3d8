//! Income and expense categories within an account.

mod categories_page;
mod core;
mod endpoints;

pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryId, CategoryKind, create_category_table, create_default_categories,
    list_categories,
};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
    update_category_endpoint,
};

#[cfg(test)]
pub use core::{NewCategory, create_category, get_category_for_user};
#[cfg(test)]
pub use endpoints::CategoryState;
