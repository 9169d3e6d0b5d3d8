#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod html;

pub(crate) use fixtures::{
    TEST_PASSWORD, get_test_connection, insert_test_account, insert_test_admin,
    insert_test_attachment, insert_test_category, insert_test_credit_card, insert_test_transaction,
    insert_test_user, test_state, test_user,
};
pub(crate) use html::{
    assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html, get_header,
    must_get_form, parse_html_document,
};
