//! Files such as receipts attached to transactions.

mod core;
mod endpoints;
mod store;

pub use core::{
    Attachment, MAX_ATTACHMENT_SIZE, attachment_paths_for_account,
    attachment_paths_for_transaction, attachment_paths_for_user, create_attachment_table,
    list_attachments,
};
pub use endpoints::{
    delete_attachment_endpoint, download_attachment_endpoint, list_attachments_endpoint,
    upload_attachment_endpoint,
};
pub use store::AttachmentStore;

#[cfg(test)]
pub use core::{NewAttachment, create_attachment};
#[cfg(test)]
pub use endpoints::AttachmentState;
