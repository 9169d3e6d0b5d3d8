//! Uploading, listing, downloading and deleting transaction attachments.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    attachment::{
        core::{
            Attachment, AttachmentId, MAX_ATTACHMENT_SIZE, NewAttachment, create_attachment,
            delete_attachment, get_attachment_for_user, list_attachments,
        },
        store::AttachmentStore,
    },
    db::lock_connection,
    rpc::{Success, success},
    transaction::{TransactionId, get_transaction_for_user},
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct AttachmentState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub attachment_store: AttachmentStore,
}

impl FromRef<AppState> for AttachmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            attachment_store: state.attachment_store.clone(),
        }
    }
}

/// A file read from a multipart form.
struct UploadedFile {
    file_name: String,
    mime_type: Option<String>,
    bytes: Vec<u8>,
}

/// A body cut off by the request size limit means the file was too large.
fn map_multipart_error(error: MultipartError) -> Error {
    tracing::debug!("Could not read multipart form: {error}");

    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::AttachmentTooLarge
    } else {
        Error::MultipartError(error.body_text())
    }
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, Error> {
    let file_name = field.file_name().unwrap_or("attachment").to_owned();
    let mime_type = field.content_type().map(str::to_owned);

    let bytes = field.bytes().await.map_err(map_multipart_error)?;

    if bytes.len() > MAX_ATTACHMENT_SIZE {
        return Err(Error::AttachmentTooLarge);
    }

    Ok(UploadedFile {
        file_name,
        mime_type,
        bytes: bytes.to_vec(),
    })
}

/// Get the first file in the form, ignoring other fields.
async fn next_file(multipart: &mut Multipart) -> Result<UploadedFile, Error> {
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.file_name().is_some() {
            return read_file(field).await;
        }
    }

    Err(Error::MissingFile)
}

/// Attach the uploaded file to a transaction.
pub async fn upload_attachment_endpoint(
    State(state): State<AttachmentState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    mut multipart: Multipart,
) -> Result<Json<Attachment>, Error> {
    {
        let connection = lock_connection(&state.db_connection)?;
        get_transaction_for_user(transaction_id, user_id, &connection)?;
    }

    let file = next_file(&mut multipart).await?;
    let file_path = state
        .attachment_store
        .save(transaction_id, &file.file_name, &file.bytes)
        .await?;

    let result = lock_connection(&state.db_connection).and_then(|connection| {
        create_attachment(
            NewAttachment {
                transaction_id,
                file_name: file.file_name,
                file_path: file_path.clone(),
                file_size: file.bytes.len() as i64,
                mime_type: file.mime_type,
            },
            &connection,
        )
    });

    match result {
        Ok(attachment) => Ok(Json(attachment)),
        Err(error) => {
            state.attachment_store.remove_files(&[file_path]).await;
            Err(error)
        }
    }
}

pub async fn list_attachments_endpoint(
    State(state): State<AttachmentState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Vec<Attachment>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_transaction_for_user(transaction_id, user_id, &connection)?;

    list_attachments(transaction_id, &connection).map(Json)
}

/// Send the attached file with its recorded MIME type.
pub async fn download_attachment_endpoint(
    State(state): State<AttachmentState>,
    Extension(user_id): Extension<UserId>,
    Path(attachment_id): Path<AttachmentId>,
) -> Result<Response, Error> {
    let attachment = {
        let connection = lock_connection(&state.db_connection)?;
        get_attachment_for_user(attachment_id, user_id, &connection)?
    };

    let bytes = state.attachment_store.read(&attachment.file_path).await?;

    let content_type = attachment
        .mime_type
        .as_deref()
        .and_then(|mime_type| HeaderValue::from_str(mime_type).ok())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let file_name: String = attachment
        .file_name
        .chars()
        .filter(|c| c.is_ascii_graphic() && *c != '"' && *c != '\\' || *c == ' ')
        .collect();
    let content_disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
            .unwrap_or(HeaderValue::from_static("attachment"));

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, content_disposition),
        ],
        bytes,
    )
    .into_response())
}

/// Delete an attachment. Failing to delete the file itself is only logged.
pub async fn delete_attachment_endpoint(
    State(state): State<AttachmentState>,
    Extension(user_id): Extension<UserId>,
    Path(attachment_id): Path<AttachmentId>,
) -> Result<Json<Success>, Error> {
    let attachment = {
        let connection = lock_connection(&state.db_connection)?;
        let attachment = get_attachment_for_user(attachment_id, user_id, &connection)?;
        delete_attachment(attachment_id, &connection)?;
        attachment
    };

    state
        .attachment_store
        .remove_files(&[attachment.file_path])
        .await;

    Ok(success())
}

#[cfg(test)]
mod attachment_endpoint_tests {
    use axum::{
        Extension,
        body::Body,
        extract::{FromRef, FromRequest, Multipart, Path, State},
        http::{Request, StatusCode},
    };
    use axum_test::TestServer;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        account::Account,
        attachment::core::MAX_ATTACHMENT_SIZE,
        auth::COOKIE_SESSION,
        build_router,
        endpoints::{self, format_endpoint},
        rpc::ErrorBody,
        test_utils::{
            TEST_PASSWORD, get_header, insert_test_account, insert_test_transaction,
            insert_test_user, test_state,
        },
        transaction::{Transaction, TransactionType},
        user::User,
    };

    use super::{
        AttachmentState, delete_attachment_endpoint, download_attachment_endpoint,
        list_attachments_endpoint, upload_attachment_endpoint,
    };

    const BOUNDARY: &str = "MY_BOUNDARY123456789";

    fn setup() -> (AttachmentState, User, Account, Transaction) {
        let state = AttachmentState::from_ref(&test_state());
        let (user, account, transaction) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "foo@bar.baz");
            let account = insert_test_account(&connection, user.id, "Personal");
            let transaction = insert_test_transaction(
                &connection,
                &account,
                TransactionType::Expense,
                1000,
                date!(2025 - 01 - 01),
            );
            (user, account, transaction)
        };

        (state, user, account, transaction)
    }

    fn multipart_body(file_name: Option<&str>, contents: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => {
                data.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; \
                        filename=\"{file_name}\"\r\n\
                        Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                data.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
            }
        }
        data.extend_from_slice(contents);
        data.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        data
    }

    async fn must_make_multipart(file_name: Option<&str>, contents: &[u8]) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(file_name, contents)))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn upload_list_download_and_delete() {
        let (state, user, _, transaction) = setup();

        let attachment = upload_attachment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(transaction.id),
            must_make_multipart(Some("receipt.pdf"), b"%PDF-1.7").await,
        )
        .await
        .unwrap()
        .0;

        assert_eq!(attachment.file_name, "receipt.pdf");
        assert_eq!(attachment.file_size, 8);
        assert_eq!(attachment.mime_type.as_deref(), Some("application/pdf"));

        let attachments = list_attachments_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(transaction.id),
        )
        .await
        .unwrap();
        assert_eq!(attachments.0, vec![attachment.clone()]);

        let response = download_attachment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(attachment.id),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "content-type"), "application/pdf");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"receipt.pdf\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"%PDF-1.7");

        delete_attachment_endpoint(State(state.clone()), Extension(user.id), Path(attachment.id))
            .await
            .unwrap();
        assert_eq!(
            state.attachment_store.read(&attachment.file_path).await,
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn upload_without_file() {
        let (state, user, _, transaction) = setup();

        let result = upload_attachment_endpoint(
            State(state),
            Extension(user.id),
            Path(transaction.id),
            must_make_multipart(None, b"just a note").await,
        )
        .await;

        assert_eq!(result.err(), Some(Error::MissingFile));
    }

    /// Upload `size` bytes through the full router, with its body size limit.
    async fn upload_through_router(size: usize) -> ErrorBody {
        let state = test_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "foo@bar.baz");
            let account = insert_test_account(&connection, user.id, "Personal");
            insert_test_transaction(
                &connection,
                &account,
                TransactionType::Expense,
                1000,
                date!(2025 - 01 - 01),
            )
            .id
        };
        let server = TestServer::new(build_router(state, "static/"))
            .expect("Could not create test server.");
        let cookie = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({ "email": "foo@bar.baz", "password": TEST_PASSWORD }))
            .await
            .cookie(COOKIE_SESSION);

        let response = server
            .post(&format_endpoint(endpoints::TRANSACTION_ATTACHMENTS_API, transaction_id))
            .add_cookie(cookie)
            .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
            .bytes(multipart_body(Some("big.txt"), &vec![b'a'; size]).into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.json()
    }

    #[tokio::test]
    async fn upload_too_large() {
        let body = upload_through_router(MAX_ATTACHMENT_SIZE + 1).await;

        assert_eq!(body.error, Error::AttachmentTooLarge.to_string());
    }

    #[tokio::test]
    async fn upload_over_body_limit_is_too_large() {
        let body = upload_through_router(2 * MAX_ATTACHMENT_SIZE).await;

        assert_eq!(body.error, Error::AttachmentTooLarge.to_string());
    }

    #[tokio::test]
    async fn cannot_upload_to_other_users_transaction() {
        let (state, _, _, transaction) = setup();
        let intruder = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "bar@baz.qux")
        };

        let result = upload_attachment_endpoint(
            State(state),
            Extension(intruder.id),
            Path(transaction.id),
            must_make_multipart(Some("receipt.pdf"), b"%PDF-1.7").await,
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn download_missing_attachment() {
        let (state, user, _, _) = setup();

        let result = download_attachment_endpoint(State(state), Extension(user.id), Path(99)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
