//! Typed inputs and shared outputs for the JSON API under `/api`.
//!
//! Every procedure deserializes its input into a struct, validates it before
//! touching the database and responds with JSON. The same procedures accept
//! URL-encoded forms so the HTML pages can call them with htmx.

mod htmx;
mod input;
pub(crate) mod validate;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::database_id::DatabaseId;

pub use htmx::htmx_bridge;
pub use input::{Input, Params};

/// The JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A message that can be shown to the user.
    pub error: String,
    /// The kind of error, e.g. "NOT_FOUND".
    pub code: String,
}

/// The output of procedures that have nothing else to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

/// The output of procedures that create a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Created {
    pub success: bool,
    pub id: DatabaseId,
}

pub fn success() -> Json<Success> {
    Json(Success { success: true })
}

pub fn created(id: DatabaseId) -> Json<Created> {
    Json(Created { success: true, id })
}
