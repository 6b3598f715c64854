//! The three resources and the shape they share.

pub mod contact;
pub mod note;
pub mod todo;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::database::TableSpec;
use crate::error::ApiError;
use crate::validate::Payload;

pub use contact::{Contact, ContactFields};
pub use note::{Note, NoteFields};
pub use todo::{Todo, TodoFields};

/// What a successful mutation sends back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The row itself; deletes answer 204
    Row,
    /// `{"ok": true}` for every mutation
    Ok,
}

/// A CRUD resource: one table, a row type, and the writable fields.
pub trait Resource: Send + Sync + 'static {
    /// Route segment, e.g. `notes`
    const PATH: &'static str;
    /// Human name for messages, e.g. `note`
    const SINGULAR: &'static str;
    const TABLE: TableSpec;
    const REPLY: Reply;

    type Row: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static;
    type Fields: Serialize + DeserializeOwned + Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    /// Boundary validation: required, trimmed, non-empty string fields
    fn fields_from_payload(payload: &Payload) -> Result<Self::Fields, ApiError>;

    /// Writable column values in `TABLE.columns` order
    fn values(fields: &Self::Fields) -> Vec<String>;

    fn row_id(row: &Self::Row) -> i64;

    /// Current writable values of a row, used to prefill an edit
    fn fields_of(row: &Self::Row) -> Self::Fields;

    /// One-line text rendering of a row
    fn describe(row: &Self::Row) -> String;

    /// Run unvalidated fields (e.g. a UI draft) through boundary validation
    fn normalize(fields: &Self::Fields) -> Result<Self::Fields, ApiError> {
        let value = serde_json::to_value(fields).unwrap_or_default();
        Self::fields_from_payload(&Payload::from_value(value))
    }
}
