use serde::{Deserialize, Serialize};

use super::{Reply, Resource};
use crate::database::{ListOrder, TableSpec};
use crate::error::ApiError;
use crate::validate::Payload;

/// A note, private to the user who wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
}

impl Resource for Note {
    const PATH: &'static str = "notes";
    const SINGULAR: &'static str = "note";
    const TABLE: TableSpec = TableSpec {
        name: "notes",
        columns: &["title"],
        select: &["id", "title"],
        owner_column: Some("user_id"),
        timestamp_column: None,
        order: ListOrder::IdDesc,
    };
    const REPLY: Reply = Reply::Row;

    type Row = Note;
    type Fields = NoteFields;

    fn fields_from_payload(payload: &Payload) -> Result<NoteFields, ApiError> {
        let [title] = payload.required(["title"])?;
        Ok(NoteFields { title })
    }

    fn values(fields: &NoteFields) -> Vec<String> {
        vec![fields.title.clone()]
    }

    fn row_id(row: &Note) -> i64 {
        row.id
    }

    fn fields_of(row: &Note) -> NoteFields {
        NoteFields {
            title: row.title.clone(),
        }
    }

    fn describe(row: &Note) -> String {
        format!("#{} {}", row.id, row.title)
    }
}
