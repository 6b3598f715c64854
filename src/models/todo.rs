use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Reply, Resource};
use crate::database::{ListOrder, TableSpec};
use crate::error::ApiError;
use crate::validate::Payload;

/// A task on the shared todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFields {
    pub title: String,
}

impl Resource for Todo {
    const PATH: &'static str = "todos";
    const SINGULAR: &'static str = "todo";
    const TABLE: TableSpec = TableSpec {
        name: "todos",
        columns: &["title"],
        select: &["id", "title", "created_at"],
        owner_column: None,
        timestamp_column: Some("created_at"),
        order: ListOrder::IdDesc,
    };
    const REPLY: Reply = Reply::Row;

    type Row = Todo;
    type Fields = TodoFields;

    fn fields_from_payload(payload: &Payload) -> Result<TodoFields, ApiError> {
        let [title] = payload.required(["title"])?;
        Ok(TodoFields { title })
    }

    fn values(fields: &TodoFields) -> Vec<String> {
        vec![fields.title.clone()]
    }

    fn row_id(row: &Todo) -> i64 {
        row.id
    }

    fn fields_of(row: &Todo) -> TodoFields {
        TodoFields {
            title: row.title.clone(),
        }
    }

    fn describe(row: &Todo) -> String {
        format!("#{} {} ({})", row.id, row.title, row.created_at.format("%Y-%m-%d %H:%M"))
    }
}
