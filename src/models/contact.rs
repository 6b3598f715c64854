use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Reply, Resource};
use crate::database::{ListOrder, TableSpec};
use crate::error::ApiError;
use crate::validate::Payload;

/// A phonebook entry, private to the user who added it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub phone: String,
}

impl Resource for Contact {
    const PATH: &'static str = "contacts";
    const SINGULAR: &'static str = "contact";
    const TABLE: TableSpec = TableSpec {
        name: "phonebook",
        columns: &["name", "phone"],
        select: &["id", "name", "phone", "created_at"],
        owner_column: Some("user_id"),
        timestamp_column: Some("created_at"),
        order: ListOrder::CreatedDesc,
    };
    const REPLY: Reply = Reply::Ok;

    type Row = Contact;
    type Fields = ContactFields;

    fn fields_from_payload(payload: &Payload) -> Result<ContactFields, ApiError> {
        let [name, phone] = payload.required(["name", "phone"])?;
        Ok(ContactFields { name, phone })
    }

    fn values(fields: &ContactFields) -> Vec<String> {
        vec![fields.name.clone(), fields.phone.clone()]
    }

    fn row_id(row: &Contact) -> i64 {
        row.id
    }

    fn fields_of(row: &Contact) -> ContactFields {
        ContactFields {
            name: row.name.clone(),
            phone: row.phone.clone(),
        }
    }

    fn describe(row: &Contact) -> String {
        format!(
            "#{} {} ({}) added {}",
            row.id,
            row.name,
            row.phone,
            row.created_at.format("%Y-%m-%d %H:%M")
        )
    }
}
