use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::store::{RawRow, RowStore};
use super::table::{ListOrder, Scope, TableSpec};

#[derive(Debug, Clone)]
struct StoredRow {
    id: i64,
    owner: Option<Uuid>,
    created_at: DateTime<Utc>,
    values: Vec<String>,
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<StoredRow>,
}

/// In-memory RowStore for tests and running without a database.
///
/// Mirrors the PostgreSQL store: ids start at 1 per table, owner filters
/// apply to every statement, rows come back as the table's selected columns.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<&'static str, Table>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(&self, table: &TableSpec, f: impl FnOnce(&mut Table) -> T) -> Result<T, DatabaseError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| DatabaseError::QueryError("memory store lock poisoned".to_string()))?;
        Ok(f(tables.entry(table.name).or_default()))
    }
}

fn in_scope(row: &StoredRow, owner: Option<(&'static str, Uuid)>) -> bool {
    match owner {
        Some((_, user_id)) => row.owner == Some(user_id),
        None => true,
    }
}

fn project(table: &TableSpec, row: &StoredRow) -> RawRow {
    let mut out = Map::new();
    for col in table.select {
        let value = if *col == "id" {
            json!(row.id)
        } else if Some(*col) == table.timestamp_column {
            json!(row.created_at)
        } else if Some(*col) == table.owner_column {
            json!(row.owner)
        } else {
            table
                .columns
                .iter()
                .position(|c| c == col)
                .and_then(|i| row.values.get(i))
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null)
        };
        out.insert(col.to_string(), value);
    }
    out
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select_all(&self, table: &TableSpec, scope: Scope) -> Result<Vec<RawRow>, DatabaseError> {
        let owner = table.owner_filter(scope)?;
        self.with_table(table, |t| {
            let mut rows: Vec<&StoredRow> = t.rows.iter().filter(|r| in_scope(r, owner)).collect();
            match table.order {
                ListOrder::CreatedDesc => {
                    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
                }
                ListOrder::IdDesc => rows.sort_by(|a, b| b.id.cmp(&a.id)),
            }
            rows.into_iter().map(|r| project(table, r)).collect()
        })
    }

    async fn insert(
        &self,
        table: &TableSpec,
        scope: Scope,
        values: &[String],
    ) -> Result<RawRow, DatabaseError> {
        table.check_values(values)?;
        let owner = table.owner_filter(scope)?;
        self.with_table(table, |t| {
            t.next_id += 1;
            let row = StoredRow {
                id: t.next_id,
                owner: owner.map(|(_, id)| id),
                created_at: Utc::now(),
                values: values.to_vec(),
            };
            let out = project(table, &row);
            t.rows.push(row);
            out
        })
    }

    async fn update(
        &self,
        table: &TableSpec,
        scope: Scope,
        id: i64,
        values: &[String],
    ) -> Result<Option<RawRow>, DatabaseError> {
        table.check_values(values)?;
        let owner = table.owner_filter(scope)?;
        self.with_table(table, |t| {
            t.rows
                .iter_mut()
                .find(|r| r.id == id && in_scope(r, owner))
                .map(|row| {
                    row.values = values.to_vec();
                    project(table, row)
                })
        })
    }

    async fn delete(&self, table: &TableSpec, scope: Scope, id: i64) -> Result<bool, DatabaseError> {
        let owner = table.owner_filter(scope)?;
        self.with_table(table, |t| {
            let before = t.rows.len();
            t.rows.retain(|r| !(r.id == id && in_scope(r, owner)));
            t.rows.len() != before
        })
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
