use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manager::DatabaseError;
use super::table::{Scope, TableSpec};

/// A row as handed back by a store: the table's selected columns as JSON.
pub type RawRow = Map<String, Value>;

/// Single-statement row storage, one table per call.
///
/// Every method is one atomic statement. Scope filters are applied inside the
/// statement, so a row outside the caller's scope is indistinguishable from a
/// missing one.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows in scope, newest first per `table.order`
    async fn select_all(&self, table: &TableSpec, scope: Scope) -> Result<Vec<RawRow>, DatabaseError>;

    /// Insert one row; the store assigns id and timestamp and records the owner
    async fn insert(
        &self,
        table: &TableSpec,
        scope: Scope,
        values: &[String],
    ) -> Result<RawRow, DatabaseError>;

    /// Replace the writable columns of one row; `None` when nothing matched
    async fn update(
        &self,
        table: &TableSpec,
        scope: Scope,
        id: i64,
        values: &[String],
    ) -> Result<Option<RawRow>, DatabaseError>;

    /// Remove one row; `false` when nothing matched
    async fn delete(&self, table: &TableSpec, scope: Scope, id: i64) -> Result<bool, DatabaseError>;

    /// Connectivity probe for the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}
