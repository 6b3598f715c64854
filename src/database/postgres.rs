use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::time::{Duration, Instant};

use super::manager::DatabaseError;
use super::store::{RawRow, RowStore};
use super::table::{ListOrder, Scope, TableSpec};
use crate::config::DatabaseConfig;

/// PostgreSQL-backed row store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
    slow_query_threshold: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            log_queries: config.enable_query_logging,
            slow_query_threshold: Duration::from_millis(config.slow_query_threshold_ms),
        }
    }

    fn observe(&self, sql: &str, started: Instant) {
        let elapsed = started.elapsed();
        if self.log_queries {
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "{}", sql);
        }
        if elapsed > self.slow_query_threshold {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow query: {}", sql);
        }
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `json_build_object('id', "id", ...)` over the table's selected columns
fn row_object(table: &TableSpec) -> String {
    let pairs: Vec<String> = table
        .select
        .iter()
        .map(|col| format!("'{}', {}", col.replace('\'', "''"), quote_identifier(col)))
        .collect();
    format!("json_build_object({})", pairs.join(", "))
}

fn order_clause(table: &TableSpec) -> String {
    match (table.order, table.timestamp_column) {
        (ListOrder::CreatedDesc, Some(ts)) => {
            format!("{} DESC, \"id\" DESC", quote_identifier(ts))
        }
        _ => "\"id\" DESC".to_string(),
    }
}

fn select_sql(table: &TableSpec, owner_column: Option<&str>) -> String {
    let filter = owner_column
        .map(|col| format!(" WHERE {} = $1", quote_identifier(col)))
        .unwrap_or_default();
    format!(
        "SELECT {} AS row FROM {}{} ORDER BY {}",
        row_object(table),
        quote_identifier(table.name),
        filter,
        order_clause(table)
    )
}

fn insert_sql(table: &TableSpec, owner_column: Option<&str>) -> String {
    let mut columns: Vec<String> = table.columns.iter().map(|c| quote_identifier(c)).collect();
    if let Some(owner) = owner_column {
        columns.push(quote_identifier(owner));
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {} AS row",
        quote_identifier(table.name),
        columns.join(", "),
        placeholders.join(", "),
        row_object(table)
    )
}

fn update_sql(table: &TableSpec, owner_column: Option<&str>) -> String {
    let assignments: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quote_identifier(c), i + 1))
        .collect();
    let id_param = table.columns.len() + 1;
    let owner = owner_column
        .map(|col| format!(" AND {} = ${}", quote_identifier(col), id_param + 1))
        .unwrap_or_default();
    format!(
        "UPDATE {} SET {} WHERE \"id\" = ${}{} RETURNING {} AS row",
        quote_identifier(table.name),
        assignments.join(", "),
        id_param,
        owner,
        row_object(table)
    )
}

fn delete_sql(table: &TableSpec, owner_column: Option<&str>) -> String {
    let owner = owner_column
        .map(|col| format!(" AND {} = $2", quote_identifier(col)))
        .unwrap_or_default();
    format!(
        "DELETE FROM {} WHERE \"id\" = $1{} RETURNING \"id\"",
        quote_identifier(table.name),
        owner
    )
}

fn decode_row(row: &PgRow) -> Result<RawRow, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::QueryError(format!(
            "unexpected row format: {}",
            other
        ))),
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn select_all(&self, table: &TableSpec, scope: Scope) -> Result<Vec<RawRow>, DatabaseError> {
        let owner = table.owner_filter(scope)?;
        let sql = select_sql(table, owner.map(|(col, _)| col));

        let mut query = sqlx::query(&sql);
        if let Some((_, user_id)) = owner {
            query = query.bind(user_id);
        }

        let started = Instant::now();
        let rows = query.fetch_all(&self.pool).await?;
        self.observe(&sql, started);

        rows.iter().map(decode_row).collect()
    }

    async fn insert(
        &self,
        table: &TableSpec,
        scope: Scope,
        values: &[String],
    ) -> Result<RawRow, DatabaseError> {
        table.check_values(values)?;
        let owner = table.owner_filter(scope)?;
        let sql = insert_sql(table, owner.map(|(col, _)| col));

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        if let Some((_, user_id)) = owner {
            query = query.bind(user_id);
        }

        let started = Instant::now();
        let row = query.fetch_one(&self.pool).await?;
        self.observe(&sql, started);

        decode_row(&row)
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
        let sql = update_sql(table, owner.map(|(col, _)| col));

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        query = query.bind(id);
        if let Some((_, user_id)) = owner {
            query = query.bind(user_id);
        }

        let started = Instant::now();
        let row = query.fetch_optional(&self.pool).await?;
        self.observe(&sql, started);

        row.as_ref().map(decode_row).transpose()
    }

    async fn delete(&self, table: &TableSpec, scope: Scope, id: i64) -> Result<bool, DatabaseError> {
        let owner = table.owner_filter(scope)?;
        let sql = delete_sql(table, owner.map(|(col, _)| col));

        let mut query = sqlx::query(&sql).bind(id);
        if let Some((_, user_id)) = owner {
            query = query.bind(user_id);
        }

        let started = Instant::now();
        let row = query.fetch_optional(&self.pool).await?;
        self.observe(&sql, started);

        Ok(row.is_some())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
