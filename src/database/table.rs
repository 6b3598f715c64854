use uuid::Uuid;

use super::manager::DatabaseError;

/// Static description of one resource table.
///
/// Identifiers here come from code, never from requests, so the SQL layer
/// may splice them (quoted) into statement text.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    /// Caller-writable string columns, in payload order
    pub columns: &'static [&'static str],
    /// Columns returned to callers, in output order
    pub select: &'static [&'static str],
    /// Ownership column; `None` means rows are shared by every caller
    pub owner_column: Option<&'static str>,
    /// Server-assigned creation timestamp column, if the table has one
    pub timestamp_column: Option<&'static str>,
    /// Newest-first ordering; ties broken by id descending
    pub order: ListOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    IdDesc,
    CreatedDesc,
}

impl TableSpec {
    pub fn is_owner_scoped(&self) -> bool {
        self.owner_column.is_some()
    }

    pub fn scope_for(&self, user_id: Uuid) -> Scope {
        if self.is_owner_scoped() {
            Scope::Owner(user_id)
        } else {
            Scope::Global
        }
    }

    /// One value per writable column, in order
    pub fn check_values(&self, values: &[String]) -> Result<(), DatabaseError> {
        if values.len() != self.columns.len() {
            return Err(DatabaseError::QueryError(format!(
                "table {} expects {} values, got {}",
                self.name,
                self.columns.len(),
                values.len()
            )));
        }
        Ok(())
    }

    /// Owner column and value a statement must filter on, if any.
    /// An owner-scoped table never runs unfiltered.
    pub fn owner_filter(&self, scope: Scope) -> Result<Option<(&'static str, Uuid)>, DatabaseError> {
        match (self.owner_column, scope) {
            (Some(column), Scope::Owner(id)) => Ok(Some((column, id))),
            (None, Scope::Global) => Ok(None),
            (Some(_), Scope::Global) => Err(DatabaseError::QueryError(format!(
                "table {} requires an owner scope",
                self.name
            ))),
            (None, Scope::Owner(_)) => Err(DatabaseError::QueryError(format!(
                "table {} has no owner column",
                self.name
            ))),
        }
    }
}

/// Which rows of a table a statement may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Owner(Uuid),
    Global,
}
