use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::cache::{Lookup, ViewCache, ViewKey};
use crate::database::manager::DatabaseError;
use crate::database::store::{RawRow, RowStore};
use crate::database::table::Scope;
use crate::models::Resource;

/// Typed access to one resource's table on behalf of one caller.
///
/// Reads go through the list cache; every successful mutation invalidates the
/// caller's view before returning.
pub struct Repository<R: Resource> {
    store: Arc<dyn RowStore>,
    cache: Arc<ViewCache>,
    _phantom: PhantomData<R>,
}

impl<R: Resource> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn RowStore>, cache: Arc<ViewCache>) -> Self {
        Self {
            store,
            cache,
            _phantom: PhantomData,
        }
    }

    fn scope(user_id: Uuid) -> Scope {
        R::TABLE.scope_for(user_id)
    }

    fn key(user_id: Uuid) -> ViewKey {
        ViewKey::new(R::TABLE.name, Self::scope(user_id))
    }

    fn decode(row: RawRow) -> Result<R::Row, DatabaseError> {
        Ok(serde_json::from_value(serde_json::Value::Object(row))?)
    }

    fn not_found(id: i64) -> DatabaseError {
        DatabaseError::NotFound(format!("{} {} not found", R::SINGULAR, id))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<R::Row>, DatabaseError> {
        let key = Self::key(user_id);

        let raw = match self.cache.lookup(&key).await {
            Lookup::Hit(rows) => rows,
            Lookup::Miss { generation } => {
                let rows = self.store.select_all(&R::TABLE, key.scope).await?;
                self.cache.store(key, generation, rows.clone()).await;
                rows
            }
        };

        raw.into_iter().map(Self::decode).collect()
    }

    pub async fn create(&self, user_id: Uuid, fields: &R::Fields) -> Result<R::Row, DatabaseError> {
        let key = Self::key(user_id);
        let row = self.store.insert(&R::TABLE, key.scope, &R::values(fields)).await?;
        self.cache.invalidate(key).await;

        tracing::debug!(table = R::TABLE.name, "Created row");
        Self::decode(row)
    }

    pub async fn update(&self, user_id: Uuid, id: i64, fields: &R::Fields) -> Result<R::Row, DatabaseError> {
        let key = Self::key(user_id);
        let row = self
            .store
            .update(&R::TABLE, key.scope, id, &R::values(fields))
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        self.cache.invalidate(key).await;

        Self::decode(row)
    }

    pub async fn delete(&self, user_id: Uuid, id: i64) -> Result<(), DatabaseError> {
        let key = Self::key(user_id);
        if !self.store.delete(&R::TABLE, key.scope, id).await? {
            return Err(Self::not_found(id));
        }
        self.cache.invalidate(key).await;
        Ok(())
    }
}
