pub mod cache;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod table;

pub use cache::{Invalidation, ViewCache, ViewKey};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;
pub use store::{RawRow, RowStore};
pub use table::{ListOrder, Scope, TableSpec};
