//! Inventory store boundary.
//!
//! The store owns lessons and orders. This module defines the storage-facing
//! abstraction plus the two backends, and picks one from configuration.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

use std::sync::Arc;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{InventoryStore, StoreError};

use crate::config::StoreConfig;

/// Open the backend selected by `config`.
///
/// A configured `database_url` selects Postgres (schema is created if
/// missing); otherwise an empty in-memory store is returned.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn InventoryStore>, StoreError> {
    match &config.database_url {
        Some(_) => {
            let store = PostgresInventoryStore::connect(config).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres inventory store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory inventory store");
            Ok(Arc::new(InMemoryInventoryStore::with_lock_timeout(
                config.lock_timeout,
            )))
        }
    }
}
