//! Infrastructure layer: inventory storage backends, configuration, seed data.

pub mod config;
pub mod inventory_store;
pub mod seed;

pub use config::StoreConfig;
pub use inventory_store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
pub use seed::{SeedMode, SeedReport};
