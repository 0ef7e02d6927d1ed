//! Main docaccess crate providing one function per document-store operation.
//!
//! This crate is the primary entry point for users of docaccess. It re-exports
//! the core types from the sub-crates and gives access to the storage backends.
//!
//! # Features
//!
//! - **Function-per-operation CRUD** - insert, update, delete, find, count, existence and field lookups
//! - **Explicit addressing** - every call names its database and collection
//! - **Loosely typed documents** - [`value::DataMap`] of tagged [`value::Value`]s, convertible to BSON and JSON
//! - **Multiple backends** - in-memory for tests and MongoDB for production
//!
//! # Quick Start
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> AccessResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.collection("app", "users");
//!
//!     let id = users.insert_one(datamap! { "name" => "Ann" }).await?;
//!     let hex = id.as_object_id().map(|id| id.to_hex()).unwrap_or_default();
//!
//!     users.update_one_by_id(datamap! { "role" => "admin" }, &hex).await?;
//!     assert_eq!(users.get_field_value_by_id(&hex, "role").await?, "admin");
//!
//!     users.delete_one_by_id(&hex).await?;
//!     assert!(users.find_one_by_id(&hex).await.unwrap_err().is_not_found());
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Not-found handling
//!
//! Single-document reads return [`AccessError::NotFound`](error::AccessError::NotFound).
//! Updates and deletes that match nothing succeed, `exists` folds every failure into
//! `false`, and field lookups return an empty string. See [`collection`].
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docaccess_core::{backend, collection, datamap, error, object_id, query, store, value};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docaccess_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docaccess_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}

/// Connects to MongoDB with default options and wraps the client in a store.
///
/// The connection is validated within 20 seconds; there is no retry.
///
/// # Errors
///
/// Returns [`AccessError::Connection`](error::AccessError::Connection) for a
/// malformed connection string or an unreachable server.
#[cfg(feature = "mongodb")]
pub async fn init(dsn: &str) -> error::AccessResult<store::DocumentStore<mongodb::MongoDbStore>> {
    use backend::StoreBackendBuilder;

    Ok(store::DocumentStore::new(
        mongodb::MongoDbStore::builder(dsn)
            .build()
            .await?,
    ))
}
