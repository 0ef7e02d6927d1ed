//! In-memory document storage backend for docaccess.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and testing code written against the accessor API without a running database.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Store-shaped filters** - Equality, comparison, membership and logical operators
//! - **Sorting and limits** - Multi-key sorts using the store's cross-type ordering
//! - **Seeding** - Pre-populate collections from the builder
//!
//! # Quick Start
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.collection("app", "users");
//!
//!     users.insert_one(datamap! { "name" => "Alice" }).await?;
//!     assert!(users.exists(&datamap! { "name" => "Alice" }).await);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docaccess_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
