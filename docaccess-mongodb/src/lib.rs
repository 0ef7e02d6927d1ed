//! MongoDB backend implementation for docaccess.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait
//! on top of the official async driver. Each accessor call maps to exactly one
//! driver call; pooling, retries and server selection stay with the driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docaccess = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! [`MongoDbStoreBuilder::build`](docaccess_core::backend::StoreBackendBuilder::build)
//! parses the connection string, bounds connection and server selection by
//! the connect timeout (20 seconds by default) and pings the server before
//! returning.
//!
//! # Example
//!
//! ```ignore
//! use docaccess::{backend::StoreBackendBuilder, mongodb::MongoDbStore, store::DocumentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(
//!         MongoDbStore::builder("mongodb://localhost:27017")
//!             .build()
//!             .await?,
//!     );
//!
//!     let count = store.collection("app", "users").count_rows(&Default::default()).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docaccess_mongodb;

pub mod store;
mod error;
mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
