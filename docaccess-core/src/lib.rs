//! A thin document access layer with one function per CRUD operation.
//!
//! This crate is the core of the docaccess project and provides:
//!
//! - **Value model** ([`value`]) - Loosely typed field maps used as documents, filters and payloads
//! - **Object identifiers** ([`object_id`]) - Parsing and cleanup of hex identifiers
//! - **Addressing and options** ([`query`]) - Namespaces, sort keys, limits and write summaries
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Collection helpers** ([`collection`]) - Insert, update, delete, find, count and field lookups
//! - **Document store** ([`store`]) - The long-lived handle every operation goes through
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let users = store.collection("app", "users");
//!
//! users.insert_one(datamap! { "name" => "Ann" }).await?;
//! let ann = users.find_one(&datamap! { "name" => "Ann" }).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docaccess_core;

pub mod backend;
pub mod collection;
pub mod error;
pub mod object_id;
pub mod query;
pub mod store;
pub mod value;
