//! Main document store interface.
//!
//! A [`DocumentStore`] owns the long-lived backend handle. Callers create it
//! once at startup, share it by reference or `Arc`, and address a collection
//! per call with [`DocumentStore::collection`].
//!
//! # Example
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let id = store.collection("app", "users").insert_one(datamap! { "name" => "Ann" }).await?;
//! ```

use crate::{backend::StoreBackend, collection::Collection, error::AccessResult, query::Namespace};

/// A document store bound to a specific backend implementation.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Addresses a collection in a database.
    ///
    /// Nothing is contacted until an operation is issued on the result.
    pub fn collection<'a>(&'a self, database: &str, collection: &str) -> Collection<'a, B> {
        Collection::new(Namespace::new(database, collection), &self.backend)
    }

    /// Shuts down the store and its backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown operation fails.
    pub async fn shutdown(self) -> AccessResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
