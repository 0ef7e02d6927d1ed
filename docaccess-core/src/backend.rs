//! Storage backend abstraction for document access.
//!
//! The [`StoreBackend`] trait is the seam between the accessor API and a
//! concrete store. Each method is a single round trip against one
//! collection, named by the [`Namespace`] passed in. Implementations must be
//! safe to share between tasks; one long-lived handle is created at startup
//! and reused for every call.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::AccessResult,
    query::{FieldLookup, FindOptions, Namespace, WriteSummary},
    value::{DataMap, Value},
};

/// Abstract interface for document storage backends.
///
/// # Error Handling
///
/// Backends report store failures as
/// [`AccessError::Backend`](crate::error::AccessError::Backend) with the
/// store's own message. Not-found is never an error at this level: single
/// reads return `None` and writes report zero matches in their
/// [`WriteSummary`].
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts one document and returns its `_id`.
    ///
    /// If the document carries no `_id`, one is assigned.
    async fn insert_one(&self, namespace: &Namespace, document: DataMap) -> AccessResult<Value>;

    /// Merges `set` into the first document matching `filter`.
    ///
    /// Fields not named in `set` are preserved.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        set: DataMap,
    ) -> AccessResult<WriteSummary>;

    /// Permanently removes the first document matching `filter`.
    async fn delete_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<WriteSummary>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<Option<DataMap>>;

    /// Returns all documents matching `filter`, sorted and limited per `options`.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        options: FindOptions,
    ) -> AccessResult<Vec<DataMap>>;

    /// Counts the documents matching `filter`.
    ///
    /// Backends with a server-side time budget return
    /// [`AccessError::Timeout`](crate::error::AccessError::Timeout) when it elapses.
    async fn count(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<u64>;

    /// Reads one field from the best-ranked match of `lookup.filter`.
    ///
    /// Ranking is by text relevance when the filter is a text search and
    /// store order otherwise. Returns `None` when nothing matches or the
    /// field is absent.
    async fn field_value(&self, namespace: &Namespace, lookup: &FieldLookup) -> AccessResult<Option<Value>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> AccessResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

// Borrowed and shared handles use the backend they point at. Their shutdown
// is a no-op; the owner shuts the backend down.
#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_one(&self, namespace: &Namespace, document: DataMap) -> AccessResult<Value> {
        (**self).insert_one(namespace, document).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        set: DataMap,
    ) -> AccessResult<WriteSummary> {
        (**self).update_one(namespace, filter, set).await
    }

    async fn delete_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<WriteSummary> {
        (**self).delete_one(namespace, filter).await
    }

    async fn find_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<Option<DataMap>> {
        (**self).find_one(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        options: FindOptions,
    ) -> AccessResult<Vec<DataMap>> {
        (**self).find(namespace, filter, options).await
    }

    async fn count(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<u64> {
        (**self).count(namespace, filter).await
    }

    async fn field_value(&self, namespace: &Namespace, lookup: &FieldLookup) -> AccessResult<Option<Value>> {
        (**self).field_value(namespace, lookup).await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn insert_one(&self, namespace: &Namespace, document: DataMap) -> AccessResult<Value> {
        (**self).insert_one(namespace, document).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        set: DataMap,
    ) -> AccessResult<WriteSummary> {
        (**self).update_one(namespace, filter, set).await
    }

    async fn delete_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<WriteSummary> {
        (**self).delete_one(namespace, filter).await
    }

    async fn find_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<Option<DataMap>> {
        (**self).find_one(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        options: FindOptions,
    ) -> AccessResult<Vec<DataMap>> {
        (**self).find(namespace, filter, options).await
    }

    async fn count(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<u64> {
        (**self).count(namespace, filter).await
    }

    async fn field_value(&self, namespace: &Namespace, lookup: &FieldLookup) -> AccessResult<Option<Value>> {
        (**self).field_value(namespace, lookup).await
    }
}

/// Factory trait for constructing storage backends.
#[async_trait]
pub trait StoreBackendBuilder: Send {
    type Backend: StoreBackend;

    /// Builds and returns a ready-to-use backend.
    async fn build(self) -> AccessResult<Self::Backend>;
}
